/// Middleware module
///
/// Hit counting for the static file server.

mod metrics;

pub use metrics::{HitCounter, MetricsMiddleware};
