use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::state::AppState;

/// GET /admin/metrics
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let page = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>
"#,
        state.hits.load()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

/// POST /admin/reset
///
/// Dev platform only; 403 everywhere else.
pub async fn reset(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.reset().await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0 and all users, chirps and tokens deleted"))
}
