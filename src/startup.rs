use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{error, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::MetricsMiddleware;
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login,
    metrics, polka_webhook, refresh, reset, revoke, update_user,
};
use crate::state::AppState;

fn malformed_body(err: impl std::fmt::Display) -> error::Error {
    AppError::from(ValidationError::MalformedBody(err.to_string())).into()
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    static_dir: String,
) -> Result<Server, std::io::Error> {
    let hits = state.hits.clone();
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _| malformed_body(err)))
            .app_data(web::QueryConfig::default().error_handler(|err, _| malformed_body(err)))

            .route("/api/healthz", web::get().to(health_check))

            // Admin
            .route("/admin/metrics", web::get().to(metrics))
            .route("/admin/reset", web::post().to(reset))

            // Accounts and tokens
            .route("/api/users", web::post().to(create_user))
            .route("/api/users", web::put().to(update_user))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))

            // Chirps
            .route("/api/chirps", web::post().to(create_chirp))
            .route("/api/chirps", web::get().to(list_chirps))
            .route("/api/chirps/{id}", web::get().to(get_chirp))
            .route("/api/chirps/{id}", web::delete().to(delete_chirp))

            .route("/api/polka/webhooks", web::post().to(polka_webhook))

            // Static files, counted
            .service(
                web::scope("/app")
                    .wrap(MetricsMiddleware::new(hits.clone()))
                    .service(fs::Files::new("", &static_dir).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
