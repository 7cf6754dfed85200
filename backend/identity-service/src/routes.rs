/// Route definitions and middleware setup
use actix_middleware::JwtAuthMiddleware;
use actix_web::{error::InternalError, web, HttpResponse};
use serde_json::json;

use crate::handlers;

/// Register every route on `cfg`. `/api/v1/users` is guarded by the bearer
/// token middleware using `signing_key`.
pub fn configure(cfg: &mut web::ServiceConfig, signing_key: &[u8]) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api/v1")
                .route("/login", web::post().to(handlers::login))
                .route("/register", web::post().to(handlers::register))
                .service(
                    web::scope("/users")
                        .wrap(JwtAuthMiddleware::new(signing_key.to_vec()))
                        .route("", web::get().to(handlers::list_users))
                        .route("/{id}", web::get().to(handlers::get_user))
                        .route("/{id}", web::put().to(handlers::update_user))
                        .route("/{id}", web::delete().to(handlers::delete_user)),
                ),
        );
}

/// Malformed or mistyped JSON bodies become a 400 with the standard error body
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "rejected request body");
        let response = HttpResponse::BadRequest().json(json!({
            "error": "invalid request body",
            "status": 400
        }));
        InternalError::from_response(err, response).into()
    })
}
