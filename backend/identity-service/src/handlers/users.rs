/// Account HTTP handlers
use actix_web::{web, HttpResponse};
use actix_middleware::AuthenticatedUser;
use serde::Serialize;
use serde_json::json;

use crate::{
    error::IdentityError,
    models::{LoginRequest, RegisterRequest, UpdateUserRequest, UserResponse},
    services::IdentityService,
};

/// Acknowledgement body for writes
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// POST /api/v1/login
pub async fn login(
    service: web::Data<IdentityService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, IdentityError> {
    let LoginRequest { username, password } = payload.into_inner();
    let response = service.login(&username, &password).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/register
pub async fn register(
    service: web::Data<IdentityService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, IdentityError> {
    service.create_user(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(MessageResponse {
        message: "user created",
    }))
}

/// GET /api/v1/users
///
/// Trusted callers only: the listing includes password hashes.
pub async fn list_users(
    service: web::Data<IdentityService>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, IdentityError> {
    let users = service.get_users().await?;
    tracing::debug!(caller = %caller.user_id, count = users.len(), "listing users");

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    service: web::Data<IdentityService>,
    path: web::Path<String>,
) -> Result<HttpResponse, IdentityError> {
    let user = service.get_user_by_id(&path).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PUT /api/v1/users/{id}
pub async fn update_user(
    service: web::Data<IdentityService>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, IdentityError> {
    tracing::info!(caller = %caller.user_id, target = %path.as_str(), "update requested");
    service.update_user(&path, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "user updated",
    }))
}

/// DELETE /api/v1/users/{id}
pub async fn delete_user(
    service: web::Data<IdentityService>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, IdentityError> {
    tracing::info!(caller = %caller.user_id, target = %path.as_str(), "delete requested");
    service.delete_user(&path).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "user deleted",
    }))
}
