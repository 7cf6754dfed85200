use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, HttpMessage, HttpResponse,
};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

/// Identity extracted from a validated bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub name: String,
    pub role: String,
}

impl From<crypto_core::Claims> for AuthenticatedUser {
    fn from(claims: crypto_core::Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// JWT Authentication Middleware
///
/// Rejects the request with 401 before it reaches the wrapped service when the
/// `Authorization: Bearer` header is absent or the token does not validate.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    signing_key: Arc<Vec<u8>>,
}

impl JwtAuthMiddleware {
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            signing_key: Arc::new(signing_key.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            signing_key: self.signing_key.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    signing_key: Arc<Vec<u8>>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let signing_key = self.signing_key.clone();

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    tracing::warn!(path = %req.path(), "missing bearer token");
                    unauthenticated()
                })?;

            let claims = crypto_core::validate_token(token, &signing_key).map_err(|_| {
                tracing::warn!(path = %req.path(), "bearer token rejected");
                unauthenticated()
            })?;

            req.extensions_mut().insert(AuthenticatedUser::from(claims));

            service.call(req).await
        })
    }
}

/// Same response for every failure cause
fn unauthenticated() -> Error {
    let body = serde_json::json!({
        "error": "Unauthenticated",
        "status": 401,
    });
    InternalError::from_response("Unauthenticated", HttpResponse::Unauthorized().json(body)).into()
}

/// FromRequest implementation for AuthenticatedUser
impl actix_web::FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(unauthenticated())),
        }
    }
}
