//! Request logging middleware
//!
//! One completion line per request with method, path, status, duration and,
//! when the bearer guard admitted the request, the caller's user id. Headers
//! and bodies are never logged, so tokens and passwords stay out of the logs.
//!
//! Level follows the outcome: server errors at `error`, client errors at
//! `warn`, everything else at `info`. Quiet paths (health probes) drop to
//! `debug` unless they fail with a server error.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

use crate::jwt_auth::AuthenticatedUser;

/// Middleware that logs one line per completed request
#[derive(Clone, Default)]
pub struct RequestLogging {
    quiet_paths: Rc<Vec<String>>,
}

impl RequestLogging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log successful requests to `path` at debug level
    pub fn quiet_path(mut self, path: impl Into<String>) -> Self {
        Rc::make_mut(&mut self.quiet_paths).push(path.into());
        self
    }

    fn is_quiet(&self, path: &str) -> bool {
        self.quiet_paths.iter().any(|p| p == path)
    }
}

/// Coarse class of a response status, used to pick the log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ClientError,
    ServerError,
}

impl Outcome {
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_server_error() {
            Outcome::ServerError
        } else if status.is_client_error() {
            Outcome::ClientError
        } else {
            Outcome::Success
        }
    }
}

struct Completion<'a> {
    method: &'a str,
    path: &'a str,
    status: StatusCode,
    caller: Option<&'a str>,
    duration_ms: u64,
    quiet: bool,
}

impl Completion<'_> {
    fn emit(&self) {
        let status = self.status.as_u16();
        let caller = self.caller.unwrap_or("-");
        match (Outcome::from_status(self.status), self.quiet) {
            (Outcome::ServerError, _) => tracing::error!(
                method = self.method, path = self.path, status, caller,
                duration_ms = self.duration_ms, "HTTP request failed"
            ),
            (Outcome::ClientError, false) => tracing::warn!(
                method = self.method, path = self.path, status, caller,
                duration_ms = self.duration_ms, "HTTP request rejected"
            ),
            (Outcome::Success, false) => tracing::info!(
                method = self.method, path = self.path, status, caller,
                duration_ms = self.duration_ms, "HTTP request completed"
            ),
            (_, true) => tracing::debug!(
                method = self.method, path = self.path, status,
                duration_ms = self.duration_ms, "HTTP request completed"
            ),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingService {
            service,
            config: self.clone(),
        }))
    }
}

pub struct RequestLoggingService<S> {
    service: S,
    config: RequestLogging,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let quiet = self.config.is_quiet(&path);

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(res) => {
                    // Present only when the bearer guard ran and admitted the request
                    let caller = res
                        .request()
                        .extensions()
                        .get::<AuthenticatedUser>()
                        .map(|user| user.user_id.clone());
                    Completion {
                        method: &method,
                        path: &path,
                        status: res.status(),
                        caller: caller.as_deref(),
                        duration_ms,
                        quiet,
                    }
                    .emit();
                }
                Err(err) => Completion {
                    method: &method,
                    path: &path,
                    status: err.as_response_error().status_code(),
                    caller: None,
                    duration_ms,
                    quiet,
                }
                .emit(),
            }

            result
        })
    }
}
