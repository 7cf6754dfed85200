/// Identity Service Main Entry Point
///
/// Starts the HTTP server with:
/// - PostgreSQL connection pool (or in-memory store)
/// - Bearer token guard on account routes
/// - CORS and request logging
use actix_cors::Cors;
use actix_middleware::RequestLogging;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::{Context, Result};
use identity_service::{
    config::{DatabaseSettings, Settings, StoreBackend},
    db::{AccountStore, InMemoryAccountStore, PgAccountStore},
    routes,
    services::IdentityService,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "identity_service=info,actix_middleware=info,info";

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration (reads .env) before tracing so APP_ENV picks the format
    let settings = Settings::load().context("Failed to load configuration")?;
    init_tracing(!settings.is_development());

    info!(app_env = %settings.app_env, "Starting Identity Service");

    let store = build_store(&settings).await?;
    let service = IdentityService::new(store, settings.jwt.signing_key.as_bytes())
        .with_store_timeout(settings.store.call_timeout());

    let signing_key = service.signing_key().to_vec();
    let allowed_origins = settings.cors.allowed_origins.clone();
    let service_data = web::Data::new(service);

    let bind_addr = (settings.server.host.clone(), settings.server.port);
    info!(
        host = %settings.server.host,
        port = settings.server.port,
        "Identity Service HTTP server listening"
    );

    let mut server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        let signing_key = signing_key.clone();
        App::new()
            .app_data(service_data.clone())
            .wrap(cors)
            .wrap(RequestLogging::new().quiet_path("/health"))
            .configure(move |cfg| routes::configure(cfg, &signing_key))
    })
    .client_request_timeout(Duration::from_secs(settings.server.client_request_timeout))
    .keep_alive(Duration::from_secs(settings.server.keep_alive))
    .shutdown_timeout(settings.server.shutdown_timeout);

    if let Some(workers) = settings.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(bind_addr)
        .context("Failed to bind HTTP server")?
        .run()
        .await
        .context("HTTP server error")?;

    info!("Identity Service shut down gracefully");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn AccountStore>> {
    match (settings.store.backend, &settings.database) {
        (StoreBackend::Postgres, Some(database)) => {
            let pool = connect_database(database).await?;
            Ok(Arc::new(PgAccountStore::new(pool)))
        }
        (StoreBackend::Postgres, None) => {
            anyhow::bail!("postgres store selected without database settings")
        }
        (StoreBackend::Memory, _) => {
            warn!("Using in-memory account store; data is lost on restart");
            Ok(Arc::new(InMemoryAccountStore::new()))
        }
    }
}

async fn connect_database(database: &DatabaseSettings) -> Result<sqlx::PgPool> {
    let db_pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .acquire_timeout(Duration::from_secs(database.acquire_timeout))
        .connect(&database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(
        "Database pool initialized with {} max connections",
        database.max_connections
    );

    // Run database migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    Ok(db_pool)
}
