use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use actix_middleware::{HttpMetrics, RequestTrace, SessionAuth};
use social_service::handlers::register_routes;
use social_service::services::SessionService;
use social_service::{AppState, Config};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default();
    for origin in allowed_origins.split(',') {
        let origin = origin.trim();
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }

    cors.allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.app.json_logs);

    info!(
        env = %config.app.env,
        port = config.app.port,
        "Starting social-service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_config = db_pool::DbConfig::from_env("social-service", config.database.url.clone());
    db_config.log_config();
    let pool = db_pool::create_pool(db_config)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let sessions = SessionService::new(pool.clone());
    let purge = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Expired sessions purged"),
                Err(e) => error!(error = %e, "Session purge failed"),
            }
        }
    });

    let http_addr = format!("{}:{}", config.app.host, config.app.port);
    let allowed_origins = config.cors.allowed_origins.clone();
    let state = AppState::new(pool.clone(), config);
    let session_auth = SessionAuth::new(Arc::new(sessions), state.cookies.clone());

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(session_auth.clone())
            .wrap(HttpMetrics)
            .wrap(RequestTrace)
            .wrap(build_cors(&allowed_origins))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(register_routes)
    })
    .bind(&http_addr)
    .with_context(|| format!("Failed to bind HTTP server to {}", http_addr))?
    .disable_signals()
    .run();

    info!("HTTP server listening on http://{}", http_addr);

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        handle.stop(true).await;
    });

    server.await.context("HTTP server error")?;
    pool.close().await;
    info!("social-service stopped");
    Ok(())
}
