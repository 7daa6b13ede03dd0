//! ThesisDesk Admin Gateway
//!
//! Entry point for the admin API.
//! Handles:
//! - Authorization (JWT + role permissions)
//! - Rate limiting
//! - Thesis routes
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

#[cfg(test)]
mod testing;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use thesisdesk_common::{
    auth::JwtManager,
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository, ThesisStore},
    errors::AppError,
    metrics,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::middleware::{permission, rate_limit};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ThesisStore>,
    pub jwt: Arc<JwtManager>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting ThesisDesk gateway v{}",
        thesisdesk_common::VERSION
    );

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    let jwt_secret = config.auth.jwt_secret.clone().ok_or_else(|| AppError::Configuration {
        message: "auth.jwt_secret must be set".to_string(),
    })?;

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.migrate().await?;
    }

    let state = AppState {
        config: config.clone(),
        store: Arc::new(Repository::new(db)),
        jwt: Arc::new(JwtManager::new(&jwt_secret, config.auth.jwt_expiration_secs)),
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Admin routes, each method behind its own permission
    let admin_routes = Router::new()
        .route(
            "/thesis/{id}",
            get(handlers::theses::get_thesis).route_layer(from_fn_with_state(
                state.clone(),
                permission::require_view_thesis,
            )),
        )
        .route(
            "/thesis/{id}",
            put(handlers::theses::update_thesis).route_layer(from_fn_with_state(
                state.clone(),
                permission::require_modify_thesis,
            )),
        );

    let mut app = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api/admin", admin_routes)
        .route_layer(from_fn(middleware::track_metrics));

    if state.config.rate_limit.enabled {
        let limiter = rate_limit::RateLimit::new(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        app = app.layer(from_fn_with_state(limiter, rate_limit::rate_limit_middleware));
    }

    app
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{self, MemoryStore, CAROL_ID, THESIS_ID};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use thesisdesk_common::{auth::Permission, config::AppConfig};

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let (app, _) = testing::app(Arc::new(MemoryStore::seeded()));

        let (status, body) = testing::send(app.clone(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = testing::send(app, "GET", "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"]["status"], "up");
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let store = Arc::new(MemoryStore::seeded());
        store.stall_reads();

        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        config.server.request_timeout_secs = 1;
        let (app, jwt) = testing::app_with_config(store, config);
        let token = testing::token(&jwt, CAROL_ID, &[Permission::ViewThesis]);

        let uri = format!("/api/admin/thesis/{}", THESIS_ID);
        let (status, _) = testing::send(app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }
}
