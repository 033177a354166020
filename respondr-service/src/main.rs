mod analyzers;
mod config;
mod directory;
mod routes;
mod utils;

use crate::analyzers::{LlmVideoAnalyzer, MockVideoAnalyzer, VideoAnalyzer};
use crate::config::ServiceConfig;
use crate::routes::AppState;
use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, Request, header::CONTENT_TYPE},
    middleware::{Next, from_fn},
    routing::{get, post},
};
use respondr_core::{InMemorySessionRepository, IncidentRunner};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Initialize tracing; `LOG_FORMAT=pretty` for development, JSON lines otherwise.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "respondr_service=debug,respondr_core=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Tags every request and its response with a fresh correlation id and runs the
/// handler inside an `http_request` span carrying it.
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = header.clone() {
        request.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

fn build_analyzer(config: &ServiceConfig) -> Arc<dyn VideoAnalyzer> {
    match &config.openrouter_api_key {
        Some(api_key) => {
            info!(model = %config.analyzer_model, "Using LLM video analyzer");
            Arc::new(LlmVideoAnalyzer::new(api_key.clone(), config.analyzer_model.clone()))
        }
        None => {
            info!("OPENROUTER_API_KEY not set, using mock video analyzer");
            Arc::new(MockVideoAnalyzer)
        }
    }
}

fn build_router(state: AppState) -> anyhow::Result<Router> {
    let origin = state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS_ORIGIN '{}'", state.config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(routes::health_check))
        .route("/analyze", post(routes::analyze))
        .route("/chat", post(routes::chat))
        .route("/session/{id}", get(routes::get_session))
        .layer(from_fn(correlation_id_middleware))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServiceConfig::from_env()?;
    let catalog = directory::load_catalog(config.catalog_path.as_deref())?;
    let analyzer = build_analyzer(&config);

    info!("Using in-memory session repository");
    let runner = IncidentRunner::new(
        Arc::new(InMemorySessionRepository::new()),
        Arc::new(catalog),
    );

    let bind_addr = config.bind_addr;
    let app = build_router(AppState {
        runner,
        analyzer,
        config: Arc::new(config),
    })?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Server running on http://{}", bind_addr);
    info!("Available endpoints:");
    info!("  GET  /health        - Health check");
    info!("  POST /analyze       - Analyze an accident upload and note");
    info!("  POST /chat          - Follow-up question on an analyzed session");
    info!("  GET  /session/{{id}}  - Session history");

    axum::serve(listener, app).await?;

    Ok(())
}
