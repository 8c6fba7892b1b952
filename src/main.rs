use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use moka::future::Cache;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use property_chat_api::api::{api_routes, handlers};
use property_chat_api::config::Config;
use property_chat_api::data::db::Database;
use property_chat_api::integrations::{llm_client::LlmClient, notifier::LeadNotifier};

/// Serves the OpenAPI specification YAML file.
///
/// Returns 404 when `openapi.yml` is not present in the working directory.
async fn serve_openapi_spec() -> impl IntoResponse {
    match tokio::fs::read_to_string("openapi.yml").await {
        Ok(content) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/yaml")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "OpenAPI spec not found").into_response(),
    }
}

/// Serves the Swagger UI HTML page pointed at `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Property Chat API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the database pool, the LLM and
/// notification clients and the property cache, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "property_chat_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let llm = LlmClient::new(
        config.llm_base_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    )?;
    tracing::info!("LLM client initialized (model {})", llm.model());

    let notifier = match config.lead_notification_url.clone() {
        Some(url) => match LeadNotifier::new(url) {
            Ok(notifier) => Some(notifier),
            Err(e) => {
                tracing::error!("Failed to initialize lead notifier: {}", e);
                None
            }
        },
        None => None,
    };

    // Property context changes rarely; 5 minute TTL keeps chat turns off the DB
    let property_cache = Cache::builder()
        .time_to_live(Duration::from_secs(300))
        .max_capacity(1_000)
        .build();
    tracing::info!("Property cache initialized");

    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        llm,
        notifier,
        property_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = api_routes()
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(serve_openapi_spec))
        .layer(
            ServiceBuilder::new()
                // Chat payloads are small; 1MB is plenty
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
