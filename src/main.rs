use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use readiness::config::{CompletionConfig, Config};
use readiness::services::analysis::{AnalysisServiceImpl, AnthropicClient, ErrorKind};
use readiness::{AppState, build_router, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(handlers::analyze::analyze),
    components(schemas(
        models::AnalysisRequest,
        models::AnalysisResult,
        models::ErrorResponse,
        ErrorKind,
    )),
    tags((name = "Analysis", description = "Requirements gap analysis and design checklist"))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; it only seeds variables that are not already set
    let dotenv_result = dotenvy::dotenv();

    let config = Config::load()?;

    // Initialize logging
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    // Keep the writer guard alive for the life of the process
    let _log_guard = if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path
            .parent()
            .and_then(|p| p.to_str())
            .filter(|p| !p.is_empty())
            .unwrap_or("logs");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("readiness.log");
        // Rolling appender adds its own date suffix
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .init();
        Some(guard)
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
        None
    };

    tracing::info!("Readiness starting up");
    if let Ok(path) = dotenv_result {
        tracing::info!("Loaded environment from {}", path.display());
    }
    tracing::info!("Configuration loaded successfully");

    let completion_config = Arc::new(CompletionConfig::from_settings(&config.completion));
    if completion_config.has_credential() {
        tracing::info!(
            "Completion service: {} (model {}, max_tokens {}, temperature {}, timeout {:?})",
            completion_config.api_base,
            completion_config.model,
            completion_config.max_tokens,
            completion_config.temperature,
            completion_config.timeout
        );
    } else {
        tracing::warn!(
            "{} is not set; every analysis request will fail with {}",
            config.completion.api_key_env,
            ErrorKind::MissingCredential
        );
    }

    let client = AnthropicClient::new(Arc::clone(&completion_config))?;
    let retry_policy = config.retry.policy();
    tracing::info!("Completion retry policy: {} attempt(s) max", retry_policy.max_attempts());

    let analysis_service =
        Arc::new(AnalysisServiceImpl::new(Arc::new(client)).with_retry_policy(retry_policy));

    let app_state = Arc::new(AppState {
        analysis_service,
        strict_status_codes: config.server.strict_status_codes,
    });

    let app = build_router(app_state)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API documentation available at http://{}/api-docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
