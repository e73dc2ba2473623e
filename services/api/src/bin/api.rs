//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{InMemoryAuthAdapter, OpenAiChatAdapter},
    ai_context::AiContext,
    config::Config,
    error::ApiError,
    web::{api_router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::Router;
use selah_core::ports::{AiChatService, PortError};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| ApiError::Logging(e.to_string()))?;
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the AI Capability ---
    // Without it the service still runs; every verse comes from the fallback table.
    let ai = Arc::new(AiContext::new());
    {
        let config = config.clone();
        ai.initialize(move || async move {
            let api_key = config.openai_api_key.as_ref().ok_or_else(|| {
                PortError::Unexpected("OPENAI_API_KEY is not set".to_string())
            })?;
            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(api_base) = &config.openai_api_base {
                openai_config = openai_config.with_api_base(api_base);
            }
            let adapter = OpenAiChatAdapter::new(
                Client::with_config(openai_config),
                config.chat_model.clone(),
                config.chat_temperature,
            );
            info!("Using chat model {}", config.chat_model);
            Ok(Arc::new(adapter) as Arc<dyn AiChatService>)
        })
        .await;
    }

    // --- 3. Build the Shared AppState ---
    let auth = Arc::new(InMemoryAuthAdapter::new(chrono::Duration::days(
        config.session_ttl_days,
    )));
    let app_state = Arc::new(AppState {
        config: config.clone(),
        auth,
        ai,
    });

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
