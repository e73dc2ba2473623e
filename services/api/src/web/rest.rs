//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    ai_context::AiStatusKind,
    web::{auth, state::AppState},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use selah_core::{
    domain::{DevotionalBundle, Mood, VersePayload},
    orchestrator::{PanelPhase, Trigger, VerseOrchestrator, VerseSource},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        landing_handler,
        list_moods_handler,
        generate_verse_handler,
        auth::auth_page_handler,
        auth::sign_in_handler,
        auth::sign_out_handler,
    ),
    components(
        schemas(
            LandingResponse,
            MoodOption,
            GenerateVerseRequest,
            GenerateVerseResponse,
            AiStatusKind,
            auth::AuthPageResponse,
            auth::AuthResponse,
        )
    ),
    tags(
        (name = "Selah API", description = "Mood-based Bible verses, reflections, stories and prayers.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LandingResponse {
    pub title: String,
    pub tagline: String,
    pub ai_status: AiStatusKind,
}

/// One card of the mood picker.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MoodOption {
    pub label: String,
    pub emoji: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateVerseRequest {
    /// Any label; unrecognized moods fall back to the default verse.
    pub mood: String,
    /// A verse to show instead of asking the AI: either verse fields or a JSON string with a `verses` array.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub verse: Option<VersePayload>,
    /// References already shown to this user, to be avoided.
    #[serde(default)]
    pub avoid_references: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateVerseResponse {
    #[schema(value_type = Object)]
    pub source: VerseSource,
    #[schema(value_type = String)]
    pub phase: PanelPhase,
    #[schema(value_type = Object)]
    pub bundle: DevotionalBundle,
    /// `avoid_references` plus anything this generation showed.
    pub used_references: Vec<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Landing page data.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service greeting and AI availability", body = LandingResponse))
)]
pub async fn landing_handler(State(app_state): State<Arc<AppState>>) -> Json<LandingResponse> {
    Json(LandingResponse {
        title: "Selah".to_string(),
        tagline: "Pause. Reflect. Find peace in God's Word — wherever you are, whatever you feel."
            .to_string(),
        ai_status: app_state.ai.kind().await,
    })
}

/// The moods offered by the mood picker.
#[utoipa::path(
    get,
    path = "/moods",
    responses((status = 200, description = "Mood picker options", body = [MoodOption]))
)]
pub async fn list_moods_handler() -> Json<Vec<MoodOption>> {
    let moods = Mood::ALL
        .iter()
        .map(|mood| MoodOption {
            label: mood.label().to_string(),
            emoji: mood.emoji().unwrap_or_default().to_string(),
        })
        .collect();
    Json(moods)
}

/// Generate one devotional for a mood.
///
/// Requires a signed-in session; unauthenticated callers are redirected to `/auth?next=/`.
#[utoipa::path(
    post,
    path = "/verses",
    request_body = GenerateVerseRequest,
    responses(
        (status = 200, description = "A devotional bundle", body = GenerateVerseResponse),
        (status = 303, description = "Not signed in; redirect to the sign-in page"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_verse_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<GenerateVerseRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mood = Mood::from(req.mood);
    info!(%mood, "Generating verse");

    let panel = VerseOrchestrator::new(mood, app_state.ai.handle().await)
        .with_used_references(req.avoid_references)
        .await;

    // A fresh panel has no competing attempt, so this only fails if generation
    // was discarded unexpectedly.
    let source = panel
        .generate(Trigger::PayloadChanged(req.verse))
        .await
        .ok_or_else(|| {
            error!("Verse generation was discarded");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate verse".to_string(),
            )
        })?;

    let view = panel.view().await;
    Ok(Json(GenerateVerseResponse {
        source,
        phase: view.phase,
        bundle: view.bundle,
        used_references: panel.used_references().await,
    }))
}
