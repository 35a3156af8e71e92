use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::story_dto::*},
    error::AppError,
};

pub async fn start_story(
    State(state): State<AppState>,
    Path(character_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Starting story for character: {}", character_id);

    let (session_id, story) = state.session_service.start(&character_id).await?;

    Ok(Json(StartStoryResponse { session_id, story }))
}

pub async fn make_choice(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Applying choice to session: {}", session_id);

    let story = state
        .session_service
        .apply_choice(&session_id, &request.choice_text)
        .await?;

    Ok(Json(story))
}

pub async fn story_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting history for session: {}", session_id);

    let history = state.session_service.get_history(&session_id).await?;

    Ok(Json(history))
}
