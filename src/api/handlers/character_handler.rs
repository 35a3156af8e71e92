use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::character_dto::*},
    error::AppError,
};

pub const API_MESSAGE: &str = "D&D Unlimited Choices Game API";

pub async fn api_root() -> impl IntoResponse {
    Json(ApiInfoResponse {
        message: API_MESSAGE.to_string(),
    })
}

pub async fn character_options(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.character_service.options())
}

pub async fn create_character(
    State(state): State<AppState>,
    Json(request): Json<CreateCharacterRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!(race = %request.race, class = %request.character_class, "Creating character");

    let character = state.character_service.create(request.into()).await?;

    Ok((StatusCode::CREATED, Json(character)))
}

pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting character: {}", id);

    let character = state.character_service.get(&id).await?;

    Ok(Json(character))
}
