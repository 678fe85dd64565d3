use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::models::{AvatarFile, ValidationReport},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_avatar))
}

#[instrument(name = "POST /avatars/validate", skip(app_state, file), fields(mime = %file.mime, size = file.size))]
async fn validate_avatar(
    State(app_state): State<AppState>,
    Json(file): Json<AvatarFile>,
) -> Json<ValidationReport> {
    Json(app_state.avatar_service.validate(&file))
}
