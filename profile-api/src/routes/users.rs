use std::str::FromStr;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::{
        models::{AvatarFile, AvatarUploadResult, ProfileSection, SectionData, UserId},
        AvatarError,
    },
    routes::ApiError,
};

// Room for multipart framing on top of the largest accepted avatar, so an
// image just over the limit still gets a validation error instead of a 413.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn router(max_avatar_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_avatar_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/:user_id/avatar",
            get(get_avatar_url).post(upload_avatar).delete(delete_avatar),
        )
        .route_layer(DefaultBodyLimit::max(body_limit))
        .route("/:user_id/profile/cache", delete(invalidate_profile_cache))
        .route(
            "/:user_id/profile/:section",
            get(get_profile_section).put(update_profile_section),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AvatarUrlResponse {
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct InvalidateQuery {
    section: Option<String>,
}

fn parse_section(section: &str) -> Result<ProfileSection, ApiError> {
    ProfileSection::from_str(section)
        .map_err(|_| ApiError::not_found(format!("unknown profile section '{section}'")))
}

#[instrument(name = "GET /users/:user_id/avatar", skip(app_state))]
async fn get_avatar_url(
    State(app_state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Json<AvatarUrlResponse> {
    let avatar_url = app_state.avatar_service.get_avatar_url(&user_id).await;
    Json(AvatarUrlResponse { avatar_url })
}

/// Pull the `avatar` file part out of the form. The part's own size, file
/// name and content type stand in for what a picker would report.
async fn extract_avatar_from_multipart(
    multipart: &mut Multipart,
) -> Result<(AvatarFile, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::new(err.status(), "failed to parse multipart field"))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let mime = field
            .content_type()
            .map(str::to_string)
            .or_else(|| {
                file_name
                    .as_deref()
                    .and_then(|name| mime_guess::from_path(name).first())
                    .map(|mime| mime.essence_str().to_string())
            })
            .unwrap_or_default();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::new(err.status(), "failed to read avatar payload"))?;

        let mut file = AvatarFile::new("", bytes.len() as u64, mime);
        if let Some(file_name) = file_name {
            file = file.with_file_name(file_name);
        }
        return Ok((file, bytes));
    }

    Err(ApiError::bad_request("missing avatar file field"))
}

#[instrument(name = "POST /users/:user_id/avatar", skip(app_state, multipart))]
async fn upload_avatar(
    State(app_state): State<AppState>,
    Path(user_id): Path<UserId>,
    mut multipart: Multipart,
) -> (StatusCode, Json<AvatarUploadResult>) {
    let (file, body) = match extract_avatar_from_multipart(&mut multipart).await {
        Ok(upload) => upload,
        Err(err) => {
            return (
                err.status(),
                Json(AvatarUploadResult::failed(err.message())),
            )
        }
    };

    let outcome = app_state
        .avatar_service
        .try_upload_avatar_bytes(&user_id, &file, body, None)
        .await;

    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(AvatarError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Err(AvatarError::Source(_)) => StatusCode::BAD_REQUEST,
        Err(AvatarError::Storage(_) | AvatarError::Persistence(_)) => StatusCode::BAD_GATEWAY,
    };

    (status, Json(outcome.into()))
}

#[instrument(name = "DELETE /users/:user_id/avatar", skip(app_state))]
async fn delete_avatar(
    State(app_state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    app_state.avatar_service.delete_avatar(&user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "GET /users/:user_id/profile/:section", skip(app_state))]
async fn get_profile_section(
    State(app_state): State<AppState>,
    Path((user_id, section)): Path<(UserId, String)>,
) -> Result<Json<SectionData>, ApiError> {
    let section = parse_section(&section)?;
    let data = app_state
        .profile_service
        .get_section(&user_id, section)
        .await?;

    Ok(Json(data))
}

#[instrument(name = "PUT /users/:user_id/profile/:section", skip(app_state, data))]
async fn update_profile_section(
    State(app_state): State<AppState>,
    Path((user_id, section)): Path<(UserId, String)>,
    Json(data): Json<SectionData>,
) -> Result<Json<SectionData>, ApiError> {
    let section = parse_section(&section)?;
    if data.section() != section {
        return Err(ApiError::unprocessable(format!(
            "body holds {} data but the path names {section}",
            data.section()
        )));
    }

    let saved = app_state
        .profile_service
        .update_section(&user_id, data)
        .await?;

    Ok(Json(saved))
}

#[instrument(name = "DELETE /users/:user_id/profile/cache", skip(app_state))]
async fn invalidate_profile_cache(
    State(app_state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<InvalidateQuery>,
) -> Result<StatusCode, ApiError> {
    let section = query.section.as_deref().map(parse_section).transpose()?;
    app_state.profile_service.invalidate(&user_id, section);

    Ok(StatusCode::NO_CONTENT)
}
