use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    routing::post,
};
use validator::Validate;

use crate::{
    dto::uploads::{DeleteImageRequest, UploadForm, UploadQuery, UploadResponse},
    error::{AppError, AppResult, ErrorBody},
    extract::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    response::MessageResponse,
    services::image_service::{self, MAX_UPLOAD_BYTES},
    state::AppState,
};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/image", post(upload_image).delete(delete_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

#[utoipa::path(
    post,
    path = "/api/upload/image",
    params(UploadQuery),
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Form field `image`, at most 5MB"),
    responses(
        (status = 200, description = "Public URL of the stored image", body = UploadResponse),
        (status = 400, description = "Missing file, bad type or too large", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Upload"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            break;
        }

        let url = image_service::upload_image(
            &state,
            bytes.to_vec(),
            &file_name,
            query.folder.as_deref(),
        )
        .await?;
        tracing::debug!(user_id = %user.user_id, url = %url, "image upload finished");
        return Ok(Json(UploadResponse { url }));
    }

    Err(AppError::BadRequest("No file uploaded".into()))
}

#[utoipa::path(
    delete,
    path = "/api/upload/image",
    request_body = DeleteImageRequest,
    responses(
        (status = 200, description = "Image removed if it existed", body = MessageResponse),
        (status = 400, description = "Validation failed", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Upload"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(payload): AppJson<DeleteImageRequest>,
) -> AppResult<Json<MessageResponse>> {
    payload.validate()?;
    image_service::delete_image(&state, &payload.url).await;
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}
