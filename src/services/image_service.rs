use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_FOLDER: &str = "images";
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Lowercased extension of `file_name` if it is an accepted image type.
pub fn image_extension(file_name: &str) -> AppResult<String> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            AppError::BadRequest("Invalid file type. Only images are allowed.".into())
        })?;
    Ok(extension)
}

pub fn content_type_for(extension: &str) -> String {
    match extension {
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

/// Relative folder made of `[A-Za-z0-9_-]` segments.
pub fn normalize_folder(folder: Option<&str>) -> AppResult<String> {
    let folder = folder.map(|f| f.trim().trim_matches('/')).unwrap_or("");
    if folder.is_empty() {
        return Ok(DEFAULT_FOLDER.to_string());
    }
    let valid = folder.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });
    if !valid {
        return Err(AppError::BadRequest("Invalid folder name".into()));
    }
    Ok(folder.to_string())
}

pub fn object_key(folder: &str, extension: &str) -> String {
    format!("{folder}/{}.{extension}", Uuid::new_v4())
}

pub async fn upload_image(
    state: &AppState,
    bytes: Vec<u8>,
    file_name: &str,
    folder: Option<&str>,
) -> AppResult<String> {
    let extension = image_extension(file_name)?;
    let folder = normalize_folder(folder)?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("File too large, the limit is 5MB".into()));
    }

    let key = object_key(&folder, &extension);
    let url = state
        .images
        .put(&key, bytes, &content_type_for(&extension))
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(key = %key, "image uploaded");
    Ok(url)
}

/// Best-effort: failures are logged and swallowed.
pub async fn delete_image(state: &AppState, url: &str) {
    let Some(key) = state.images.key_from_url(url) else {
        tracing::warn!(url = %url, "image url does not belong to the configured store");
        return;
    };
    if let Err(err) = state.images.delete(&key).await {
        tracing::warn!(error = %err, key = %key, "image delete failed");
    }
}

/// Deletes each image in turn; one failure does not stop the rest.
pub async fn delete_images(state: &AppState, urls: &[String]) {
    for url in urls.iter().filter(|u| !u.is_empty()) {
        delete_image(state, url).await;
    }
}
