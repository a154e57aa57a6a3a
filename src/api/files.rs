//! 已上传照片的访问

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::storage::is_flat_key;
use crate::util::ApiError;
use crate::AppState;

/// 按文件名返回照片内容
pub async fn uploaded_file(
    State(app_state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !is_flat_key(&filename) {
        warn!(target: "security", filename = %filename, "拒绝非法照片路径");
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let data = app_state
        .storage
        .get(&filename)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok((
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        data,
    )
        .into_response())
}
