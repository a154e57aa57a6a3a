//! 照片上传、分类与报告入库

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use chrono::Local;
use river_classifier::{Category, ClassifierError};
use tower_sessions::Session;
use tracing::{error, info, warn};

use super::utils::{
    allowed_file, file_extension, secure_filename, timestamped_filename, with_random_suffix,
};
use crate::model::{DetectResponse, NewReport, SessionUser};
use crate::util::html;
use crate::util::logging::events;
use crate::util::middleware::current_user;
use crate::util::ApiError;
use crate::AppState;

pub const MSG_MISSING_PHOTO: &str = "Please provide a river photo.";
pub const MSG_INVALID_TYPE: &str = "Invalid file type. Please upload a PNG or JPG image.";
pub const MSG_UNREADABLE_IMAGE: &str = "Could not read the uploaded image.";
pub const MSG_SAVE_PHOTO_FAILED: &str = "Failed to save photo.";
pub const MSG_SAVE_REPORT_FAILED: &str = "Failed to save report.";

/// 上传表单中解析出的内容
struct DetectForm {
    location: Option<String>,
    photo: Option<(String, Bytes)>,
}

/// 首页：未登录跳转登录页
pub async fn index(State(app_state): State<AppState>, session: Session) -> Response {
    match current_user(&session).await {
        Some(user) => Html(html::detect_page(
            &user,
            &app_state.config.upload.allowed_extensions,
        ))
        .into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    warn!(
        target: "api",
        event = events::DETECT_REJECTED,
        status = err.status().as_u16(),
        error = %err.body_text(),
        "解析上传表单失败"
    );
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Uploaded file is too large.".to_string())
    } else {
        ApiError::bad_request(MSG_MISSING_PHOTO)
    }
}

async fn read_form(mut multipart: Multipart) -> Result<DetectForm, ApiError> {
    let mut form = DetectForm {
        location: None,
        photo: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "location" => {
                form.location = Some(field.text().await.map_err(multipart_error)?);
            }
            "photo" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                form.photo = Some((filename, data));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// 在存储中挑选一个未被占用的文件名
async fn unique_filename(app_state: &AppState, original: &str, ext: &str) -> anyhow::Result<String> {
    let candidate = timestamped_filename(Local::now(), &secure_filename(original, ext));
    if !app_state.storage.exists(&candidate).await? {
        return Ok(candidate);
    }
    loop {
        let suffixed = with_random_suffix(&candidate);
        if !app_state.storage.exists(&suffixed).await? {
            return Ok(suffixed);
        }
    }
}

async fn classify(app_state: &AppState, data: Bytes) -> Result<Category, ApiError> {
    let classifier = app_state.classifier.clone();
    let result = tokio::task::spawn_blocking(move || classifier.classify(&data))
        .await
        .map_err(|e| {
            error!(target: "api", event = events::DETECT_ERROR, error = %e, "分类任务异常退出");
            ApiError::internal("Internal server error")
        })?;

    match result {
        Ok(prediction) => Ok(prediction.category),
        Err(ClassifierError::InvalidImage(reason)) => {
            warn!(
                target: "api",
                event = events::DETECT_REJECTED,
                reason = %reason,
                "图片无法解码"
            );
            Err(ApiError::bad_request(MSG_UNREADABLE_IMAGE))
        }
        Err(e) => {
            error!(target: "api", event = events::DETECT_ERROR, error = %e, "图片分类失败");
            Err(ApiError::internal("Internal server error"))
        }
    }
}

/// 上传照片并生成报告
pub async fn detect(
    State(app_state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let upload = &app_state.config.upload;

    let location = form
        .location
        .map(|loc| loc.trim().to_string())
        .filter(|loc| !loc.is_empty())
        .unwrap_or_else(|| upload.default_location.clone());

    let (original_name, data) = match form.photo {
        Some((name, data)) if !name.is_empty() => (name, data),
        _ => {
            warn!(
                target: "api",
                event = events::DETECT_REJECTED,
                user_id = user.user_id,
                reason = "missing_photo"
            );
            return Err(ApiError::bad_request(MSG_MISSING_PHOTO));
        }
    };

    if !allowed_file(&original_name, &upload.allowed_extensions) {
        warn!(
            target: "api",
            event = events::DETECT_REJECTED,
            user_id = user.user_id,
            filename = %original_name,
            reason = "extension_not_allowed"
        );
        return Err(ApiError::bad_request(MSG_INVALID_TYPE));
    }
    let ext = file_extension(&original_name).unwrap_or_default();

    info!(
        target: "api",
        event = events::DETECT_RECEIVED,
        user_id = user.user_id,
        filename = %original_name,
        size = data.len()
    );

    let category = classify(&app_state, data.clone()).await?;
    info!(
        target: "api",
        event = events::DETECT_CLASSIFIED,
        user_id = user.user_id,
        category = %category
    );

    let filename = unique_filename(&app_state, &original_name, &ext)
        .await
        .map_err(|e| {
            error!(target: "storage", event = events::STORAGE_ERROR, error = %e, "检查文件名失败");
            ApiError::internal(MSG_SAVE_PHOTO_FAILED)
        })?;

    if let Err(e) = app_state.storage.put(&filename, &data).await {
        error!(
            target: "storage",
            event = events::STORAGE_ERROR,
            backend = app_state.storage.name(),
            filename = %filename,
            error = %e,
            "照片保存失败"
        );
        return Err(ApiError::internal(MSG_SAVE_PHOTO_FAILED));
    }

    let new_report = NewReport {
        user_id: user.user_id,
        filename: filename.clone(),
        category,
        location: location.clone(),
    };
    let recorded = match app_state
        .database
        .record_report(&new_report, app_state.config.rewards.points_per_polluted_report)
        .await
    {
        Ok(recorded) => recorded,
        Err(e) => {
            error!(
                target: "api",
                event = events::DETECT_ERROR,
                user_id = user.user_id,
                filename = %filename,
                error = %format!("{:#}", e),
                "报告入库失败，回收已保存照片"
            );
            if let Err(e) = app_state.storage.delete(&filename).await {
                warn!(
                    target: "storage",
                    event = events::STORAGE_ERROR,
                    filename = %filename,
                    error = %e,
                    "回收照片失败"
                );
            }
            return Err(ApiError::internal(MSG_SAVE_REPORT_FAILED));
        }
    };

    info!(
        target: "api",
        event = events::DETECT_STORED,
        user_id = user.user_id,
        report_id = recorded.report.id,
        filename = %filename,
        category = %category,
        points_awarded = recorded.points_awarded
    );

    Ok(Json(DetectResponse {
        category,
        location,
        authorities_notified: category.is_polluted(),
    }))
}
