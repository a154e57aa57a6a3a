//! 用户面板：积分与历史报告

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use tower_sessions::Session;
use tracing::warn;

use crate::model::{Report, SessionUser, UserProfile};
use crate::util::html::{self, ReportRow};
use crate::util::middleware::current_user;
use crate::util::{ApiError, WebResult};
use crate::AppState;

/// 照片的访问地址，存储后端无法给出时退回本地路由
pub(crate) async fn photo_url(app_state: &AppState, filename: &str) -> String {
    match app_state.storage.get_public_url(filename).await {
        Ok(url) => url,
        Err(e) => {
            warn!(target: "storage", filename, error = %e, "生成照片地址失败");
            format!("/uploads/{}", filename)
        }
    }
}

pub async fn dashboard_page(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Response, ApiError> {
    let Some(user) = current_user(&session).await else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(account) = app_state.database.find_user_by_id(user.user_id).await? else {
        // 账号已不存在，清掉过期会话
        session.flush().await?;
        return Ok(Redirect::to("/login").into_response());
    };
    let profile = UserProfile::from(&account);

    let reports: Vec<Report> = app_state
        .database
        .list_reports_for_user(user.user_id)
        .await?;
    let mut rows = Vec::with_capacity(reports.len());
    for report in &reports {
        rows.push(ReportRow {
            report,
            username: None,
            photo_url: photo_url(&app_state, &report.filename).await,
        });
    }

    Ok(Html(html::dashboard_page(&user, &profile, &rows)).into_response())
}

/// 当前用户资料
pub async fn me(
    State(app_state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<WebResult>, ApiError> {
    let account = app_state
        .database
        .find_user_by_id(user.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(WebResult::ok(UserProfile::from(&account))))
}

/// 当前用户的报告，最新的在前
pub async fn my_reports(
    State(app_state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<WebResult>, ApiError> {
    let reports = app_state
        .database
        .list_reports_for_user(user.user_id)
        .await?;
    Ok(Json(WebResult::ok(reports)))
}
