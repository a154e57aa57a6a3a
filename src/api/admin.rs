//! 管理后台：污染报告处理

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use serde_json::{json, Value};
use tower_sessions::Session;
use tracing::{info, warn};

use super::dashboard::photo_url;
use crate::model::SessionUser;
use crate::util::html::{self, ReportRow};
use crate::util::logging::events;
use crate::util::middleware::current_user;
use crate::util::{ApiError, WebResult};
use crate::AppState;

pub async fn admin_panel(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Response, ApiError> {
    let user = match current_user(&session).await {
        Some(user) if user.is_admin => user,
        Some(user) => {
            warn!(
                target: "security",
                event = events::AUTH_DENIED,
                user_id = user.user_id,
                path = "/admin"
            );
            return Ok(Redirect::to("/").into_response());
        }
        None => return Ok(Redirect::to("/").into_response()),
    };

    let reports = app_state.database.list_polluted_reports().await?;
    let stats = app_state.database.report_stats().await?;

    let mut rows = Vec::with_capacity(reports.len());
    for polluted in &reports {
        rows.push(ReportRow {
            report: &polluted.report,
            username: Some(polluted.username.as_str()),
            photo_url: photo_url(&app_state, &polluted.report.filename).await,
        });
    }

    Ok(Html(html::admin_page(&user, &rows, &stats)).into_response())
}

/// 将污染报告标记为已处理
pub async fn update_status(
    State(app_state): State<AppState>,
    Extension(admin): Extension<SessionUser>,
    Path(report_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if !app_state.database.mark_report_resolved(report_id).await? {
        warn!(
            target: "api",
            event = events::ADMIN_RESOLVE,
            admin = %admin.username,
            report_id,
            outcome = "not_found"
        );
        return Err(ApiError::not_found("Report not found"));
    }

    info!(
        target: "api",
        event = events::ADMIN_RESOLVE,
        admin = %admin.username,
        report_id,
        outcome = "resolved"
    );
    Ok(Json(json!({ "success": true })))
}

/// 全部污染报告（含上报人）
pub async fn admin_reports(State(app_state): State<AppState>) -> Result<Json<WebResult>, ApiError> {
    let reports = app_state.database.list_polluted_reports().await?;
    Ok(Json(WebResult::ok(reports)))
}
