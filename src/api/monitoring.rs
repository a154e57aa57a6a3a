//! 健康检查模块
//! 基础存活探针与组件级健康检查

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::warn;

use crate::build_info;
use crate::db::Database;
use crate::model::{
    ComponentStatus, ComponentsHealth, DiskStatus, HealthStatus, MemoryStatus, SystemStatus,
};
use crate::storage::Storage;
use crate::util::system_info;
use crate::AppState;

/// 基本健康检查
pub async fn basic_health_check() -> impl IntoResponse {
    let status = HealthStatus {
        status: "healthy".to_string(),
        version: build_info::summary(),
        uptime: system_info::get_uptime_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    };

    let mut resp = Json(status).into_response();
    resp.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp
}

/// 组件健康检查，任一组件异常时返回503
pub async fn components_health_check(State(app_state): State<AppState>) -> Response {
    let health = collect_components_health(&app_state).await;
    let status = if health.all_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut resp = (status, Json(health)).into_response();
    resp.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp
}

/// 检查当前应用状态中的全部组件
pub async fn collect_components_health(app_state: &AppState) -> ComponentsHealth {
    let classifier =
        ComponentStatus::healthy(format!("Model loaded: {}", app_state.classifier.name()));
    check_components(
        app_state.database.as_ref(),
        app_state.storage.as_ref(),
        classifier,
    )
    .await
}

/// 依次检查数据库与存储；模型状态由调用方给出，命令行 health-check 也复用这里
pub async fn check_components(
    database: &dyn Database,
    storage: &dyn Storage,
    classifier: ComponentStatus,
) -> ComponentsHealth {
    let database = match database.health_check().await {
        Ok(true) => ComponentStatus::healthy("Connection successful"),
        Ok(false) => ComponentStatus::unhealthy("Unexpected ping result"),
        Err(e) => {
            warn!(target: "system", component = "database", error = %e, "数据库健康检查失败");
            ComponentStatus::unhealthy(format!("Connection failed: {}", e))
        }
    };

    let backend = storage.name();
    let storage = match storage.health_check().await {
        Ok(true) => ComponentStatus::healthy(format!("{} storage read/write normal", backend)),
        Ok(false) => ComponentStatus::unhealthy(format!("{} storage check failed", backend)),
        Err(e) => {
            warn!(target: "system", component = "storage", backend, error = %e, "存储健康检查失败");
            ComponentStatus::unhealthy(format!("{} storage error: {}", backend, e))
        }
    };

    let system = tokio::task::spawn_blocking(system_info::collect_system_status)
        .await
        .unwrap_or_else(|e| {
            warn!(target: "system", error = %e, "系统资源采集失败");
            SystemStatus {
                uptime_seconds: system_info::get_uptime_seconds(),
                memory: MemoryStatus {
                    total_mb: 0,
                    used_mb: 0,
                    usage_percent: 0.0,
                },
                disk: DiskStatus {
                    total_gb: 0,
                    used_gb: 0,
                    usage_percent: 0.0,
                },
            }
        });

    let mut health = ComponentsHealth {
        status: String::new(),
        database,
        storage,
        classifier,
        system,
    };
    health.status = if health.all_healthy() {
        "healthy".to_string()
    } else {
        "unhealthy".to_string()
    };
    health
}
