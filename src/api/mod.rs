mod admin;
mod auth;
mod dashboard;
mod detect;
mod files;
pub mod monitoring;
mod utils;

use crate::util::config::{CorsConfig, SessionConfig};
use crate::util::middleware;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_sessions::cookie::time::Duration as CookieDuration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::{info, warn};

/// 按配置创建CORS层
fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    info!("[global] CORS配置 - 允许的源: {}", config.allowed_origins.join(","));

    CorsLayer::new()
        .allow_origin(
            config
                .allowed_origins
                .iter()
                .filter_map(|s| match s.trim().parse() {
                    Ok(origin) => Some(origin),
                    Err(e) => {
                        warn!("无效的CORS源: {} - {}", s, e);
                        None
                    }
                })
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

fn create_session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure_cookie)
        .with_expiry(Expiry::OnInactivity(CookieDuration::seconds(
            config.timeout_secs,
        )))
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
}

/// 静态资源目录：优先可执行文件上级目录的static，其次本地static
fn resolve_static_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let parent_static = exe_dir.parent().unwrap_or(&exe_dir).join("static");
    let local_static = exe_dir.join("static");
    let cwd_static = PathBuf::from("static");

    if parent_static.exists() {
        info!("[search] 使用父目录静态文件: {}", parent_static.display());
        parent_static
    } else if local_static.exists() {
        info!("[search] 使用本地静态文件: {}", local_static.display());
        local_static
    } else {
        if !cwd_static.exists() {
            warn!("[warn]  静态文件目录不存在，使用默认路径: {}", cwd_static.display());
        }
        cwd_static
    }
}

pub fn routes(app_state: AppState) -> Router {
    let config = app_state.config.clone();
    let session_layer = create_session_layer(&config.session);

    // 公开路由 - 页面自行处理未登录跳转
    let public_routes = Router::new()
        .route("/", get(detect::index))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(dashboard::dashboard_page))
        .route("/admin", get(admin::admin_panel))
        .route("/uploads/:filename", get(files::uploaded_file))
        .route("/api/health", get(monitoring::basic_health_check))
        .route(
            "/api/health/components",
            get(monitoring::components_health_check),
        );

    // 受保护路由 - 未登录返回401
    let protected_routes = Router::new()
        .route("/detect", post(detect::detect))
        .route("/api/me", get(dashboard::me))
        .route("/api/reports", get(dashboard::my_reports))
        .route_layer(from_fn(middleware::auth_required));

    // 管理员路由 - 非管理员返回403
    let admin_routes = Router::new()
        .route("/update_status/:report_id", post(admin::update_status))
        .route("/api/admin/reports", get(admin::admin_reports))
        .route_layer(from_fn(middleware::admin_required));

    Router::new()
        .nest_service("/static", ServeDir::new(resolve_static_path()))
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(app_state)
        // 全局中间件
        .layer(DefaultBodyLimit::max(config.upload.max_body_bytes()))
        .layer(from_fn(middleware::request_logging_middleware))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(session_layer)
        .layer(create_cors_layer(&config.cors))
}
