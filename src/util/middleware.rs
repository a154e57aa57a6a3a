use crate::model::SessionUser;
use crate::util::log::ACCESS_TARGET;
use crate::util::logging::events;
use crate::util::ApiError;
use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tower_sessions::Session;
use uuid::Uuid;

/// 会话中保存登录用户的键
pub const SESSION_USER_KEY: &str = "session_user";

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
}

fn extract_user_agent(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

fn parse_content_length(headers: &HeaderMap) -> usize {
    headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
}

fn is_quiet_path(path: &str) -> bool {
    const QUIET_EXACT: &[&str] = &["/api/health", "/api/health/components", "/favicon.ico"];
    const QUIET_PREFIX: &[&str] = &["/static", "/uploads/"];

    QUIET_EXACT.contains(&path) || QUIET_PREFIX.iter().any(|prefix| path.starts_with(prefix))
}

// 统一请求日志中间件
pub async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let user_agent = extract_user_agent(request.headers());
    let client_ip = extract_client_ip(request.headers());
    let request_size = parse_content_length(request.headers());
    request.extensions_mut().insert(request_id.clone());

    let quiet_path = is_quiet_path(&path);
    if !quiet_path {
        tracing::debug!(
            target: ACCESS_TARGET,
            event = events::REQUEST_START,
            request_id = %request_id,
            method = %method,
            path = %path,
            user_agent = %user_agent,
            client_ip = client_ip.as_deref().unwrap_or("unknown")
        );
    }

    let response = next.run(request).await;
    let duration_ms = start_time.elapsed().as_millis() as u64;
    let status = response.status();
    let response_size = parse_content_length(response.headers());

    if status.is_server_error() {
        tracing::error!(
            target: ACCESS_TARGET,
            event = events::REQUEST_ERROR,
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms,
            request_bytes = request_size,
            response_bytes = response_size,
            client_ip = client_ip.as_deref().unwrap_or("unknown")
        );
    } else if quiet_path {
        tracing::debug!(
            target: ACCESS_TARGET,
            event = events::REQUEST_COMPLETE,
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms
        );
    } else if status.is_client_error() {
        tracing::warn!(
            target: ACCESS_TARGET,
            event = events::REQUEST_COMPLETE,
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms,
            request_bytes = request_size,
            client_ip = client_ip.as_deref().unwrap_or("unknown")
        );
    } else {
        tracing::info!(
            target: ACCESS_TARGET,
            event = events::REQUEST_COMPLETE,
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms,
            request_bytes = request_size,
            response_bytes = response_size,
            user_agent = %user_agent,
            client_ip = client_ip.as_deref().unwrap_or("unknown")
        );
    }

    // 检测请求包含模型推理，阈值放宽
    if !quiet_path && duration_ms > 3_000 {
        tracing::warn!(
            target: ACCESS_TARGET,
            event = events::REQUEST_SLOW,
            request_id = %request_id,
            method = %method,
            path = %path,
            duration_ms,
            status = status.as_u16()
        );
    }

    response
}

/// 读取当前登录用户；会话存储异常按未登录处理
pub async fn current_user(session: &Session) -> Option<SessionUser> {
    match session.get::<SessionUser>(SESSION_USER_KEY).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(target: "security", error = %e, "读取会话失败");
            None
        }
    }
}

// 认证中间件：未登录返回401
pub async fn auth_required(session: Session, mut request: Request, next: Next) -> Response {
    match current_user(&session).await {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            tracing::warn!(
                target: "security",
                event = events::AUTH_DENIED,
                path = %request.uri().path(),
                reason = "missing_session_user"
            );
            ApiError::Unauthorized.into_response()
        }
    }
}

// 管理员中间件：未登录或非管理员一律返回403
pub async fn admin_required(session: Session, mut request: Request, next: Next) -> Response {
    match current_user(&session).await {
        Some(user) if user.is_admin => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        other => {
            tracing::warn!(
                target: "security",
                event = events::AUTH_DENIED,
                path = %request.uri().path(),
                user_id = other.as_ref().map(|u| u.user_id),
                reason = "admin_required"
            );
            ApiError::Forbidden.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_paths() {
        assert!(is_quiet_path("/api/health"));
        assert!(is_quiet_path("/static/app.js"));
        assert!(is_quiet_path("/uploads/20261019_river.png"));
        assert!(!is_quiet_path("/detect"));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.9".parse().unwrap());
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("10.0.0.1"));
    }
}
