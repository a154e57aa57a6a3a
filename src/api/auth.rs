//! 注册、登录与登出

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Local;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::model::{CreateUserOutcome, SessionUser};
use crate::util::html::{self, AuthAction};
use crate::util::logging::events;
use crate::util::middleware::SESSION_USER_KEY;
use crate::util::{password, ApiError};
use crate::AppState;

const FLASH_KEY: &str = "_flashes";

pub const MSG_REGISTERED: &str = "Registration successful! Please login.";
pub const MSG_USERNAME_TAKEN: &str = "Username already exists!";
pub const MSG_CREDENTIALS_REQUIRED: &str = "Username and password are required.";
pub const MSG_INVALID_LOGIN: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// 写入一条一次性提示，下一次页面渲染时展示
pub async fn push_flash(session: &Session, message: &str) -> Result<(), ApiError> {
    let mut flashes: Vec<String> = session.get(FLASH_KEY).await?.unwrap_or_default();
    flashes.push(message.to_string());
    session.insert(FLASH_KEY, flashes).await?;
    Ok(())
}

/// 取出并清空待展示的提示
pub async fn take_flashes(session: &Session) -> Vec<String> {
    match session.remove::<Vec<String>>(FLASH_KEY).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(e) => {
            warn!(target: "security", error = %e, "读取提示消息失败");
            Vec::new()
        }
    }
}

/// 管理员判定：用户名（忽略大小写）等于配置的管理员用户名
pub fn is_admin_username(username: &str, admin_username: &str) -> bool {
    let admin = admin_username.trim();
    !admin.is_empty() && username.to_lowercase() == admin.to_lowercase()
}

pub async fn register_page(session: Session) -> Html<String> {
    let flashes = take_flashes(&session).await;
    Html(html::login_page(AuthAction::Register, &flashes))
}

pub async fn login_page(session: Session) -> Html<String> {
    let flashes = take_flashes(&session).await;
    Html(html::login_page(AuthAction::Login, &flashes))
}

pub async fn register(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<Credentials>,
) -> Result<Response, ApiError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        warn!(
            target: "security",
            event = events::AUTH_REGISTER_REJECTED,
            reason = "missing_credentials"
        );
        push_flash(&session, MSG_CREDENTIALS_REQUIRED).await?;
        return Ok(Redirect::to("/register").into_response());
    }

    let accounts = &app_state.config.accounts;
    let is_admin = is_admin_username(username, &accounts.admin_username);
    let password_hash = password::hash_password(&form.password, accounts.bcrypt_cost).await?;

    match app_state
        .database
        .create_user(username, &password_hash, is_admin)
        .await?
    {
        CreateUserOutcome::Created(user) => {
            info!(
                target: "security",
                event = events::AUTH_REGISTER,
                user_id = user.id,
                username = %user.username,
                is_admin = user.is_admin
            );
            push_flash(&session, MSG_REGISTERED).await?;
            Ok(Redirect::to("/login").into_response())
        }
        CreateUserOutcome::UsernameTaken => {
            warn!(
                target: "security",
                event = events::AUTH_REGISTER_REJECTED,
                username = %username,
                reason = "username_taken"
            );
            push_flash(&session, MSG_USERNAME_TAKEN).await?;
            Ok(Redirect::to("/register").into_response())
        }
    }
}

pub async fn login(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<Credentials>,
) -> Result<Response, ApiError> {
    let username = form.username.trim();

    let user = if username.is_empty() {
        None
    } else {
        app_state.database.find_user_by_username(username).await?
    };

    let verified = match &user {
        Some(user) => password::verify_password(&form.password, &user.password_hash).await?,
        None => false,
    };

    match user {
        Some(user) if verified => {
            let session_user = SessionUser {
                user_id: user.id,
                username: user.username.clone(),
                is_admin: user.is_admin,
                login_time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            };
            session.cycle_id().await?;
            session.insert(SESSION_USER_KEY, &session_user).await?;

            info!(
                target: "security",
                event = events::AUTH_SUCCESS,
                user_id = user.id,
                username = %user.username,
                is_admin = user.is_admin
            );
            Ok(Redirect::to("/").into_response())
        }
        _ => {
            warn!(
                target: "security",
                event = events::AUTH_FAILURE,
                username = %username,
                reason = "invalid_credentials"
            );
            push_flash(&session, MSG_INVALID_LOGIN).await?;
            Ok(Redirect::to("/login").into_response())
        }
    }
}

pub async fn logout(session: Session) -> Result<Response, ApiError> {
    if let Ok(Some(user)) = session.get::<SessionUser>(SESSION_USER_KEY).await {
        info!(
            target: "security",
            event = events::AUTH_LOGOUT,
            user_id = user.user_id,
            username = %user.username
        );
    }
    session.flush().await?;
    Ok(Redirect::to("/login").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_username_match_is_case_insensitive() {
        assert!(is_admin_username("Admin", "admin"));
        assert!(is_admin_username("ADMIN", "Admin"));
        assert!(!is_admin_username("administrator", "admin"));
        assert!(!is_admin_username("", ""));
    }
}
