//! 服务器模块
//!
//! - 配置管理 (config.rs)
//! - 数据库初始化 (database.rs)
//! - 存储系统初始化 (storage.rs)
//! - 分类模型加载 (classifier.rs)
//! - HTTP服务器设置 (http.rs)

pub mod classifier;
pub mod config;
pub mod database;
pub mod http;
pub mod storage;

pub use classifier::ClassifierInitializer;
pub use config::ConfigManager;
pub use database::DatabaseInitializer;
pub use http::{HttpServer, ServerManager};
pub use storage::StorageInitializer;

use crate::api::monitoring;
use crate::build_info;
use crate::model::{ComponentStatus, ComponentsHealth};
use crate::util::config::Config;
use crate::util::system_info::init_start_time;
use crate::AppState;
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// 服务器引导程序 - 统一的服务器启动入口
pub struct ServerBootstrap {
    config: Config,
    _log_guard: Option<WorkerGuard>,
}

impl ServerBootstrap {
    /// 加载配置、初始化日志并校验配置
    pub async fn new() -> Result<Self> {
        let (config, validation_report) = ConfigManager::load_and_validate()?;
        let log_guard = ConfigManager::initialize_logging(&config)?;

        info!("[launch] 开始服务器引导程序...");
        ConfigManager::report_validation(&validation_report)?;
        info!("[ok] 服务器引导程序初始化完成");

        Ok(Self {
            config,
            _log_guard: log_guard,
        })
    }

    /// 启动服务器
    pub async fn start(self) -> Result<()> {
        info!("=== RiverClean服务启动 ===");
        info!("版本信息: {}", build_info::summary());
        info!("服务地址: {}", self.config.base_url());

        init_start_time();

        let app_state = self.create_app_state().await?;
        let server = ServerManager::create_server(&self.config, app_state).await?;
        ServerManager::start_server(server).await?;

        info!("=== RiverClean服务已停止 ===");
        Ok(())
    }

    /// 创建应用状态
    async fn create_app_state(&self) -> Result<AppState> {
        let database = DatabaseInitializer::create_from_config(&self.config).await?;
        let storage = StorageInitializer::create_from_config(&self.config).await?;
        StorageInitializer::validate_connection(&storage).await?;
        let classifier = ClassifierInitializer::load_from_config(&self.config).await?;

        Ok(AppState {
            database,
            storage,
            classifier,
            config: Arc::new(self.config.clone()),
        })
    }

    /// 对各组件做一次健康检查；模型加载失败记为不健康而不是直接报错
    pub async fn health_check(&self) -> Result<ComponentsHealth> {
        init_start_time();
        let database = DatabaseInitializer::create_from_config(&self.config).await?;
        let storage = StorageInitializer::create_from_config(&self.config).await?;

        let classifier = match ClassifierInitializer::load_from_config(&self.config).await {
            Ok(classifier) => {
                ComponentStatus::healthy(format!("Model loaded: {}", classifier.name()))
            }
            Err(e) => {
                warn!(target: "system", error = %format!("{:#}", e), "分类模型加载失败");
                ComponentStatus::unhealthy(format!("{:#}", e))
            }
        };

        Ok(monitoring::check_components(database.as_ref(), storage.as_ref(), classifier).await)
    }

    /// 设置或取消用户的管理员标记
    pub async fn grant_admin(&self, username: &str, is_admin: bool) -> Result<()> {
        let database = DatabaseInitializer::create_from_config(&self.config).await?;
        if !database.set_admin(username, is_admin).await? {
            bail!("用户不存在: {}", username);
        }
        info!(
            target: "security",
            event = crate::util::logging::events::ADMIN_GRANT,
            username,
            is_admin
        );
        Ok(())
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }
}

/// 启动服务器（便捷函数）
pub async fn start_server() -> Result<()> {
    ServerBootstrap::new().await?.start().await
}

/// 执行组件健康检查（便捷函数）
pub async fn check_system_health() -> Result<ComponentsHealth> {
    ServerBootstrap::new().await?.health_check().await
}

/// 授予管理员权限（便捷函数）；用户需重新登录后生效
pub async fn grant_admin(username: &str) -> Result<()> {
    ServerBootstrap::new().await?.grant_admin(username, true).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_config;

    fn bootstrap(dir: &tempfile::TempDir) -> ServerBootstrap {
        ServerBootstrap {
            config: test_config(dir),
            _log_guard: None,
        }
    }

    #[tokio::test]
    async fn test_health_check_reports_missing_model() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut server = bootstrap(&dir);
        server.config.classifier.model_path =
            dir.path().join("missing.onnx").to_string_lossy().to_string();

        let health = server.health_check().await.unwrap();
        assert!(health.database.healthy);
        assert!(health.storage.healthy);
        assert!(!health.classifier.healthy);
        assert_eq!(health.status, "unhealthy");
    }

    #[tokio::test]
    async fn test_grant_admin() {
        let dir = tempfile::TempDir::new().unwrap();
        let server = bootstrap(&dir);

        assert!(server.grant_admin("ghost", true).await.is_err());

        let database = DatabaseInitializer::create_from_config(server.get_config())
            .await
            .unwrap();
        database.create_user("erin", "hash", false).await.unwrap();
        drop(database);

        server.grant_admin("erin", true).await.unwrap();
        let database = DatabaseInitializer::create_from_config(server.get_config())
            .await
            .unwrap();
        let erin = database.find_user_by_username("erin").await.unwrap().unwrap();
        assert!(erin.is_admin);
    }
}
