//! 配置管理模块
//! 负责配置文件的查找、加载、验证和日志初始化

use crate::util::config::{Config, ConfigLoader, ConfigValidator, ValidationReport};
use crate::util::log::{cleanup_old_logs, log_init_with_config};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// 日志文件名前缀
pub const LOG_FILE_PREFIX: &str = "riverclean";

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 加载和验证配置
    pub fn load_and_validate() -> Result<(Config, ValidationReport)> {
        let config_path = Self::find_config_file_path("config.yaml");
        let config = Self::load_from_path(&config_path)?;
        let report = ConfigValidator::validate_all(&config);
        Ok((config, report))
    }

    /// 从指定路径加载配置；文件不存在时写入默认模板
    pub fn load_from_path(config_path: &Path) -> Result<Config> {
        if !config_path.exists() {
            eprintln!("[note] 创建默认配置文件: {}", config_path.display());
            let config = Config::default();
            if let Err(e) = config.write_yaml_to_path(config_path) {
                eprintln!("[fail] 创建默认配置文件失败: {}", e);
            }
            return Ok(ConfigLoader::apply_env_overrides(config));
        }

        ConfigLoader::load_with_env_overrides(config_path)
    }

    /// 初始化日志系统并清理过期日志
    pub fn initialize_logging(config: &Config) -> Result<Option<WorkerGuard>> {
        let log_guard = log_init_with_config(LOG_FILE_PREFIX, &config.logging)?;

        if let (true, Some(retention_days)) =
            (config.logging.file.enabled, config.logging.file.retention_days)
        {
            let log_path = Path::new(&config.logging.file.directory);
            match cleanup_old_logs(log_path, LOG_FILE_PREFIX, retention_days) {
                Ok(removed) => info!(removed, retention_days, "[ok] 日志清理完成"),
                Err(e) => warn!("日志清理失败: {}", e),
            }
        }

        info!("[ok] 日志系统初始化完成");
        Ok(log_guard)
    }

    /// 输出验证结果，存在错误时中止启动
    pub fn report_validation(report: &ValidationReport) -> Result<()> {
        for issue in &report.info {
            info!("  - {}: {}", issue.field, issue.message);
        }
        for issue in &report.warnings {
            warn!("  - {}: {}", issue.field, issue.message);
        }
        for issue in &report.errors {
            warn!("  - {}: {}", issue.field, issue.message);
        }

        info!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "配置验证完成"
        );
        if report.has_errors() {
            bail!("配置验证失败: {} 个错误", report.error_count());
        }
        Ok(())
    }

    /// 查找配置文件路径，适应开发和部署目录
    pub fn find_config_file_path(filename: &str) -> PathBuf {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()));

        let mut candidates = vec![current_dir.join("config").join(filename)];
        if let Some(parent) = current_dir.parent() {
            candidates.push(parent.join("config").join(filename));
        }
        if let Some(exe_dir) = &exe_dir {
            // 部署在 bin/ 目录时查找项目根目录
            if exe_dir.file_name() == Some(std::ffi::OsStr::new("bin")) {
                if let Some(root) = exe_dir.parent() {
                    candidates.push(root.join("config").join(filename));
                }
            }
            candidates.push(exe_dir.join(filename));
        }
        candidates.push(current_dir.join(filename));

        if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
            return found;
        }

        if current_dir.file_name() == Some(std::ffi::OsStr::new("bin")) {
            if let Some(parent) = current_dir.parent() {
                return parent.join("config").join(filename);
            }
        }
        current_dir.join(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_writes_template() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let config = ConfigManager::load_from_path(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.upload.default_location, "Unknown Location");

        let reloaded = ConfigManager::load_from_path(&path).unwrap();
        assert_eq!(reloaded.accounts.admin_username, config.accounts.admin_username);
    }

    #[test]
    fn test_validation_errors_abort() {
        let mut report = ValidationReport::new();
        report.add_warning("session.secure_cookie", "off");
        assert!(ConfigManager::report_validation(&report).is_ok());

        report.add_error("server.port", "端口不能为0");
        assert!(ConfigManager::report_validation(&report).is_err());
    }
}
