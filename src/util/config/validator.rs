//! 配置验证模块
//! 提供配置的验证、检查和诊断功能

use super::types::*;
use std::collections::HashSet;
use std::path::Path;

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 全面验证配置
    pub fn validate_all(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_server_config(config, &mut report);
        Self::validate_session_config(&config.session, &mut report);
        Self::validate_database_config(&config.database, &mut report);
        Self::validate_storage_config(&config.storage, &mut report);
        Self::validate_upload_config(&config.upload, &mut report);
        Self::validate_classifier_config(&config.classifier, &mut report);
        Self::validate_accounts_config(config, &mut report);
        Self::validate_logging_config(&config.logging, &mut report);

        report
    }

    fn validate_server_config(config: &Config, report: &mut ValidationReport) {
        if config.server.port == 0 {
            report.add_error("server.port", "端口不能为0");
        }
        if !matches!(config.server.protocol.as_str(), "http" | "https") {
            report.add_error(
                "server.protocol",
                &format!("服务器协议必须是http或https: {}", config.server.protocol),
            );
        }
        if config.server.request_timeout_secs == 0 {
            report.add_warning("server.request_timeout_secs", "请求超时为0，将使用默认60秒");
        }
    }

    fn validate_session_config(session: &SessionConfig, report: &mut ValidationReport) {
        if session.timeout_secs <= 0 {
            report.add_error("session.timeout_secs", "会话超时必须大于0");
        }
        if !session.secure_cookie {
            report.add_info("session.secure_cookie", "会话Cookie未启用Secure标记");
        }
    }

    fn validate_database_config(database: &DatabaseConfig, report: &mut ValidationReport) {
        if database.database_type != "sqlite" {
            report.add_error(
                "database.type",
                &format!("不支持的数据库类型: {}", database.database_type),
            );
        }
        if database.sqlite.path.trim().is_empty() {
            report.add_error("database.sqlite.path", "SQLite路径不能为空");
        }
        if database.sqlite.max_connections == 0 {
            report.add_error("database.sqlite.max_connections", "连接池大小必须大于0");
        }
    }

    fn validate_storage_config(storage: &StorageSettings, report: &mut ValidationReport) {
        match storage.storage_type.as_str() {
            "local" => {
                if storage.local.base_path.trim().is_empty() {
                    report.add_error("storage.local.base_path", "本地存储目录不能为空");
                }
                report.add_info("storage", "使用本地存储保存上传照片");
            }
            "oss" => match &storage.oss {
                Some(oss) => {
                    if oss.bucket.is_empty() {
                        report.add_error("storage.oss.bucket", "OSS桶名称不能为空");
                    }
                    if oss.endpoint.is_empty() {
                        report.add_error("storage.oss.endpoint", "OSS服务器地址不能为空");
                    }
                    if oss.access_key_id.is_empty() || oss.access_key_secret.is_empty() {
                        report.add_error("storage.oss.credentials", "OSS访问密钥不能为空");
                    }
                }
                None => report.add_error("storage.oss", "存储类型为oss但缺少oss配置"),
            },
            other => report.add_error("storage.type", &format!("不支持的存储类型: {}", other)),
        }
    }

    fn validate_upload_config(upload: &UploadConfig, report: &mut ValidationReport) {
        if upload.allowed_extensions.is_empty() {
            report.add_error("upload.allowed_extensions", "至少需要允许一种图片格式");
        }
        for ext in &upload.allowed_extensions {
            if ext.starts_with('.') || ext.chars().any(|c| !c.is_ascii_alphanumeric()) {
                report.add_error(
                    "upload.allowed_extensions",
                    &format!("扩展名格式无效（不带点，仅字母数字）: {}", ext),
                );
            }
        }
        if upload.max_file_mb == 0 {
            report.add_error("upload.max_file_mb", "上传大小限制必须大于0");
        }
        if upload.default_location.trim().is_empty() {
            report.add_warning("upload.default_location", "默认位置为空");
        }
    }

    fn validate_classifier_config(classifier: &ClassifierConfig, report: &mut ValidationReport) {
        if classifier.input_size == 0 {
            report.add_error("classifier.input_size", "模型输入尺寸必须大于0");
        }
        if classifier.labels.is_empty() {
            report.add_error("classifier.labels", "分类标签不能为空");
        }
        let unique: HashSet<_> = classifier.labels.iter().collect();
        if unique.len() != classifier.labels.len() {
            report.add_error("classifier.labels", "分类标签存在重复");
        }
        if !Path::new(&classifier.model_path).exists() {
            report.add_warning(
                "classifier.model_path",
                &format!("模型文件不存在: {}", classifier.model_path),
            );
        }
    }

    fn validate_accounts_config(config: &Config, report: &mut ValidationReport) {
        if config.accounts.admin_username.trim().is_empty() {
            report.add_warning("accounts.admin_username", "管理员用户名为空，注册将无法自动获得管理员权限");
        }
        if !(4..=31).contains(&config.accounts.bcrypt_cost) {
            report.add_error("accounts.bcrypt_cost", "bcrypt cost 必须在4~31之间");
        }
        if config.rewards.points_per_polluted_report < 0 {
            report.add_error("rewards.points_per_polluted_report", "奖励积分不能为负数");
        }
    }

    fn validate_logging_config(logging: &LoggingConfig, report: &mut ValidationReport) {
        if !matches!(
            logging.level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            report.add_warning(
                "logging.level",
                &format!("未知日志级别 {}，将使用info", logging.level),
            );
        }
        if logging.file.enabled && logging.file.directory.trim().is_empty() {
            report.add_error("logging.file.directory", "日志目录不能为空");
        }
    }
}

/// 验证问题
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// 配置验证报告
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_info(&mut self, field: &str, message: &str) {
        self.info.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::ConfigWriter;

    #[test]
    fn test_default_config_has_no_errors() {
        let report = ConfigValidator::validate_all(&ConfigWriter::generate_template());
        assert!(!report.has_errors(), "{:?}", report.errors);
    }

    #[test]
    fn test_oss_without_section_is_error() {
        let mut config = ConfigWriter::generate_template();
        config.storage.storage_type = "oss".to_string();
        let report = ConfigValidator::validate_all(&config);
        assert!(report.errors.iter().any(|e| e.field == "storage.oss"));
    }

    #[test]
    fn test_bad_extensions_and_session_timeout() {
        let mut config = ConfigWriter::generate_template();
        config.upload.allowed_extensions = vec![".png".to_string()];
        config.session.timeout_secs = 0;
        let report = ConfigValidator::validate_all(&config);
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn test_zero_request_timeout_falls_back_to_default() {
        let mut config = ConfigWriter::generate_template();
        config.server.request_timeout_secs = 0;
        let report = ConfigValidator::validate_all(&config);
        assert!(!report.has_errors());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.field == "server.request_timeout_secs"));
        assert_eq!(config.server.request_timeout(), std::time::Duration::from_secs(60));

        config.server.request_timeout_secs = 5;
        assert_eq!(config.server.request_timeout(), std::time::Duration::from_secs(5));
    }
}
