//! 配置加载和管理模块
//! 处理配置文件的读取、写入和环境变量覆盖

use super::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从YAML文件读取配置
    pub fn read_yaml(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = serde_yaml::from_str(&config_str)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 读取配置并应用环境变量覆盖
    pub fn load_with_env_overrides(path: impl AsRef<Path>) -> Result<Config> {
        let config = Self::read_yaml(path)?;
        Ok(Self::apply_env_overrides(config))
    }

    /// 从环境变量读取配置覆盖
    pub fn apply_env_overrides(config: Config) -> Config {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// 覆盖来源可注入，便于测试
    pub fn apply_overrides_from<F>(mut config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        tracing::info!("[tool] 应用环境变量配置覆盖...");

        if let Some(host) = lookup("RIVERCLEAN_HOST") {
            tracing::info!("[ok] 环境变量覆盖服务器地址: {}", host);
            config.server.host = host;
        }

        if let Some(port_str) = lookup("RIVERCLEAN_PORT") {
            match port_str.trim().parse::<u16>() {
                Ok(port) => {
                    config.server.port = port;
                    tracing::info!("[ok] 环境变量覆盖服务器端口: {}", port);
                }
                Err(_) => tracing::warn!("[warn] RIVERCLEAN_PORT 无效: {}", port_str),
            }
        }

        if let Some(db_path) = lookup("RIVERCLEAN_DB_PATH") {
            tracing::info!("[ok] 环境变量覆盖数据库路径: {}", db_path);
            config.database.sqlite.path = db_path;
        }

        if let Some(upload_dir) = lookup("RIVERCLEAN_UPLOAD_DIR") {
            tracing::info!("[ok] 环境变量覆盖上传目录: {}", upload_dir);
            config.storage.local.base_path = upload_dir;
        }

        if let Some(model_path) = lookup("RIVERCLEAN_MODEL_PATH") {
            tracing::info!("[ok] 环境变量覆盖模型路径: {}", model_path);
            config.classifier.model_path = model_path;
        }

        if let Some(level) = lookup("RIVERCLEAN_LOG_LEVEL") {
            tracing::info!("[ok] 环境变量覆盖日志级别: {}", level);
            config.logging.level = level;
        }

        // OSS配置覆盖（安全优先）
        let oss_key = lookup("OSS_ACCESS_KEY");
        let oss_secret = lookup("OSS_ACCESS_SECRET");
        let oss_bucket = lookup("OSS_BUCKET");
        if let Some(oss) = config.storage.oss.as_mut() {
            if let Some(key) = oss_key {
                oss.access_key_id = key;
                tracing::info!("[ok] 环境变量覆盖OSS访问密钥: [安全隐藏]");
            }
            if let Some(secret) = oss_secret {
                oss.access_key_secret = secret;
                tracing::info!("[ok] 环境变量覆盖OSS密钥: [安全隐藏]");
            }
            if let Some(bucket) = oss_bucket {
                tracing::info!("[ok] 环境变量覆盖OSS存储桶: {}", bucket);
                oss.bucket = bucket;
            }
        } else if oss_key.is_some() || oss_bucket.is_some() {
            tracing::warn!("[warn] 检测到OSS环境变量，但配置文件中未启用oss段，忽略");
        }

        tracing::info!("[tool] 环境变量覆盖配置应用完成");
        tracing::info!(
            event = "config.summary",
            base_url = %config.base_url(),
            database = %config.database.sqlite.path,
            storage = %config.storage.storage_type,
            model = %config.classifier.model_path
        );

        config
    }
}

/// 配置写入器
pub struct ConfigWriter;

impl ConfigWriter {
    /// 写入YAML（自动创建父目录）
    pub fn write_yaml_with_dir(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(config)?;
        fs::write(path, yaml).with_context(|| format!("写入配置失败: {}", path.display()))?;
        Ok(())
    }

    /// 生成默认配置模板
    pub fn generate_template() -> Config {
        Config {
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageSettings::default(),
            upload: UploadConfig::default(),
            classifier: ClassifierConfig::default(),
            accounts: AccountsConfig::default(),
            rewards: RewardsConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_template_round_trips_through_yaml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config").join("config.yaml");
        ConfigWriter::write_yaml_with_dir(&ConfigWriter::generate_template(), &path).unwrap();

        let loaded = ConfigLoader::read_yaml(&path).unwrap();
        assert_eq!(loaded.server.port, 5000);
        assert_eq!(loaded.accounts.admin_username, "admin");
        assert_eq!(loaded.upload.default_location, "Unknown Location");
        assert_eq!(loaded.classifier.input_size, 224);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "server:\n  host: 0.0.0.0\n  port: 8080\nclassifier:\n  model_path: models/river.onnx\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.protocol, "http");
        assert_eq!(config.classifier.model_path, "models/river.onnx");
        assert_eq!(config.classifier.labels.len(), 2);
        assert_eq!(config.rewards.points_per_polluted_report, 1);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("RIVERCLEAN_PORT", "9090"),
            ("RIVERCLEAN_DB_PATH", "/tmp/river.db"),
            ("RIVERCLEAN_MODEL_PATH", "/opt/model.onnx"),
        ]
        .into_iter()
        .collect();

        let config = ConfigLoader::apply_overrides_from(ConfigWriter::generate_template(), |key| {
            env.get(key).map(|v| v.to_string())
        });
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.sqlite.path, "/tmp/river.db");
        assert_eq!(config.classifier.model_path, "/opt/model.onnx");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let config = ConfigLoader::apply_overrides_from(ConfigWriter::generate_template(), |key| {
            (key == "RIVERCLEAN_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 5000);
    }
}
