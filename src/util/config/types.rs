//! 配置结构定义模块
//! 包含系统配置的所有数据结构

use river_classifier::{Category, ClassifierOptions, TensorLayout};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn get_port(&self) -> u16 {
        self.server.port
    }

    /// 对外访问的基础URL
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.server.protocol, self.server.host, self.server.port
        )
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// 单个请求处理超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            protocol: default_protocol(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    /// 请求超时，配置为0时使用默认值
    pub fn request_timeout(&self) -> Duration {
        let secs = match self.request_timeout_secs {
            0 => default_request_timeout(),
            secs => secs,
        };
        Duration::from_secs(secs)
    }
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 无操作超时（秒）
    pub timeout_secs: i64,
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3600,
            secure_cookie: false,
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库类型，目前仅支持 "sqlite"
    #[serde(rename = "type")]
    pub database_type: String,
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_type: "sqlite".to_string(),
            sqlite: SqliteConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "data/database.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

/// 照片存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// "local" 或 "oss"
    #[serde(rename = "type")]
    pub storage_type: String,
    #[serde(default)]
    pub local: LocalStorageConfig,
    #[serde(default)]
    pub oss: Option<OssConfig>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            storage_type: "local".to_string(),
            local: LocalStorageConfig::default(),
            oss: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    pub base_path: String,
    pub base_url: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            base_path: "uploads".to_string(),
            base_url: "/uploads".to_string(),
        }
    }
}

/// OSS存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OssConfig {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub public_endpoint: Option<String>,
}

/// 上传限制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub allowed_extensions: Vec<String>,
    pub max_file_mb: u64,
    pub default_location: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            max_file_mb: 16,
            default_location: "Unknown Location".to_string(),
        }
    }
}

impl UploadConfig {
    pub fn max_body_bytes(&self) -> usize {
        (self.max_file_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// 分类模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub model_path: String,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_layout")]
    pub layout: TensorLayout,
    #[serde(default = "default_labels")]
    pub labels: Vec<Category>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: "model.onnx".to_string(),
            input_size: default_input_size(),
            layout: default_layout(),
            labels: default_labels(),
        }
    }
}

impl ClassifierConfig {
    pub fn options(&self) -> ClassifierOptions {
        ClassifierOptions {
            input_size: self.input_size,
            layout: self.layout,
            labels: self.labels.clone(),
        }
    }
}

fn default_input_size() -> u32 {
    224
}

fn default_layout() -> TensorLayout {
    TensorLayout::Nhwc
}

fn default_labels() -> Vec<Category> {
    vec![Category::Clean, Category::Polluted]
}

/// 账号配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// 注册时用户名（忽略大小写）等于该值即获得管理员权限
    pub admin_username: String,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// 奖励积分配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    pub points_per_polluted_report: i64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            points_per_polluted_report: 1,
        }
    }
}

/// CORS配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
            ],
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: LogFileConfig,
    pub structured: Option<bool>,
    #[serde(default)]
    pub level_config: Option<LevelConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: LogFileConfig::default(),
            structured: Some(false),
            level_config: None,
        }
    }
}

/// 日志文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogFileConfig {
    pub enabled: bool,
    pub directory: String,
    pub retention_days: Option<u32>,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: "logs".to_string(),
            retention_days: Some(7),
        }
    }
}

/// 分模块日志级别
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub security: Option<String>,
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}
