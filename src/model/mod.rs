use serde::{Deserialize, Serialize};

pub mod report;
pub mod user;

pub use report::{
    DetectResponse, NewReport, PollutedReport, RecordedReport, Report, ReportStats, ReportStatus,
};
pub use user::{CreateUserOutcome, User, UserProfile};

// 会话中存储的用户信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    /// 登录时从数据库读取，授权变更需重新登录生效
    pub is_admin: bool,
    pub login_time: String,
}

// 健康检查相关的数据结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStatus {
    pub total_mb: u64,
    pub used_mb: u64,
    pub usage_percent: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskStatus {
    pub total_gb: u64,
    pub used_gb: u64,
    pub usage_percent: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub uptime_seconds: u64,
    pub memory: MemoryStatus,
    pub disk: DiskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    pub detail: String,
}

impl ComponentStatus {
    pub fn healthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: true,
            detail: detail.into(),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsHealth {
    pub status: String,
    pub database: ComponentStatus,
    pub storage: ComponentStatus,
    pub classifier: ComponentStatus,
    pub system: SystemStatus,
}

impl ComponentsHealth {
    pub fn all_healthy(&self) -> bool {
        self.database.healthy && self.storage.healthy && self.classifier.healthy
    }
}
