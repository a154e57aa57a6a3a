use anyhow::Result;
use async_trait::async_trait;

use crate::model::{
    CreateUserOutcome, NewReport, PollutedReport, RecordedReport, Report, ReportStats, User,
};

/// 数据库操作抽象
#[async_trait]
pub trait Database: Send + Sync {
    /// 初始化数据库（建表，幂等）
    async fn initialize(&self) -> Result<()>;

    /// 用户名重复返回 `UsernameTaken`，不视为错误
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<CreateUserOutcome>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// 用户不存在时返回 false
    async fn set_admin(&self, username: &str, is_admin: bool) -> Result<bool>;

    /// 单事务写入报告；污染类报告同时为用户增加 `reward_points` 积分
    async fn record_report(&self, report: &NewReport, reward_points: i64)
        -> Result<RecordedReport>;

    /// 按时间倒序
    async fn list_reports_for_user(&self, user_id: i64) -> Result<Vec<Report>>;

    /// 全部污染报告（含上报人用户名），按时间倒序
    async fn list_polluted_reports(&self) -> Result<Vec<PollutedReport>>;

    async fn get_report(&self, id: i64) -> Result<Option<Report>>;

    /// 状态置为 Done；报告不存在时返回 false
    async fn mark_report_resolved(&self, id: i64) -> Result<bool>;

    async fn report_stats(&self) -> Result<ReportStats>;

    async fn health_check(&self) -> Result<bool>;
}
