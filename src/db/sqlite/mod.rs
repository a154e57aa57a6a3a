//! SQLite模块
//! 用户与河流报告的SQLite实现

pub mod connection;
pub mod queries;
pub mod schemas;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use super::traits::Database;
use crate::model::{
    CreateUserOutcome, NewReport, PollutedReport, RecordedReport, Report, ReportStats, User,
};
use connection::ConnectionManager;
use queries::{HealthQueries, ReportQueries, UserQueries};
use schemas::SchemaManager;

/// SQLite数据库实现
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// 创建新的SQLite数据库实例
    pub async fn new(db_path: &str, max_connections: u32) -> Result<Self> {
        let pool = ConnectionManager::create_pool(db_path, max_connections).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn initialize(&self) -> Result<()> {
        SchemaManager::create_all_tables(&self.pool).await?;
        ConnectionManager::validate_pool(&self.pool).await
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<CreateUserOutcome> {
        UserQueries::insert(&self.pool, username, password_hash, is_admin).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserQueries::get_by_username(&self.pool, username).await
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        UserQueries::get_by_id(&self.pool, id).await
    }

    async fn set_admin(&self, username: &str, is_admin: bool) -> Result<bool> {
        UserQueries::set_admin(&self.pool, username, is_admin).await
    }

    async fn record_report(
        &self,
        report: &NewReport,
        reward_points: i64,
    ) -> Result<RecordedReport> {
        ReportQueries::record(&self.pool, report, reward_points).await
    }

    async fn list_reports_for_user(&self, user_id: i64) -> Result<Vec<Report>> {
        ReportQueries::list_for_user(&self.pool, user_id).await
    }

    async fn list_polluted_reports(&self) -> Result<Vec<PollutedReport>> {
        ReportQueries::list_polluted(&self.pool).await
    }

    async fn get_report(&self, id: i64) -> Result<Option<Report>> {
        ReportQueries::get_by_id(&self.pool, id).await
    }

    async fn mark_report_resolved(&self, id: i64) -> Result<bool> {
        ReportQueries::mark_resolved(&self.pool, id).await
    }

    async fn report_stats(&self) -> Result<ReportStats> {
        ReportQueries::stats(&self.pool).await
    }

    async fn health_check(&self) -> Result<bool> {
        HealthQueries::ping(&self.pool).await
    }
}
