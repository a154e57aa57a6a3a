//! 测试辅助：临时数据库、临时照片目录与固定结果的分类器

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use river_classifier::{Category, Classifier, ClassifierError, Prediction};
use tempfile::TempDir;

use crate::db::sqlite::SqliteDatabase;
use crate::db::Database;
use crate::model::{
    CreateUserOutcome, NewReport, PollutedReport, RecordedReport, Report, ReportStats, User,
};
use crate::storage::local::LocalStorage;
use crate::util::config::Config;
use crate::AppState;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";
pub const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-data";

/// 只看文件头的分类器，总是返回固定类别
pub struct FixedClassifier {
    pub category: Category,
}

impl Classifier for FixedClassifier {
    fn classify(&self, image_bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        let looks_like_image =
            image_bytes.starts_with(b"\x89PNG") || image_bytes.starts_with(&[0xFF, 0xD8]);
        if !looks_like_image {
            return Err(ClassifierError::InvalidImage("unknown format".to_string()));
        }
        let scores = match self.category {
            Category::Clean => vec![0.9, 0.1],
            Category::Polluted => vec![0.1, 0.9],
        };
        Prediction::from_scores(scores, &[Category::Clean, Category::Polluted])
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// 报告写入总是失败的数据库，其余操作转发给内部实现
pub struct ReportsUnavailable {
    pub inner: Arc<dyn Database>,
}

#[async_trait]
impl Database for ReportsUnavailable {
    async fn initialize(&self) -> Result<()> {
        self.inner.initialize().await
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<CreateUserOutcome> {
        self.inner.create_user(username, password_hash, is_admin).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn set_admin(&self, username: &str, is_admin: bool) -> Result<bool> {
        self.inner.set_admin(username, is_admin).await
    }

    async fn record_report(
        &self,
        _report: &NewReport,
        _reward_points: i64,
    ) -> Result<RecordedReport> {
        bail!("database is locked")
    }

    async fn list_reports_for_user(&self, user_id: i64) -> Result<Vec<Report>> {
        self.inner.list_reports_for_user(user_id).await
    }

    async fn list_polluted_reports(&self) -> Result<Vec<PollutedReport>> {
        self.inner.list_polluted_reports().await
    }

    async fn get_report(&self, id: i64) -> Result<Option<Report>> {
        self.inner.get_report(id).await
    }

    async fn mark_report_resolved(&self, id: i64) -> Result<bool> {
        self.inner.mark_report_resolved(id).await
    }

    async fn report_stats(&self) -> Result<ReportStats> {
        self.inner.report_stats().await
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }
}

/// 测试用应用状态，TempDir需与状态同生命周期
pub struct TestApp {
    pub state: AppState,
    pub dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.sqlite.path = dir.path().join("river.db").to_string_lossy().to_string();
    config.database.sqlite.max_connections = 2;
    config.storage.local.base_path = dir.path().join("uploads").to_string_lossy().to_string();
    config.storage.local.base_url = "/uploads".to_string();
    config.accounts.bcrypt_cost = 4;
    config.logging.file.enabled = false;
    config
}

pub async fn test_app(category: Category) -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let database = SqliteDatabase::new(
        &config.database.sqlite.path,
        config.database.sqlite.max_connections,
    )
    .await
    .unwrap();
    database.initialize().await.unwrap();

    let storage = LocalStorage::new(
        &config.storage.local.base_path,
        &config.storage.local.base_url,
    )
    .unwrap();

    let state = AppState {
        database: Arc::new(database),
        storage: Arc::new(storage),
        classifier: Arc::new(FixedClassifier { category }),
        config: Arc::new(config),
    };

    TestApp { state, dir }
}
