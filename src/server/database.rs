//! 数据库初始化模块
//! 负责根据配置创建数据库连接并建表

use crate::db;
use crate::util::config::Config;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// 数据库初始化器
pub struct DatabaseInitializer;

impl DatabaseInitializer {
    /// 根据配置创建数据库实例，表结构不存在时创建
    pub async fn create_from_config(config: &Config) -> Result<Arc<dyn db::Database>> {
        info!(
            target: "system",
            db_type = %config.database.database_type,
            path = %config.database.sqlite.path,
            "[cabinet] 初始化数据库连接..."
        );

        let database: Arc<dyn db::Database> = Arc::from(
            db::create_database(&config.database)
                .await
                .context("创建数据库连接失败")?,
        );
        database.initialize().await.context("初始化数据库表结构失败")?;

        info!(target: "system", "[ok] 数据库初始化完成");
        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_config;

    #[tokio::test]
    async fn test_creates_database_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = test_config(&dir);

        let database = DatabaseInitializer::create_from_config(&config).await.unwrap();
        assert!(database.health_check().await.unwrap());
        assert!(std::path::Path::new(&config.database.sqlite.path).exists());
    }
}
