use anyhow::{bail, Result};
use tracing::info;

use super::sqlite::SqliteDatabase;
use super::traits::Database;
use crate::util::config::DatabaseConfig;

/// 根据配置创建并初始化数据库
pub async fn create_database(config: &DatabaseConfig) -> Result<Box<dyn Database>> {
    match config.database_type.as_str() {
        "sqlite" => {
            info!("[card] 连接SQLite数据库: {}", config.sqlite.path);
            let db = SqliteDatabase::new(&config.sqlite.path, config.sqlite.max_connections).await?;
            db.initialize().await?;
            info!("[ok] SQLite数据库连接和初始化成功");
            Ok(Box::new(db))
        }
        other => bail!("不支持的数据库类型: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::SqliteConfig;

    #[tokio::test]
    async fn test_create_sqlite_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DatabaseConfig {
            database_type: "sqlite".to_string(),
            sqlite: SqliteConfig {
                path: dir.path().join("nested/river.db").to_string_lossy().to_string(),
                max_connections: 2,
            },
        };

        let db = create_database(&config).await.unwrap();
        assert!(db.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_database_type() {
        let config = DatabaseConfig {
            database_type: "dm".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(create_database(&config).await.is_err());
    }
}
