//! SQLite数据库表结构定义
//! 包含所有表的CREATE语句和索引定义

use anyhow::Result;
use sqlx::SqlitePool;

/// 数据库表结构管理器
pub struct SchemaManager;

impl SchemaManager {
    /// 创建所有表结构
    pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
        Self::create_users_table(pool).await?;
        Self::create_reports_table(pool).await?;
        Ok(())
    }

    async fn create_users_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                points INTEGER DEFAULT 0,
                is_admin BOOLEAN DEFAULT 0
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn create_reports_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                filename TEXT NOT NULL,
                category TEXT NOT NULL,
                location TEXT,
                status TEXT DEFAULT 'Pending',
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_user_id ON reports(user_id)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_category ON reports(category)")
            .execute(pool)
            .await?;
        Ok(())
    }
}
