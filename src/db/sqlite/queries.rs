//! SQLite数据库查询操作
//! 包含所有数据库查询和操作的实现

use anyhow::{bail, Result};
use river_classifier::Category;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::model::{
    CreateUserOutcome, NewReport, PollutedReport, RecordedReport, Report, ReportStats,
    ReportStatus, User,
};

const REPORT_COLUMNS: &str = "id, user_id, filename, category, location, status, timestamp";

/// 用户查询操作
pub struct UserQueries;

impl UserQueries {
    pub async fn insert(
        pool: &SqlitePool,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<CreateUserOutcome> {
        let result = sqlx::query("INSERT INTO users (username, password, is_admin) VALUES (?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(is_admin)
            .execute(pool)
            .await;

        match result {
            Ok(done) => Ok(CreateUserOutcome::Created(User {
                id: done.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                points: 0,
                is_admin,
            })),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(CreateUserOutcome::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password, points, is_admin FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
        let row =
            sqlx::query("SELECT id, username, password, points, is_admin FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    pub async fn set_admin(pool: &SqlitePool, username: &str, is_admin: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_admin = ? WHERE username = ?")
            .bind(is_admin)
            .bind(username)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn map_row(row: &SqliteRow) -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password")?,
            points: row.try_get::<Option<i64>, _>("points")?.unwrap_or(0),
            is_admin: row.try_get::<Option<bool>, _>("is_admin")?.unwrap_or(false),
        })
    }
}

/// 报告查询操作
pub struct ReportQueries;

impl ReportQueries {
    pub async fn record(
        pool: &SqlitePool,
        report: &NewReport,
        reward_points: i64,
    ) -> Result<RecordedReport> {
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO reports (user_id, filename, category, location, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(report.user_id)
        .bind(&report.filename)
        .bind(report.category.as_str())
        .bind(&report.location)
        .bind(ReportStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;
        let report_id = inserted.last_insert_rowid();

        let points_awarded = if report.category.is_polluted() && reward_points > 0 {
            let updated = sqlx::query("UPDATE users SET points = COALESCE(points, 0) + ? WHERE id = ?")
                .bind(reward_points)
                .bind(report.user_id)
                .execute(&mut *tx)
                .await?;
            if updated.rows_affected() == 0 {
                // 事务随tx drop回滚
                bail!("用户不存在: {}", report.user_id);
            }
            reward_points
        } else {
            0
        };

        let row = sqlx::query(&format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS))
            .bind(report_id)
            .fetch_one(&mut *tx)
            .await?;
        let stored = Self::map_row(&row)?;

        tx.commit().await?;

        Ok(RecordedReport {
            report: stored,
            points_awarded,
        })
    }

    pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Report>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reports WHERE user_id = ? ORDER BY timestamp DESC, id DESC",
            REPORT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    pub async fn list_polluted(pool: &SqlitePool) -> Result<Vec<PollutedReport>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.user_id, r.filename, r.category, r.location, r.status, r.timestamp,
                   u.username
            FROM reports r
            JOIN users u ON r.user_id = u.id
            WHERE r.category = ?
            ORDER BY r.timestamp DESC, r.id DESC
            "#,
        )
        .bind(Category::Polluted.as_str())
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PollutedReport {
                    report: Self::map_row(row)?,
                    username: row.try_get("username")?,
                })
            })
            .collect()
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Report>> {
        let row = sqlx::query(&format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    pub async fn mark_resolved(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE reports SET status = ? WHERE id = ?")
            .bind(ReportStatus::Done.as_str())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn stats(pool: &SqlitePool) -> Result<ReportStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                COUNT(*) AS total_reports,
                COALESCE(SUM(CASE WHEN category = 'Clean' THEN 1 ELSE 0 END), 0) AS clean_reports,
                COALESCE(SUM(CASE WHEN category = 'Polluted' THEN 1 ELSE 0 END), 0) AS polluted_reports,
                COALESCE(SUM(CASE WHEN category = 'Polluted' AND status = 'Pending' THEN 1 ELSE 0 END), 0) AS pending_polluted,
                COALESCE(SUM(CASE WHEN category = 'Polluted' AND status = 'Done' THEN 1 ELSE 0 END), 0) AS resolved_polluted
            FROM reports
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(ReportStats {
            total_users: row.try_get("total_users")?,
            total_reports: row.try_get("total_reports")?,
            clean_reports: row.try_get("clean_reports")?,
            polluted_reports: row.try_get("polluted_reports")?,
            pending_polluted: row.try_get("pending_polluted")?,
            resolved_polluted: row.try_get("resolved_polluted")?,
        })
    }

    fn map_row(row: &SqliteRow) -> Result<Report> {
        let category: String = row.try_get("category")?;
        let status: Option<String> = row.try_get("status")?;
        Ok(Report {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            filename: row.try_get("filename")?,
            category: category.parse::<Category>()?,
            location: row.try_get("location")?,
            status: match status {
                Some(s) => s.parse()?,
                None => ReportStatus::Pending,
            },
            timestamp: row.try_get("timestamp")?,
        })
    }
}

/// 健康检查查询
pub struct HealthQueries;

impl HealthQueries {
    pub async fn ping(pool: &SqlitePool) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS ok").fetch_one(pool).await?;
        let ok: i64 = row.try_get("ok")?;
        Ok(ok == 1)
    }
}
