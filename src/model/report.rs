use chrono::NaiveDateTime;
use river_classifier::Category;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 报告处理状态，数据库中以 `Pending` / `Done` 存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    Done,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Done => "Done",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ReportStatus::Pending),
            "Done" => Ok(ReportStatus::Done),
            other => Err(anyhow::anyhow!("未知的报告状态: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub user_id: i64,
    pub filename: String,
    pub category: Category,
    pub location: Option<String>,
    pub status: ReportStatus,
    pub timestamp: NaiveDateTime,
}

/// 管理员视图：附带上报人用户名
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollutedReport {
    #[serde(flatten)]
    pub report: Report,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_id: i64,
    pub filename: String,
    pub category: Category,
    pub location: String,
}

/// 写入结果：是否发放了积分
#[derive(Debug, Clone)]
pub struct RecordedReport {
    pub report: Report,
    pub points_awarded: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    pub total_users: i64,
    pub total_reports: i64,
    pub clean_reports: i64,
    pub polluted_reports: i64,
    pub pending_polluted: i64,
    pub resolved_polluted: i64,
}

/// `POST /detect` 的成功响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub category: Category,
    pub location: String,
    pub authorities_notified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("Done".parse::<ReportStatus>().unwrap(), ReportStatus::Done);
        assert!("done".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn test_polluted_report_flattens() {
        let report = PollutedReport {
            report: Report {
                id: 7,
                user_id: 2,
                filename: "20261019101010_river.jpg".to_string(),
                category: Category::Polluted,
                location: Some("Bridge".to_string()),
                status: ReportStatus::Pending,
                timestamp: NaiveDateTime::parse_from_str("2026-10-19 10:10:10", "%Y-%m-%d %H:%M:%S")
                    .unwrap(),
            },
            username: "bob".to_string(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["category"], "Polluted");
        assert_eq!(value["status"], "Pending");
        assert_eq!(value["username"], "bob");
    }
}
