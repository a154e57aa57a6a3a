use crate::util::config::{LevelConfig, LoggingConfig};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter::EnvFilter, Layer, Registry};

/// 访问日志使用的target
pub const ACCESS_TARGET: &str = "http.server";

static ACCESS_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// 根据配置初始化日志：控制台 + 按天滚动的 `<prefix>-info` 与 `<prefix>-access` 文件
pub fn log_init_with_config(
    file_prefix: &str,
    config: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level_filter = parse_level(&config.level);
    let filter_expression = build_env_filter_expression(level_filter, config.level_config.as_ref());
    let use_json = config.structured.unwrap_or(false);

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(use_json, io::stdout, false)
        .with_filter(env_filter(&filter_expression, level_filter))
        .boxed()];

    let mut main_guard = None;
    let mut log_dir_display = None;

    if config.file.enabled {
        let log_dir = resolve_log_dir(&config.file.directory);
        std::fs::create_dir_all(&log_dir)?;

        let main_filter_expr = format!("{},{}=off", filter_expression, ACCESS_TARGET);
        let access_filter_expr = format!("{}={}", ACCESS_TARGET, level_filter_to_str(level_filter));

        let (info_writer, guard) =
            tracing_appender::non_blocking(daily(&log_dir, format!("{}-info", file_prefix)));
        let (access_writer, access_guard) =
            tracing_appender::non_blocking(daily(&log_dir, format!("{}-access", file_prefix)));
        let _ = ACCESS_GUARD.set(access_guard);

        layers.push(
            fmt_layer(use_json, info_writer, true)
                .with_filter(env_filter(&main_filter_expr, level_filter))
                .boxed(),
        );
        layers.push(
            fmt_layer(use_json, access_writer, true)
                .with_filter(env_filter(&access_filter_expr, LevelFilter::INFO))
                .boxed(),
        );

        main_guard = Some(guard);
        log_dir_display = Some(log_dir.display().to_string());
    }

    Registry::default().with(layers).try_init()?;

    tracing::info!(
        event = "log.init",
        level = %config.level,
        console = true,
        file = config.file.enabled,
        directory = log_dir_display.as_deref().unwrap_or("-"),
        rotation = "daily",
        structured = use_json,
        access_file = format!("{}-access", file_prefix)
    );
    if let (true, Some(retention)) = (config.file.enabled, config.file.retention_days) {
        tracing::info!(event = "log.retention", days = retention);
    }

    Ok(main_guard)
}

fn fmt_layer<W>(json: bool, writer: W, file: bool) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        layer()
            .json()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    } else {
        layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_ansi(!file)
            .with_writer(writer)
            .boxed()
    }
}

fn env_filter(expression: &str, fallback: LevelFilter) -> EnvFilter {
    EnvFilter::try_new(expression).unwrap_or_else(|_| EnvFilter::new(level_filter_to_str(fallback)))
}

/// 相对路径基于工作目录解析；在bin目录下运行时回退到上级目录
fn resolve_log_dir(directory: &str) -> PathBuf {
    let path = Path::new(directory);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if current_dir.file_name() == Some(std::ffi::OsStr::new("bin")) {
        if let Some(parent) = current_dir.parent() {
            return parent.join(directory);
        }
    }
    current_dir.join(directory)
}

/// 删除超过保留天数的日志文件
pub fn cleanup_old_logs(log_dir: &Path, file_prefix: &str, retention_days: u32) -> anyhow::Result<usize> {
    if !log_dir.exists() {
        tracing::debug!("日志目录不存在: {}", log_dir.display());
        return Ok(0);
    }

    let retention = Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut deleted_count = 0usize;
    let mut total_size_deleted = 0u64;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        // 只处理本服务生成的日志
        if !file_name.starts_with(file_prefix) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .or_else(|_| metadata.created())
            .unwrap_or_else(|_| SystemTime::now());
        if modified >= cutoff {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                deleted_count += 1;
                total_size_deleted += metadata.len();
                tracing::debug!("已删除过期日志: {}", path.display());
            }
            Err(e) => tracing::warn!("删除日志文件失败: {} - {}", path.display(), e),
        }
    }

    if deleted_count > 0 {
        tracing::info!(
            "已清理 {} 个过期日志文件，释放空间 {:.2} MB",
            deleted_count,
            total_size_deleted as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(deleted_count)
}

fn build_env_filter_expression(
    default_level: LevelFilter,
    level_config: Option<&LevelConfig>,
) -> String {
    let mut directives = vec![
        level_filter_to_str(default_level).to_string(),
        // 第三方库默认只保留警告
        "sqlx=warn".to_string(),
        "tract_core=warn".to_string(),
        "tract_onnx=warn".to_string(),
        "opendal=warn".to_string(),
    ];

    if let Some(cfg) = level_config {
        if let Some(level) = cfg.api.as_deref().and_then(normalize_level_str) {
            directives.push(format!("riverclean_server::api={level}"));
            directives.push(format!("api={level}"));
        }
        if let Some(level) = cfg.system.as_deref().and_then(normalize_level_str) {
            directives.push(format!("riverclean_server::server={level}"));
            directives.push(format!("riverclean_server::storage={level}"));
            directives.push(format!("riverclean_server::db={level}"));
            directives.push(format!("system={level}"));
            directives.push(format!("storage={level}"));
            directives.push(format!("server.http={level}"));
        }
        if let Some(level) = cfg.security.as_deref().and_then(normalize_level_str) {
            directives.push(format!("riverclean_server::api::auth={level}"));
            directives.push(format!("security={level}"));
        }

        for (target, level_str) in &cfg.overrides {
            if let Some(level) = normalize_level_str(level_str) {
                directives.push(format!("{}={level}", normalize_directive_target(target)));
            }
        }
    }

    directives.join(",")
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn normalize_level_str(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

fn level_filter_to_str(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::OFF => "off",
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
    }
}

fn normalize_directive_target(target: &str) -> String {
    if let Some(raw) = target.strip_prefix("target:") {
        raw.to_string()
    } else if target.contains("::") {
        target.to_string()
    } else {
        format!("riverclean_server::{}", target.replace('.', "::"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_expression_with_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("storage.local".to_string(), "trace".to_string());
        overrides.insert("target:tower_sessions".to_string(), "debug".to_string());
        let cfg = LevelConfig {
            api: Some("DEBUG".to_string()),
            system: None,
            security: Some("bogus".to_string()),
            overrides,
        };

        let expr = build_env_filter_expression(LevelFilter::INFO, Some(&cfg));
        assert!(expr.starts_with("info,"));
        assert!(expr.contains("riverclean_server::api=debug"));
        assert!(expr.contains(",api=debug"));
        assert!(expr.contains("riverclean_server::storage::local=trace"));
        assert!(expr.contains("tower_sessions=debug"));
        assert!(!expr.contains("security="));
    }

    #[test]
    fn test_cleanup_keeps_fresh_logs() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("riverclean-info.2026-10-19"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let deleted = cleanup_old_logs(dir.path(), "riverclean", 7).unwrap();
        assert_eq!(deleted, 0);
        assert!(dir.path().join("riverclean-info.2026-10-19").exists());
    }

    #[test]
    fn test_cleanup_only_removes_own_stale_logs() {
        let dir = tempfile::TempDir::new().unwrap();
        let stale = SystemTime::now() - Duration::from_secs(30 * 24 * 60 * 60);
        for name in ["riverclean-access.2026-09-01", "other-service.log"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "x").unwrap();
            std::fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(stale)
                .unwrap();
        }

        let deleted = cleanup_old_logs(dir.path(), "riverclean", 7).unwrap();
        assert_eq!(deleted, 1);
        assert!(!dir.path().join("riverclean-access.2026-09-01").exists());
        assert!(dir.path().join("other-service.log").exists());
    }
}
