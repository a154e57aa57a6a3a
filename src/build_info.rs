//! 编译期注入的版本信息，见 build.rs

pub const BUILD_VERSION: &str = env!("APP_BUILD_VERSION");
pub const BUILD_COMMIT: &str = env!("APP_BUILD_COMMIT");
pub const BUILD_TIMESTAMP: &str = env!("APP_BUILD_TIMESTAMP");

/// 健康检查中展示的版本串
pub fn summary() -> String {
    format!(
        "riverclean-server {} (build {}, commit {}, built at {})",
        env!("CARGO_PKG_VERSION"),
        BUILD_VERSION,
        BUILD_COMMIT,
        BUILD_TIMESTAMP
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_contains_package_version() {
        assert!(summary().contains(env!("CARGO_PKG_VERSION")));
    }
}
