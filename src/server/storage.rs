//! 存储系统初始化模块
//! 负责根据配置创建照片存储并做一次读写探测

use crate::storage;
use crate::util::config::Config;
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// 存储系统初始化器
pub struct StorageInitializer;

impl StorageInitializer {
    /// 根据配置创建存储实例
    pub async fn create_from_config(config: &Config) -> Result<Arc<dyn storage::Storage>> {
        info!(
            target: "system",
            storage_type = %config.storage.storage_type,
            "[storage] 初始化存储系统..."
        );

        let storage: Arc<dyn storage::Storage> = Arc::from(
            storage::create_storage(&config.storage)
                .await
                .context("创建存储后端失败")?,
        );

        info!(target: "system", backend = storage.name(), "[ok] 存储系统初始化完成");
        Ok(storage)
    }

    /// 验证存储系统连接
    pub async fn validate_connection(storage: &Arc<dyn storage::Storage>) -> Result<()> {
        match storage.health_check().await {
            Ok(true) => {
                info!(target: "system", backend = storage.name(), "[ok] 存储系统连接验证成功");
                Ok(())
            }
            Ok(false) => bail!("{} 存储读写探测失败", storage.name()),
            Err(e) => {
                warn!(target: "system", backend = storage.name(), error = %e, "存储系统连接验证失败");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_config;

    #[tokio::test]
    async fn test_local_storage_is_validated() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = test_config(&dir);

        let storage = StorageInitializer::create_from_config(&config).await.unwrap();
        assert_eq!(storage.name(), "local");
        StorageInitializer::validate_connection(&storage).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_storage_type_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.storage.storage_type = "ftp".to_string();

        assert!(StorageInitializer::create_from_config(&config).await.is_err());
    }
}
