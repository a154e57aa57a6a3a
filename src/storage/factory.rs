use anyhow::{anyhow, bail, Result};

use super::local::LocalStorage;
use super::oss::OssStorage;
use super::traits::Storage;
use crate::util::config::StorageSettings;

/// 创建存储实例
pub async fn create_storage(config: &StorageSettings) -> Result<Box<dyn Storage>> {
    match config.storage_type.as_str() {
        "local" => {
            let storage = LocalStorage::new(&config.local.base_path, &config.local.base_url)?;
            tracing::info!("Local storage initialized at: {}", config.local.base_path);
            Ok(Box::new(storage))
        }
        "oss" => {
            let oss_config = config
                .oss
                .as_ref()
                .ok_or_else(|| anyhow!("OSS configuration missing"))?;
            let storage = OssStorage::new(oss_config)?;
            tracing::info!("OSS storage initialized for bucket: {}", oss_config.bucket);
            Ok(Box::new(storage))
        }
        other => bail!("Unsupported storage type: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_local_storage() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = StorageSettings::default();
        config.local.base_path = dir.path().join("uploads").to_string_lossy().to_string();

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.name(), "local");
        assert!(dir.path().join("uploads").is_dir());
    }

    #[tokio::test]
    async fn test_oss_without_config_fails() {
        let config = StorageSettings {
            storage_type: "oss".to_string(),
            ..StorageSettings::default()
        };
        assert!(create_storage(&config).await.is_err());
    }
}
