use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::traits::{is_flat_key, Storage};

/// 本地文件系统存储实现
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(base_path: impl AsRef<Path>, base_url: &str) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        // 确保基础目录存在
        std::fs::create_dir_all(&base_path)
            .with_context(|| format!("Failed to create upload directory: {}", base_path.display()))?;

        Ok(Self {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 获取文件的完整路径
    fn get_full_path(&self, key: &str) -> Result<PathBuf> {
        if !is_flat_key(key) {
            bail!("非法的文件名: {}", key);
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.get_full_path(key)?;
        fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        tracing::debug!(
            event = crate::util::logging::events::STORAGE_PUT,
            backend = "local",
            key = %key,
            size = data.len()
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.get_full_path(key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read file")?,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.get_full_path(key)?;

        match fs::remove_file(&path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete file")?,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.get_full_path(key)?;
        fs::try_exists(&path)
            .await
            .context("Failed to check file existence")
    }

    async fn get_public_url(&self, key: &str) -> Result<String> {
        Ok(format!("{}/{}", self.base_url, key.trim_start_matches('/')))
    }

    async fn health_check(&self) -> Result<bool> {
        // 目录存在且可写
        if !fs::try_exists(&self.base_path).await.unwrap_or(false) {
            return Ok(false);
        }
        let probe = self.base_path.join(".health_check");
        let writable = fs::write(&probe, b"ok").await.is_ok();
        let _ = fs::remove_file(&probe).await;
        Ok(writable)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path(), "/uploads/").unwrap();

        let key = "20261019101010_river.png";
        let data = b"fake image bytes";

        storage.put(key, data).await.unwrap();
        assert!(storage.exists(key).await.unwrap());

        let retrieved = storage.get(key).await.unwrap().unwrap();
        assert_eq!(retrieved, data);

        let url = storage.get_public_url(key).await.unwrap();
        assert_eq!(url, "/uploads/20261019101010_river.png");

        storage.delete(key).await.unwrap();
        assert!(!storage.exists(key).await.unwrap());
        // 重复删除不报错
        storage.delete(key).await.unwrap();
        assert!(storage.get(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("uploads"), "/uploads").unwrap();

        assert!(storage.put("../escape.png", b"x").await.is_err());
        assert!(storage.get("nested/file.png").await.is_err());
        assert!(!temp_dir.path().join("escape.png").exists());
    }

    #[tokio::test]
    async fn test_health_check() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path(), "/uploads").unwrap();
        assert!(storage.health_check().await.unwrap());
        assert_eq!(storage.name(), "local");
    }
}
