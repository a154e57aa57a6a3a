use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use opendal::{services::Oss as OssService, Operator};
use std::time::Instant;
use tracing::{debug, error, info};

use super::traits::{is_flat_key, Storage};
use crate::util::config::OssConfig;
use crate::util::logging::events;

/// 阿里云OSS存储实现
pub struct OssStorage {
    operator: Operator,
    bucket: String,
    public_endpoint: Option<String>,
}

impl OssStorage {
    pub fn new(config: &OssConfig) -> Result<Self> {
        info!(
            "[tool] 配置OSS服务: endpoint={}, bucket={}",
            config.endpoint, config.bucket
        );

        let builder = OssService::default()
            .root(config.root.as_deref().unwrap_or_default())
            .bucket(&config.bucket)
            .endpoint(&config.endpoint)
            .access_key_id(&config.access_key_id)
            .access_key_secret(&config.access_key_secret);

        let operator = Operator::new(builder)
            .context("Failed to build OSS operator")?
            .finish();

        Ok(Self {
            operator,
            bucket: config.bucket.clone(),
            public_endpoint: config.public_endpoint.clone(),
        })
    }

    fn check_key(key: &str) -> Result<()> {
        if !is_flat_key(key) {
            bail!("非法的文件名: {}", key);
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for OssStorage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        Self::check_key(key)?;
        let start = Instant::now();

        match self.operator.write(key, data.to_vec()).await {
            Ok(_) => {
                info!(
                    event = events::STORAGE_PUT,
                    backend = "oss",
                    key = %key,
                    size = data.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    event = events::STORAGE_ERROR,
                    op = "write",
                    key = %key,
                    kind = ?e.kind(),
                    error = %e
                );
                Err(e).context("Failed to write to OSS")
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Self::check_key(key)?;
        match self.operator.read(key).await {
            Ok(data) => Ok(Some(data.to_vec())),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => {
                debug!("[download] OSS读取: key不存在: {}", key);
                Ok(None)
            }
            Err(e) => {
                error!(
                    event = events::STORAGE_ERROR,
                    op = "read",
                    key = %key,
                    kind = ?e.kind(),
                    error = %e
                );
                Err(e).context("Failed to read from OSS")
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        match self.operator.delete(key).await {
            Ok(_) => {
                info!(event = events::STORAGE_DELETE, backend = "oss", key = %key);
                Ok(())
            }
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete from OSS"),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Self::check_key(key)?;
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("Failed to check existence in OSS"),
        }
    }

    async fn get_public_url(&self, key: &str) -> Result<String> {
        if let Some(endpoint) = &self.public_endpoint {
            Ok(format!(
                "{}/{}",
                endpoint.trim_end_matches('/'),
                key.trim_start_matches('/')
            ))
        } else {
            Ok(format!(
                "https://{}.oss.aliyuncs.com/{}",
                self.bucket,
                key.trim_start_matches('/')
            ))
        }
    }

    async fn health_check(&self) -> Result<bool> {
        match self.operator.check().await {
            Ok(()) => Ok(true),
            Err(e) => {
                error!("[fail] OSS健康检查失败: kind={:?}, error={}", e.kind(), e);
                Ok(false)
            }
        }
    }

    fn name(&self) -> &'static str {
        "oss"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(public_endpoint: Option<&str>) -> OssConfig {
        OssConfig {
            bucket: "river-photos".to_string(),
            endpoint: "https://oss-cn-hangzhou.aliyuncs.com".to_string(),
            access_key_id: "id".to_string(),
            access_key_secret: "secret".to_string(),
            root: Some("/reports".to_string()),
            public_endpoint: public_endpoint.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_public_url() {
        let storage = OssStorage::new(&config(Some("https://cdn.example.com/"))).unwrap();
        assert_eq!(
            storage.get_public_url("a.jpg").await.unwrap(),
            "https://cdn.example.com/a.jpg"
        );

        let storage = OssStorage::new(&config(None)).unwrap();
        assert_eq!(
            storage.get_public_url("a.jpg").await.unwrap(),
            "https://river-photos.oss.aliyuncs.com/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_rejects_nested_keys() {
        let storage = OssStorage::new(&config(None)).unwrap();
        assert!(storage.put("../a.jpg", b"x").await.is_err());
    }
}
