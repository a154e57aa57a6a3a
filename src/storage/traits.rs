use anyhow::Result;
use async_trait::async_trait;

/// 存储操作trait
#[async_trait]
pub trait Storage: Send + Sync {
    /// 存储文件（覆盖同名文件）
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// 获取文件，不存在时返回None
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 删除文件，不存在时视为成功
    async fn delete(&self, key: &str) -> Result<()>;

    /// 检查文件是否存在
    async fn exists(&self, key: &str) -> Result<bool>;

    /// 获取文件的公开访问URL
    async fn get_public_url(&self, key: &str) -> Result<String>;

    /// 健康检查
    async fn health_check(&self) -> Result<bool>;

    /// 后端名称，用于日志与健康检查
    fn name(&self) -> &'static str;
}

/// 照片以单层文件名保存，不允许目录分隔符和 `..`
pub fn is_flat_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('/') && !key.contains('\\') && !key.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_keys() {
        assert!(is_flat_key("20261019101010_river.jpg"));
        assert!(!is_flat_key(""));
        assert!(!is_flat_key("../secret"));
        assert!(!is_flat_key("a/b.jpg"));
        assert!(!is_flat_key("a\\b.jpg"));
        assert!(!is_flat_key(".."));
    }
}
