//! 密码哈希（bcrypt），计算放在阻塞线程池中执行

use anyhow::{Context, Result};

pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("密码哈希任务异常退出")?
        .context("密码哈希失败")
}

/// 存储的哈希格式不合法时视为校验失败
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .context("密码校验任务异常退出")?;

    match result {
        Ok(matched) => Ok(matched),
        Err(e) => {
            tracing::warn!(target: "security", error = %e, "存储的密码哈希无法解析");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("river-secret", 4).await.unwrap();
        assert_ne!(hash, "river-secret");
        assert!(verify_password("river-secret", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_rejected() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash").await.unwrap());
    }
}
