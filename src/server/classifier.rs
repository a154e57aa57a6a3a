//! 分类模型初始化模块

use crate::util::config::Config;
use anyhow::{Context, Result};
use river_classifier::{Classifier, OnnxClassifier};
use std::sync::Arc;
use tracing::info;

/// 分类模型初始化器
pub struct ClassifierInitializer;

impl ClassifierInitializer {
    /// 在阻塞线程中加载并优化模型
    pub async fn load_from_config(config: &Config) -> Result<Arc<dyn Classifier>> {
        let model_path = config.classifier.model_path.clone();
        let options = config.classifier.options();
        info!(
            target: "system",
            model_path = %model_path,
            input_size = options.input_size,
            "[brain] 加载分类模型..."
        );

        let classifier = tokio::task::spawn_blocking(move || OnnxClassifier::load(&model_path, options))
            .await
            .context("模型加载任务异常退出")?
            .with_context(|| format!("加载分类模型失败: {}", config.classifier.model_path))?;

        info!(target: "system", model = classifier.name(), "[ok] 分类模型就绪");
        Ok(Arc::new(classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_model_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.classifier.model_path = dir.path().join("absent.onnx").to_string_lossy().to_string();

        let err = ClassifierInitializer::load_from_config(&config).await.err().unwrap();
        assert!(format!("{:#}", err).contains("absent.onnx"));
    }
}
