pub mod model;
pub mod preprocess;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use model::OnnxClassifier;
pub use preprocess::{preprocess_bytes, InputTensor, TensorLayout};

/// 河流图片分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Clean,
    Polluted,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clean => "Clean",
            Category::Polluted => "Polluted",
        }
    }

    pub fn is_polluted(&self) -> bool {
        matches!(self, Category::Polluted)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Clean" | "clean" => Ok(Category::Clean),
            "Polluted" | "polluted" => Ok(Category::Polluted),
            other => Err(ClassifierError::UnknownLabel(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("模型加载失败: {0}")]
    ModelLoad(String),
    #[error("图片无法解码: {0}")]
    InvalidImage(String),
    #[error("推理失败: {0}")]
    Inference(String),
    #[error("模型输出长度{actual}与标签数量{expected}不一致")]
    OutputShape { expected: usize, actual: usize },
    #[error("未知分类标签: {0}")]
    UnknownLabel(String),
    #[error("模型输出为空")]
    EmptyOutput,
}

/// 单次预测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub category: Category,
    pub confidence: f32,
    pub scores: Vec<f32>,
}

impl Prediction {
    /// 按标签顺序从模型原始输出构建预测结果
    pub fn from_scores(scores: Vec<f32>, labels: &[Category]) -> Result<Self, ClassifierError> {
        if scores.len() != labels.len() {
            return Err(ClassifierError::OutputShape {
                expected: labels.len(),
                actual: scores.len(),
            });
        }
        let index = argmax(&scores)?;
        let probabilities = normalize_scores(&scores);
        Ok(Self {
            category: labels[index],
            confidence: probabilities[index],
            scores,
        })
    }
}

/// 预处理参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierOptions {
    pub input_size: u32,
    pub layout: TensorLayout,
    pub labels: Vec<Category>,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            input_size: 224,
            layout: TensorLayout::Nhwc,
            labels: vec![Category::Clean, Category::Polluted],
        }
    }
}

/// 分类器抽象，HTTP层只依赖该trait
pub trait Classifier: Send + Sync {
    fn classify(&self, image_bytes: &[u8]) -> Result<Prediction, ClassifierError>;

    fn name(&self) -> &str;
}

/// 最大值下标，并列时取第一个
pub fn argmax(scores: &[f32]) -> Result<usize, ClassifierError> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
        .ok_or(ClassifierError::EmptyOutput)
}

/// 输出已经是概率分布时原样返回，否则做softmax
fn normalize_scores(scores: &[f32]) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let looks_like_probabilities =
        scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    if looks_like_probabilities {
        return scores.to_vec();
    }

    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
