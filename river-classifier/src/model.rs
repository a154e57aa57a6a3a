use std::path::{Path, PathBuf};
use std::time::Instant;

use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::preprocess::preprocess_bytes;
use crate::{Classifier, ClassifierError, ClassifierOptions, Prediction};

type RunnableOnnx = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// 基于tract的ONNX模型封装
pub struct OnnxClassifier {
    plan: RunnableOnnx,
    options: ClassifierOptions,
    name: String,
}

impl OnnxClassifier {
    /// 加载并优化模型，输入形状固定为配置中的尺寸
    pub fn load(path: impl AsRef<Path>, options: ClassifierOptions) -> Result<Self, ClassifierError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "模型文件不存在: {}",
                path.display()
            )));
        }

        let started = Instant::now();
        let side = options.input_size as usize;
        let input_shape: [usize; 4] = match options.layout {
            crate::TensorLayout::Nhwc => [1, side, side, 3],
            crate::TensorLayout::Nchw => [1, 3, side, side],
        };

        let plan = tract_onnx::onnx()
            .model_for_path(&path)
            .and_then(|model| model.with_input_fact(0, f32::fact(input_shape).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| ClassifierError::ModelLoad(format!("{}: {:#}", path.display(), e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx-model".to_string());

        info!(
            target: "classifier",
            event = "classifier.model.loaded",
            model = %name,
            input = ?input_shape,
            labels = ?options.labels,
            elapsed_ms = started.elapsed().as_millis() as u64
        );

        Ok(Self {
            plan,
            options,
            name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, image_bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        let started = Instant::now();
        let input = preprocess_bytes(image_bytes, &self.options)?;
        let tensor = Tensor::from_shape(&input.shape, &input.data)
            .map_err(|e| ClassifierError::Inference(format!("{:#}", e)))?;

        // TValue不是Send，输出在同步块内转成Vec
        let scores: Vec<f32> = {
            let outputs = self
                .plan
                .run(tvec!(tensor.into()))
                .map_err(|e| ClassifierError::Inference(format!("{:#}", e)))?;
            let first = outputs.first().ok_or(ClassifierError::EmptyOutput)?;
            let view = first
                .to_array_view::<f32>()
                .map_err(|e| ClassifierError::Inference(format!("{:#}", e)))?;
            view.iter().copied().collect()
        };

        let prediction = Prediction::from_scores(scores, &self.options.labels)?;

        debug!(
            target: "classifier",
            event = "classifier.predict",
            category = %prediction.category,
            confidence = prediction.confidence,
            elapsed_ms = started.elapsed().as_millis() as u64
        );

        Ok(prediction)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    /// 输入8x8 RGB，输出R、G两个通道的均值
    fn channel_mean_model() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/channel_mean_rg.onnx")
    }

    fn small_options() -> ClassifierOptions {
        ClassifierOptions {
            input_size: 8,
            ..Default::default()
        }
    }

    fn png_bytes(color: [u8; 3]) -> Vec<u8> {
        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(16, 12, Rgb(color));
        let mut cursor = Cursor::new(Vec::new());
        buffer.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_classify_maps_output_to_labels() {
        let classifier = OnnxClassifier::load(channel_mean_model(), small_options()).unwrap();
        assert_eq!(classifier.name(), "channel_mean_rg.onnx");

        let clean = classifier.classify(&png_bytes([255, 0, 0])).unwrap();
        assert_eq!(clean.category, Category::Clean);
        assert_eq!(clean.scores.len(), 2);
        assert!((clean.scores[0] - 1.0).abs() < 1e-5);
        assert!(clean.scores[1].abs() < 1e-5);

        let polluted = classifier.classify(&png_bytes([0, 255, 0])).unwrap();
        assert_eq!(polluted.category, Category::Polluted);
        assert!(polluted.confidence > 0.5);
    }

    #[test]
    fn test_classify_rejects_bad_input() {
        let classifier = OnnxClassifier::load(channel_mean_model(), small_options()).unwrap();
        let err = classifier.classify(b"not an image").unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidImage(_)));
    }

    #[test]
    fn test_output_must_match_label_count() {
        let options = ClassifierOptions {
            labels: vec![Category::Clean, Category::Polluted, Category::Polluted],
            ..small_options()
        };
        let classifier = OnnxClassifier::load(channel_mean_model(), options).unwrap();
        match classifier.classify(&png_bytes([10, 20, 30])) {
            Err(ClassifierError::OutputShape { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected output shape error, got {:?}", other.map(|p| p.category)),
        }
    }

    #[test]
    fn test_missing_model_file_is_reported() {
        let result = OnnxClassifier::load(
            "/nonexistent/river/model.onnx",
            ClassifierOptions::default(),
        );
        match result {
            Err(ClassifierError::ModelLoad(msg)) => assert!(msg.contains("model.onnx")),
            _ => panic!("expected model load error"),
        }
    }
}
