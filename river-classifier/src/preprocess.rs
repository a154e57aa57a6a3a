use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{codecs::jpeg::JpegDecoder, ImageDecoder, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::{ClassifierError, ClassifierOptions};

/// 输入张量的维度顺序，Keras导出的模型默认为NHWC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

/// 与推理框架无关的输入数据
#[derive(Debug, Clone)]
pub struct InputTensor {
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

/// 解码、纠正方向、缩放并归一化到[0, 1]
pub fn preprocess_bytes(
    input: &[u8],
    options: &ClassifierOptions,
) -> Result<InputTensor, ClassifierError> {
    let format =
        image::guess_format(input).map_err(|e| ClassifierError::InvalidImage(e.to_string()))?;
    let mut image =
        image::load_from_memory(input).map_err(|e| ClassifierError::InvalidImage(e.to_string()))?;

    if let Some(orientation) = read_orientation(input, format) {
        image.apply_orientation(orientation);
    }

    let side = options.input_size;
    let resized = image.resize_exact(side, side, FilterType::Nearest).to_rgb8();
    let side = side as usize;

    let mut data = vec![0.0f32; side * side * 3];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            let index = match options.layout {
                TensorLayout::Nhwc => (y * side + x) * 3 + channel,
                TensorLayout::Nchw => channel * side * side + y * side + x,
            };
            data[index] = value;
        }
    }

    let shape = match options.layout {
        TensorLayout::Nhwc => [1, side, side, 3],
        TensorLayout::Nchw => [1, 3, side, side],
    };

    Ok(InputTensor { shape, data })
}

fn read_orientation(bytes: &[u8], format: ImageFormat) -> Option<Orientation> {
    match format {
        ImageFormat::Jpeg => {
            let cursor = Cursor::new(bytes);
            let mut decoder = JpegDecoder::new(cursor).ok()?;
            decoder
                .orientation()
                .ok()
                .filter(|orientation| *orientation != Orientation::NoTransforms)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgb(color));
        let mut cursor = Cursor::new(Vec::new());
        buffer.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    /// 左半红、右半蓝的32x16 JPEG，可选写入EXIF方向
    fn split_jpeg(orientation: Option<u16>) -> Vec<u8> {
        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(32, 16, |x, _| {
            if x < 16 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut cursor = Cursor::new(Vec::new());
        buffer.write_to(&mut cursor, ImageFormat::Jpeg).unwrap();
        let encoded = cursor.into_inner();

        let Some(orientation) = orientation else {
            return encoded;
        };

        // APP1: "Exif\0\0" + 大端TIFF头 + 单条目IFD(0x0112 SHORT)
        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        app1.extend_from_slice(&[0x00, 0x01, 0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        app1.extend_from_slice(&orientation.to_be_bytes());
        app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(app1.len(), 2 + 0x22);

        let mut bytes = encoded[..2].to_vec();
        bytes.extend_from_slice(&app1);
        bytes.extend_from_slice(&encoded[2..]);
        bytes
    }

    fn red_at(tensor: &InputTensor, x: usize, y: usize) -> bool {
        let side = tensor.shape[1];
        let base = (y * side + x) * 3;
        tensor.data[base] > 0.5 && tensor.data[base + 2] < 0.5
    }

    #[test]
    fn test_jpeg_without_exif_keeps_layout() {
        let options = ClassifierOptions {
            input_size: 8,
            ..Default::default()
        };
        let tensor = preprocess_bytes(&split_jpeg(None), &options).unwrap();
        assert!(red_at(&tensor, 0, 7));
        assert!(!red_at(&tensor, 7, 0));
    }

    #[test]
    fn test_jpeg_exif_orientation_is_applied() {
        let options = ClassifierOptions {
            input_size: 8,
            ..Default::default()
        };
        // 6: 顺时针旋转90度，原左半部分转到上方
        let tensor = preprocess_bytes(&split_jpeg(Some(6)), &options).unwrap();
        assert!(red_at(&tensor, 7, 0));
        assert!(!red_at(&tensor, 0, 7));
    }

    #[test]
    fn test_nhwc_tensor_is_scaled() {
        let options = ClassifierOptions {
            input_size: 8,
            ..Default::default()
        };
        let tensor = preprocess_bytes(&png_bytes(20, 10, [255, 0, 51]), &options).unwrap();
        assert_eq!(tensor.shape, [1, 8, 8, 3]);
        assert_eq!(tensor.data.len(), 8 * 8 * 3);
        assert!((tensor.data[0] - 1.0).abs() < 1e-6);
        assert!(tensor.data[1].abs() < 1e-6);
        assert!((tensor.data[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_nchw_groups_channels() {
        let options = ClassifierOptions {
            input_size: 4,
            layout: TensorLayout::Nchw,
            ..Default::default()
        };
        let tensor = preprocess_bytes(&png_bytes(4, 4, [0, 255, 0]), &options).unwrap();
        assert_eq!(tensor.shape, [1, 3, 4, 4]);
        assert!(tensor.data[..16].iter().all(|v| *v == 0.0));
        assert!(tensor.data[16..32].iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = preprocess_bytes(b"definitely not an image", &ClassifierOptions::default())
            .unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidImage(_)));
    }
}
