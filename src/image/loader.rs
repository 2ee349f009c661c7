use crate::utils::error::ClsError;
use crate::Result;
use image::{DynamicImage, GenericImageView, ImageFormat};
use ndarray::Array3;
use std::path::Path;

/// 单张图像的最大字节数
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从字节加载图像
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ClsError::InvalidInput(format!(
                "image too large: {} bytes, max allowed: {} bytes",
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }

        match Self::detect_format(bytes) {
            Some(format) if !Self::is_supported_format(format) => {
                return Err(ClsError::InvalidInput(format!(
                    "unsupported image format: {:?}",
                    format
                )));
            }
            _ => {}
        }

        Ok(image::load_from_memory(bytes)?)
    }

    /// 从文件路径加载图像
    pub fn from_path(path: impl AsRef<Path>) -> Result<DynamicImage> {
        let path = path.as_ref();
        tracing::debug!("Loading image from: {}", path.display());
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Tiff | ImageFormat::WebP
        )
    }

    /// 转换DynamicImage为ndarray::Array3<f32> (HWC格式, [0, 255])
    pub fn to_array3(image: &DynamicImage) -> Result<Array3<f32>> {
        let rgb_image = image.to_rgb8();
        let (width, height) = rgb_image.dimensions();
        let raw_data = rgb_image.into_raw();

        Self::array_from_rgb_raw(width as usize, height as usize, raw_data)
    }

    /// 交错的RGB字节 -> HWC数组，长度必须为 width * height * 3
    fn array_from_rgb_raw(width: usize, height: usize, raw_data: Vec<u8>) -> Result<Array3<f32>> {
        let len = raw_data.len();
        Array3::from_shape_vec(
            (height, width, 3),
            raw_data.into_iter().map(f32::from).collect(),
        )
        .map_err(|e| {
            ClsError::ImageProcessing(format!(
                "{} RGB bytes do not fit a {}x{} image: {}",
                len, width, height, e
            ))
        })
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClsError::InvalidInput(format!(
                "image has no pixels: {}x{}",
                width, height
            )));
        }

        if width > 16384 || height > 16384 {
            return Err(ClsError::InvalidInput(format!(
                "image too large: {}x{}, maximum 16384x16384",
                width, height
            )));
        }

        Ok(())
    }

    /// 加载并转换为RGB数组
    pub fn load_rgb(path: impl AsRef<Path>) -> Result<Array3<f32>> {
        let image = Self::from_path(path)?;
        Self::validate_dimensions(&image)?;
        Self::to_array3(&image)
    }
}
