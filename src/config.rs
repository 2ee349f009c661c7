use crate::utils::error::ClsError;
use crate::Result;
use serde::{Deserialize, Serialize};

/// 逐通道标准化参数（RGB顺序）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl NormalizationConfig {
    /// ImageNet 统计量
    pub const fn imagenet() -> Self {
        Self {
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (i, &s) in self.std.iter().enumerate() {
            if !(s > 0.0) || !s.is_finite() {
                return Err(ClsError::Config(format!(
                    "std at channel {} must be a positive finite number, got {}",
                    i, s
                )));
            }
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ClsError::Config("mean values must be finite".to_string()));
        }
        Ok(())
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self::imagenet()
    }
}

/// 颜色抖动强度，因子从 [1 - x, 1 + x] 中均匀采样
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorJitterConfig {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl Default for ColorJitterConfig {
    fn default() -> Self {
        Self {
            brightness: 0.2,
            contrast: 0.2,
            saturation: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// 输出尺寸 (宽, 高)
    pub size: (usize, usize),

    /// 水平翻转概率
    pub flip_probability: f64,

    /// 随机旋转的最大角度（度）
    pub rotation_degrees: f32,

    pub color_jitter: ColorJitterConfig,

    pub normalization: NormalizationConfig,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            size: (224, 224),
            flip_probability: 0.5,
            rotation_degrees: 15.0,
            color_jitter: ColorJitterConfig::default(),
            normalization: NormalizationConfig::imagenet(),
        }
    }
}

impl TransformConfig {
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.size;
        if width == 0 || height == 0 {
            return Err(ClsError::Config(format!(
                "output size must be non-zero, got {}x{}",
                width, height
            )));
        }

        if !(0.0..=1.0).contains(&self.flip_probability) {
            return Err(ClsError::Config(format!(
                "flip probability must be in [0, 1], got {}",
                self.flip_probability
            )));
        }

        if !(self.rotation_degrees >= 0.0) || !self.rotation_degrees.is_finite() {
            return Err(ClsError::Config(format!(
                "rotation degrees must be non-negative, got {}",
                self.rotation_degrees
            )));
        }

        let jitter = &self.color_jitter;
        for (name, value) in [
            ("brightness", jitter.brightness),
            ("contrast", jitter.contrast),
            ("saturation", jitter.saturation),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ClsError::Config(format!(
                    "{} jitter must be non-negative, got {}",
                    name, value
                )));
            }
        }

        self.normalization.validate()
    }
}
