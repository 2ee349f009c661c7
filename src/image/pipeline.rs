use crate::config::{ColorJitterConfig, NormalizationConfig, TransformConfig};
use crate::image::transforms::ImageTransforms;
use crate::utils::error::ClsError;
use crate::Result;
use ndarray::{Array3, Array4, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 数据处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// 训练：启用数据增强
    Train,
    /// 验证 / 测试：仅缩放与标准化
    Eval,
}

impl FromStr for Phase {
    type Err = ClsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Phase::Train),
            "val" | "test" | "eval" => Ok(Phase::Eval),
            _ => Err(ClsError::UnknownPhase(s.to_string())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Train => write!(f, "train"),
            Phase::Eval => write!(f, "eval"),
        }
    }
}

/// 流水线中的单个步骤
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransformStep {
    Resize { width: usize, height: usize },
    RandomHorizontalFlip { probability: f64 },
    RandomRotation { degrees: f32 },
    ColorJitter(ColorJitterConfig),
    ToTensor,
    Normalize(NormalizationConfig),
}

impl TransformStep {
    pub fn name(&self) -> &'static str {
        match self {
            TransformStep::Resize { .. } => "Resize",
            TransformStep::RandomHorizontalFlip { .. } => "RandomHorizontalFlip",
            TransformStep::RandomRotation { .. } => "RandomRotation",
            TransformStep::ColorJitter(_) => "ColorJitter",
            TransformStep::ToTensor => "ToTensor",
            TransformStep::Normalize(_) => "Normalize",
        }
    }

    /// 应用时是否消耗随机数
    pub fn is_random(&self) -> bool {
        matches!(
            self,
            TransformStep::RandomHorizontalFlip { .. }
                | TransformStep::RandomRotation { .. }
                | TransformStep::ColorJitter(_)
        )
    }

    /// 该步骤之后数据是否为CHW张量
    fn expects_tensor(&self) -> bool {
        matches!(self, TransformStep::Normalize(_))
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        data: Array3<f32>,
        is_tensor: bool,
        rng: &mut R,
    ) -> Result<Array3<f32>> {
        if self.expects_tensor() != is_tensor {
            return Err(ClsError::ImageProcessing(format!(
                "step {} applied to data in the wrong layout",
                self.name()
            )));
        }

        match self {
            TransformStep::Resize { width, height } => {
                ImageTransforms::resize(&data, *width, *height)
            }
            TransformStep::RandomHorizontalFlip { probability } => {
                if rng.gen_bool(*probability) {
                    Ok(ImageTransforms::horizontal_flip(&data))
                } else {
                    Ok(data)
                }
            }
            TransformStep::RandomRotation { degrees } => {
                let angle = if *degrees > 0.0 {
                    rng.gen_range(-*degrees..=*degrees)
                } else {
                    0.0
                };
                Ok(ImageTransforms::rotate(&data, angle))
            }
            TransformStep::ColorJitter(config) => Ok(color_jitter(data, config, rng)),
            TransformStep::ToTensor => Ok(ImageTransforms::to_tensor(&data)),
            TransformStep::Normalize(config) => ImageTransforms::normalize(&data, config),
        }
    }
}

#[derive(Clone, Copy)]
enum JitterOp {
    Brightness,
    Contrast,
    Saturation,
}

/// 随机顺序应用亮度、对比度、饱和度抖动
fn color_jitter<R: Rng + ?Sized>(
    image: Array3<f32>,
    config: &ColorJitterConfig,
    rng: &mut R,
) -> Array3<f32> {
    let mut ops = [JitterOp::Brightness, JitterOp::Contrast, JitterOp::Saturation];
    ops.shuffle(rng);

    let mut out = image;
    for op in ops {
        let strength = match op {
            JitterOp::Brightness => config.brightness,
            JitterOp::Contrast => config.contrast,
            JitterOp::Saturation => config.saturation,
        };
        if strength <= 0.0 {
            continue;
        }
        let lower = (1.0 - strength).max(0.0);
        let factor = rng.gen_range(lower..=1.0 + strength);
        out = match op {
            JitterOp::Brightness => ImageTransforms::adjust_brightness(&out, factor),
            JitterOp::Contrast => ImageTransforms::adjust_contrast(&out, factor),
            JitterOp::Saturation => ImageTransforms::adjust_saturation(&out, factor),
        };
    }
    out
}

/// 有序的图像变换流水线，构造后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    phase: Phase,
    steps: Vec<TransformStep>,
}

impl Pipeline {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(TransformStep::name).collect()
    }

    /// 是否包含随机增强步骤
    pub fn is_stochastic(&self) -> bool {
        self.steps.iter().any(TransformStep::is_random)
    }

    /// 使用线程随机数生成器应用流水线
    pub fn apply(&self, image: &Array3<f32>) -> Result<Array3<f32>> {
        self.apply_with_rng(image, &mut rand::thread_rng())
    }

    /// HWC [0, 255] 图像 -> CHW 标准化张量
    pub fn apply_with_rng<R: Rng + ?Sized>(
        &self,
        image: &Array3<f32>,
        rng: &mut R,
    ) -> Result<Array3<f32>> {
        ImageTransforms::ensure_rgb_hwc(image)?;

        let mut data = image.clone();
        let mut is_tensor = false;
        for step in &self.steps {
            data = step.apply(data, is_tensor, rng)?;
            if matches!(step, TransformStep::ToTensor) {
                is_tensor = true;
            }
            tracing::trace!("Applied {} -> {:?}", step.name(), data.dim());
        }

        Ok(data)
    }

    /// 批量应用，输出 (N, C, H, W)
    pub fn apply_batch<R: Rng + ?Sized>(
        &self,
        images: &[Array3<f32>],
        rng: &mut R,
    ) -> Result<Array4<f32>> {
        if images.is_empty() {
            return Err(ClsError::InvalidInput("empty image batch".to_string()));
        }

        let tensors = images
            .iter()
            .map(|image| self.apply_with_rng(image, rng))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<_> = tensors.iter().map(|t| t.view()).collect();

        ndarray::stack(Axis(0), &views).map_err(|e| ClsError::ShapeMismatch(e.to_string()))
    }
}

/// 按阶段构建变换流水线
pub fn build_transform(phase: Phase, config: &TransformConfig) -> Result<Pipeline> {
    config.validate()?;

    let (width, height) = config.size;
    let mut steps = vec![TransformStep::Resize { width, height }];

    if phase == Phase::Train {
        steps.push(TransformStep::RandomHorizontalFlip {
            probability: config.flip_probability,
        });
        steps.push(TransformStep::RandomRotation {
            degrees: config.rotation_degrees,
        });
        steps.push(TransformStep::ColorJitter(config.color_jitter));
    }

    steps.push(TransformStep::ToTensor);
    steps.push(TransformStep::Normalize(config.normalization));

    tracing::debug!("Built {} pipeline with {} steps", phase, steps.len());

    Ok(Pipeline { phase, steps })
}

/// 解析阶段字符串并使用默认配置构建流水线
pub fn build_transform_for(phase: &str) -> Result<Pipeline> {
    build_transform(phase.parse()?, &TransformConfig::default())
}
