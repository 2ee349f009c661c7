pub mod cli;
pub mod config;
pub mod eval;
pub mod image;
pub mod utils;

// 重新导出主要类型
pub use config::{NormalizationConfig, TransformConfig};
pub use eval::{evaluate, predict, EvaluationResult};
pub use crate::image::{build_transform, Phase, Pipeline};
pub use utils::error::ClsError;

pub type Result<T> = std::result::Result<T, ClsError>;
