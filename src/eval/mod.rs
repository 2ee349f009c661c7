pub mod metrics;
pub mod predict;

pub use metrics::{
    evaluate, evaluate_with_names, ClassificationReport, ConfusionMatrix, EvaluationResult,
};
pub use predict::{predict, predict_dyn};
