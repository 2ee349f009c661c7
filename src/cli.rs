use crate::eval::{self, EvaluationResult};
use crate::image::{build_transform, ImageLoader, Phase};
use crate::utils::error::ClsError;
use crate::{Result, TransformConfig};
use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 流水线应用结果摘要
#[derive(Debug, Clone, Serialize)]
pub struct TransformSummary {
    pub phase: Phase,
    pub steps: Vec<&'static str>,
    pub input_shape: Vec<usize>,
    pub output_shape: Vec<usize>,
    pub channel_mean: Vec<f32>,
    pub channel_std: Vec<f32>,
}

/// evaluate 子命令的输入文件格式
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationInput {
    pub y_true: Vec<usize>,
    pub y_pred: Vec<usize>,
    #[serde(default)]
    pub target_names: Option<Vec<String>>,
}

fn channel_stats(tensor: &Array3<f32>) -> (Vec<f32>, Vec<f32>) {
    tensor
        .axis_iter(Axis(0))
        .map(|plane| (plane.mean().unwrap_or(0.0), plane.std(0.0)))
        .unzip()
}

pub fn transform_image(
    phase: Phase,
    input: &Path,
    seed: Option<u64>,
    config: &TransformConfig,
) -> Result<TransformSummary> {
    let pipeline = build_transform(phase, config)?;
    let image = ImageLoader::load_rgb(input)?;

    let tensor = match seed {
        Some(seed) => pipeline.apply_with_rng(&image, &mut StdRng::seed_from_u64(seed))?,
        None => pipeline.apply(&image)?,
    };

    let (channel_mean, channel_std) = channel_stats(&tensor);
    tracing::info!(
        "Transformed {} with {} pipeline: {:?} -> {:?}",
        input.display(),
        phase,
        image.dim(),
        tensor.dim()
    );

    Ok(TransformSummary {
        phase,
        steps: pipeline.step_names(),
        input_shape: image.shape().to_vec(),
        output_shape: tensor.shape().to_vec(),
        channel_mean,
        channel_std,
    })
}

/// 将 JSON 二维数组转为 logits 矩阵
pub fn logits_from_rows(rows: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let batch = rows.len();
    let classes = rows.first().map_or(0, Vec::len);

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != classes) {
        return Err(ClsError::ShapeMismatch(format!(
            "row {} has {} scores, expected {}",
            i,
            row.len(),
            classes
        )));
    }

    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((batch, classes), flat)
        .map_err(|e| ClsError::ShapeMismatch(e.to_string()))
}

pub fn predict_file(path: &Path) -> Result<Vec<usize>> {
    let rows: Vec<Vec<f32>> = serde_json::from_slice(&std::fs::read(path)?)?;
    let logits = logits_from_rows(rows)?;
    let predictions = eval::predict(logits.view())?;
    tracing::info!("Predicted {} samples from {}", predictions.len(), path.display());
    Ok(predictions.to_vec())
}

pub fn evaluate_input(input: EvaluationInput) -> Result<EvaluationResult> {
    match input.target_names {
        Some(names) => eval::evaluate_with_names(&input.y_true, &input.y_pred, names),
        None => eval::evaluate(&input.y_true, &input.y_pred),
    }
}

pub fn evaluate_file(path: &Path) -> Result<EvaluationResult> {
    let input: EvaluationInput = serde_json::from_slice(&std::fs::read(path)?)?;
    let result = evaluate_input(input)?;
    tracing::info!(
        "Evaluated {}: macro_f1={:.4}, min_f1={:.4}",
        path.display(),
        result.macro_f1,
        result.min_f1
    );
    Ok(result)
}
