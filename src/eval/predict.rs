use crate::utils::error::ClsError;
use crate::Result;
use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewD, Ix2};

/// 单行 argmax：并列时取第一个，NaN 视为最大值（取第一个 NaN）
fn argmax_row(row: ArrayView1<f32>) -> usize {
    let mut max_idx = 0;
    let mut max_val = f32::NEG_INFINITY;

    for (i, &score) in row.iter().enumerate() {
        if score.is_nan() {
            return i;
        }
        if i == 0 || score > max_val {
            max_val = score;
            max_idx = i;
        }
    }

    max_idx
}

/// logits (batch, num_classes) -> 每个样本的预测类别
pub fn predict(logits: ArrayView2<f32>) -> Result<Array1<usize>> {
    let (batch_size, num_classes) = logits.dim();

    if batch_size == 0 {
        return Ok(Array1::zeros(0));
    }
    if num_classes == 0 {
        return Err(ClsError::ShapeMismatch(format!(
            "logits have {} rows but zero classes",
            batch_size
        )));
    }

    Ok(logits.rows().into_iter().map(argmax_row).collect())
}

/// 接受任意维度的输出（例如推理引擎返回的动态张量），要求为二维
pub fn predict_dyn(logits: ArrayViewD<f32>) -> Result<Array1<usize>> {
    let shape = logits.shape().to_vec();
    let logits = logits.into_dimensionality::<Ix2>().map_err(|_| {
        ClsError::ShapeMismatch(format!(
            "expected 2D logits (batch, num_classes), got shape {:?}",
            shape
        ))
    })?;
    predict(logits)
}
