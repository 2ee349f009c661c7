use crate::utils::error::ClsError;
use crate::Result;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 报告中小数位数
pub const REPORT_DIGITS: usize = 4;

/// 最后几行的标题宽度下限（"weighted avg"）
const MIN_NAME_WIDTH: usize = 12;

fn check_inputs(y_true: &[usize], y_pred: &[usize]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(ClsError::ShapeMismatch(format!(
            "y_true has {} samples but y_pred has {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(ClsError::EmptyLabelSet);
    }
    Ok(())
}

/// 混淆矩阵：行为真实类别，列为预测类别
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    labels: Vec<usize>,
    counts: Array2<u64>,
}

impl ConfusionMatrix {
    /// 标签集合为 y_true 与 y_pred 中出现过的标签的并集（升序）
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        check_inputs(y_true, y_pred)?;

        let labels: Vec<usize> = y_true
            .iter()
            .chain(y_pred.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let n = labels.len();
        let mut counts = Array2::<u64>::zeros((n, n));
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            // labels 已排序且包含所有出现过的值
            let (Ok(ti), Ok(pi)) = (labels.binary_search(t), labels.binary_search(p)) else {
                continue;
            };
            counts[[ti, pi]] += 1;
        }

        Ok(Self { labels, counts })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn counts(&self) -> &Array2<u64> {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    pub fn true_positives(&self, index: usize) -> u64 {
        self.counts[[index, index]]
    }

    /// 每个类别的真实样本数
    pub fn support(&self) -> Vec<u64> {
        self.counts.sum_axis(Axis(1)).to_vec()
    }

    /// 每个类别被预测的次数
    pub fn predicted(&self) -> Vec<u64> {
        self.counts.sum_axis(Axis(0)).to_vec()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.counts.diag().sum() as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: usize,
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// 分类报告：逐类别指标 + 准确率 + 宏平均 + 加权平均
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ClassificationReport {
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        let matrix = ConfusionMatrix::compute(y_true, y_pred)?;
        Ok(Self::from_confusion_matrix(&matrix))
    }

    pub fn from_confusion_matrix(matrix: &ConfusionMatrix) -> Self {
        let support = matrix.support();
        let predicted = matrix.predicted();

        let mut no_predictions = Vec::new();
        let mut no_samples = Vec::new();

        let classes: Vec<ClassMetrics> = matrix
            .labels()
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                let tp = matrix.true_positives(i);
                if predicted[i] == 0 {
                    no_predictions.push(label);
                }
                if support[i] == 0 {
                    no_samples.push(label);
                }
                ClassMetrics {
                    label,
                    name: label.to_string(),
                    precision: ratio(tp, predicted[i]),
                    recall: ratio(tp, support[i]),
                    f1: ratio(2 * tp, predicted[i] + support[i]),
                    support: support[i],
                }
            })
            .collect();

        if !no_predictions.is_empty() {
            tracing::warn!(
                "Precision is ill-defined and set to 0.0 for labels with no predicted samples: {:?}",
                no_predictions
            );
        }
        if !no_samples.is_empty() {
            tracing::warn!(
                "Recall is ill-defined and set to 0.0 for labels with no true samples: {:?}",
                no_samples
            );
        }

        let total = matrix.total();
        let n = classes.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
            support: total,
        };

        let weight = |c: &ClassMetrics| c.support as f64 / total.max(1) as f64;
        let weighted_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision * weight(c)).sum(),
            recall: classes.iter().map(|c| c.recall * weight(c)).sum(),
            f1: classes.iter().map(|c| c.f1 * weight(c)).sum(),
            support: total,
        };

        Self {
            classes,
            accuracy: matrix.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }

    /// 用类别名称替换报告中的数字标签
    pub fn with_target_names<S: Into<String>>(mut self, names: Vec<S>) -> Result<Self> {
        if names.len() != self.classes.len() {
            return Err(ClsError::InvalidInput(format!(
                "got {} target names for {} classes",
                names.len(),
                self.classes.len()
            )));
        }
        for (class, name) in self.classes.iter_mut().zip(names) {
            class.name = name.into();
        }
        Ok(self)
    }

    pub fn macro_f1(&self) -> f64 {
        self.macro_avg.f1
    }

    /// 最差类别的F1
    pub fn min_f1(&self) -> f64 {
        self.classes
            .iter()
            .map(|c| c.f1)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    pub fn f1_per_class(&self) -> Vec<(usize, f64)> {
        self.classes.iter().map(|c| (c.label, c.f1)).collect()
    }

    /// 渲染为固定格式文本表格
    pub fn render(&self, digits: usize) -> String {
        let width = self
            .classes
            .iter()
            .map(|c| c.name.chars().count())
            .chain([MIN_NAME_WIDTH, digits])
            .max()
            .unwrap_or(MIN_NAME_WIDTH);

        let mut report = format!("{:>width$} ", "", width = width);
        for header in ["precision", "recall", "f1-score", "support"] {
            report.push_str(&format!(" {:>9}", header));
        }
        report.push_str("\n\n");

        let row = |name: &str, p: f64, r: f64, f: f64, support: u64| {
            format!(
                "{:>width$}  {:>9.digits$} {:>9.digits$} {:>9.digits$} {:>9}\n",
                name,
                p,
                r,
                f,
                support,
                width = width,
                digits = digits
            )
        };

        for class in &self.classes {
            report.push_str(&row(
                &class.name,
                class.precision,
                class.recall,
                class.f1,
                class.support,
            ));
        }
        report.push('\n');

        report.push_str(&format!(
            "{:>width$}  {:>9} {:>9} {:>9.digits$} {:>9}\n",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.macro_avg.support,
            width = width,
            digits = digits
        ));

        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            report.push_str(&row(name, avg.precision, avg.recall, avg.f1, avg.support));
        }

        report
    }
}

/// 一次评估的汇总结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub macro_f1: f64,
    pub min_f1: f64,
    pub report: String,
    pub details: ClassificationReport,
}

impl From<ClassificationReport> for EvaluationResult {
    fn from(details: ClassificationReport) -> Self {
        Self {
            macro_f1: details.macro_f1(),
            min_f1: details.min_f1(),
            report: details.render(REPORT_DIGITS),
            details,
        }
    }
}

/// 计算 macro F1、最小类别 F1 与文本报告
pub fn evaluate(y_true: &[usize], y_pred: &[usize]) -> Result<EvaluationResult> {
    let details = ClassificationReport::compute(y_true, y_pred)?;
    tracing::debug!(
        "Evaluated {} samples over {} classes",
        y_true.len(),
        details.classes.len()
    );
    Ok(details.into())
}

/// 同 evaluate，报告中使用类别名称
pub fn evaluate_with_names<S: Into<String>>(
    y_true: &[usize],
    y_pred: &[usize],
    target_names: Vec<S>,
) -> Result<EvaluationResult> {
    let details = ClassificationReport::compute(y_true, y_pred)?.with_target_names(target_names)?;
    Ok(details.into())
}
