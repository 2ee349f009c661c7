use approx::assert_abs_diff_eq;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imgcls::eval::ClassificationReport;
use imgcls::image::ImageLoader;
use imgcls::{build_transform, cli, evaluate, predict, ClsError, Phase, TransformConfig};
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tempfile::tempdir;

fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

#[test]
fn every_phase_produces_224_square_tensors() {
    let config = TransformConfig::default();
    let mut rng = StdRng::seed_from_u64(2024);
    for phase in ["train", "val", "test"] {
        let pipeline = build_transform(phase.parse().unwrap(), &config).unwrap();
        for (h, w) in [(17, 900), (224, 224), (640, 480)] {
            let image = Array3::<f32>::from_elem((h, w, 3), 128.0);
            let out = pipeline.apply_with_rng(&image, &mut rng).unwrap();
            assert_eq!(out.dim(), (3, 224, 224), "phase {} input {}x{}", phase, w, h);
        }
    }
}

#[test]
fn only_train_phase_is_stochastic() {
    let config = TransformConfig::default();
    let train = build_transform(Phase::Train, &config).unwrap();
    let val = build_transform("val".parse().unwrap(), &config).unwrap();
    let test = build_transform("test".parse().unwrap(), &config).unwrap();

    assert!(train.is_stochastic());
    assert_eq!(val, test);
    assert!(val.steps().iter().all(|s| !s.is_random()));

    let to_tensor = train.step_names().iter().position(|n| *n == "ToTensor").unwrap();
    assert!(train.steps()[..to_tensor].iter().filter(|s| s.is_random()).count() == 3);
}

#[test]
fn unknown_phase_is_rejected_at_the_boundary() {
    let err = "validation".parse::<Phase>().unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_PHASE");
}

#[test]
fn logits_to_metrics_end_to_end() {
    let logits = Array2::from_shape_vec(
        (4, 2),
        vec![2.0, -1.0, 0.1, 0.9, 3.0, 0.0, 1.0, 1.0],
    )
    .unwrap();
    let preds = predict(logits.view()).unwrap();
    assert_eq!(preds.to_vec(), vec![0, 1, 0, 0]);

    let result = evaluate(&[0, 1, 1, 0], preds.as_slice().unwrap()).unwrap();
    assert_abs_diff_eq!(result.macro_f1, 0.7333, epsilon = 1e-4);
    assert_abs_diff_eq!(result.min_f1, 0.6667, epsilon = 1e-4);
    assert!(result.report.contains("macro avg     0.8333    0.7500    0.7333         4"));
}

#[test]
fn perfect_multiclass_predictions() {
    let labels: Vec<usize> = (0..50).map(|i| i % 7).collect();
    let result = evaluate(&labels, &labels).unwrap();
    assert_eq!(result.macro_f1, 1.0);
    assert_eq!(result.min_f1, 1.0);
    assert_eq!(result.details.classes.len(), 7);
}

#[test]
fn degenerate_inputs_surface_typed_errors() {
    assert!(matches!(evaluate(&[], &[]), Err(ClsError::EmptyLabelSet)));
    assert!(matches!(
        evaluate(&[1, 2, 3], &[1, 2]),
        Err(ClsError::ShapeMismatch(_))
    ));
    assert!(matches!(
        ClassificationReport::compute(&[0], &[0, 0]),
        Err(ClsError::ShapeMismatch(_))
    ));
}

#[test]
fn cli_transform_summarizes_a_real_image() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("leaf.png");
    write_png(&path, 120, 80);

    let loaded = ImageLoader::load_rgb(&path).unwrap();
    assert_eq!(loaded.dim(), (80, 120, 3));

    let summary =
        cli::transform_image(Phase::Train, &path, Some(9), &TransformConfig::default()).unwrap();
    let again =
        cli::transform_image(Phase::Train, &path, Some(9), &TransformConfig::default()).unwrap();

    assert_eq!(summary.input_shape, vec![80, 120, 3]);
    assert_eq!(summary.output_shape, vec![3, 224, 224]);
    assert_eq!(summary.steps.len(), 6);
    assert_eq!(summary.channel_mean, again.channel_mean);
}

#[test]
fn cli_predict_and_evaluate_read_json_files() {
    let dir = tempdir().unwrap();
    let logits_path = dir.path().join("logits.json");
    std::fs::write(&logits_path, "[[0.2, 0.7, 0.1], [0.9, 0.05, 0.05], [0.0, 0.0, 1.0]]").unwrap();
    let preds = cli::predict_file(&logits_path).unwrap();
    assert_eq!(preds, vec![1, 0, 2]);

    let eval_path = dir.path().join("eval.json");
    std::fs::write(
        &eval_path,
        r#"{"y_true": [1, 0, 2], "y_pred": [1, 0, 2], "target_names": ["healthy", "rust", "scab"]}"#,
    )
    .unwrap();
    let result = cli::evaluate_file(&eval_path).unwrap();
    assert_eq!(result.macro_f1, 1.0);
    assert!(result.report.contains("scab"));
}
