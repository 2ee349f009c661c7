use crate::config::NormalizationConfig;
use crate::utils::error::ClsError;
use crate::Result;
use ndarray::{Array2, Array3, Axis, Zip};

/// ITU-R 601 亮度权重
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// 图像变换工具集（输入均为HWC格式，取值范围 [0, 255]）
pub struct ImageTransforms;

impl ImageTransforms {
    /// 校验输入为 HWC 三通道且非空
    pub fn ensure_rgb_hwc(image: &Array3<f32>) -> Result<()> {
        let (height, width, channels) = image.dim();
        if channels != 3 {
            return Err(ClsError::InvalidInput(format!(
                "expected 3-channel HWC image, got {} channels",
                channels
            )));
        }
        if height == 0 || width == 0 {
            return Err(ClsError::InvalidInput(format!(
                "image must be non-empty, got {}x{}",
                width, height
            )));
        }
        Ok(())
    }

    /// 图像缩放（不保持宽高比，双线性插值）
    ///
    /// 每个输出像素只取源图像中最近的2x2邻域，缩小时不做抗锯齿滤波。
    pub fn resize(
        image: &Array3<f32>,
        target_width: usize,
        target_height: usize,
    ) -> Result<Array3<f32>> {
        let (orig_h, orig_w, channels) = image.dim();
        if orig_h == 0 || orig_w == 0 {
            return Err(ClsError::ImageProcessing(
                "cannot resize an empty image".to_string(),
            ));
        }
        if target_width == 0 || target_height == 0 {
            return Err(ClsError::ImageProcessing(format!(
                "invalid resize target {}x{}",
                target_width, target_height
            )));
        }

        let scale_w = orig_w as f32 / target_width as f32;
        let scale_h = orig_h as f32 / target_height as f32;

        let mut resized = Array3::<f32>::zeros((target_height, target_width, channels));

        // 像素中心对齐采样
        for h in 0..target_height {
            let src_h = ((h as f32 + 0.5) * scale_h - 0.5).clamp(0.0, (orig_h - 1) as f32);
            let h1 = src_h.floor() as usize;
            let h2 = (h1 + 1).min(orig_h - 1);
            let dh = src_h - h1 as f32;

            for w in 0..target_width {
                let src_w = ((w as f32 + 0.5) * scale_w - 0.5).clamp(0.0, (orig_w - 1) as f32);
                let w1 = src_w.floor() as usize;
                let w2 = (w1 + 1).min(orig_w - 1);
                let dw = src_w - w1 as f32;

                for c in 0..channels {
                    let v11 = image[[h1, w1, c]];
                    let v12 = image[[h1, w2, c]];
                    let v21 = image[[h2, w1, c]];
                    let v22 = image[[h2, w2, c]];

                    resized[[h, w, c]] = v11 * (1.0 - dh) * (1.0 - dw)
                        + v12 * (1.0 - dh) * dw
                        + v21 * dh * (1.0 - dw)
                        + v22 * dh * dw;
                }
            }
        }

        Ok(resized)
    }

    /// 水平翻转
    pub fn horizontal_flip(image: &Array3<f32>) -> Array3<f32> {
        let mut flipped = image.clone();
        flipped.invert_axis(Axis(1));
        flipped.as_standard_layout().into_owned()
    }

    /// 绕图像中心逆时针旋转（最近邻采样，越界像素填0，输出尺寸不变）
    pub fn rotate(image: &Array3<f32>, angle_degrees: f32) -> Array3<f32> {
        if angle_degrees == 0.0 {
            return image.clone();
        }

        let (height, width, channels) = image.dim();
        let mut rotated = Array3::<f32>::zeros((height, width, channels));

        let theta = angle_degrees.to_radians();
        let (sin, cos) = theta.sin_cos();
        let cx = (width as f32 - 1.0) / 2.0;
        let cy = (height as f32 - 1.0) / 2.0;

        // 反向映射：目标坐标 -> 源坐标
        for y in 0..height {
            for x in 0..width {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let src_x = (cx + dx * cos - dy * sin).round();
                let src_y = (cy + dx * sin + dy * cos).round();

                if src_x >= 0.0 && src_x < width as f32 && src_y >= 0.0 && src_y < height as f32 {
                    let (sx, sy) = (src_x as usize, src_y as usize);
                    for c in 0..channels {
                        rotated[[y, x, c]] = image[[sy, sx, c]];
                    }
                }
            }
        }

        rotated
    }

    /// 灰度图 (H, W)
    pub fn grayscale(image: &Array3<f32>) -> Array2<f32> {
        let (height, width, _) = image.dim();
        let mut gray = Array2::<f32>::zeros((height, width));
        Zip::from(&mut gray)
            .and(image.lanes(Axis(2)))
            .for_each(|g, px| {
                *g = px[0] * LUMA_WEIGHTS[0] + px[1] * LUMA_WEIGHTS[1] + px[2] * LUMA_WEIGHTS[2];
            });
        gray
    }

    /// 亮度调整（乘性因子）
    pub fn adjust_brightness(image: &Array3<f32>, factor: f32) -> Array3<f32> {
        image.mapv(|v| (v * factor).clamp(0.0, 255.0))
    }

    /// 对比度调整：与整幅图的平均灰度混合
    pub fn adjust_contrast(image: &Array3<f32>, factor: f32) -> Array3<f32> {
        let mean = Self::grayscale(image).mean().unwrap_or(0.0);
        image.mapv(|v| (mean + factor * (v - mean)).clamp(0.0, 255.0))
    }

    /// 饱和度调整：与逐像素灰度混合
    pub fn adjust_saturation(image: &Array3<f32>, factor: f32) -> Array3<f32> {
        let gray = Self::grayscale(image);
        let mut adjusted = image.clone();
        Zip::from(adjusted.lanes_mut(Axis(2)))
            .and(&gray)
            .for_each(|mut px, &g| {
                px.mapv_inplace(|v| (g + factor * (v - g)).clamp(0.0, 255.0));
            });
        adjusted
    }

    /// HWC [0, 255] -> CHW [0, 1]
    pub fn to_tensor(image: &Array3<f32>) -> Array3<f32> {
        image
            .view()
            .permuted_axes([2, 0, 1])
            .mapv(|v| v / 255.0)
            .as_standard_layout()
            .into_owned()
    }

    /// 逐通道标准化（输入CHW）
    pub fn normalize(tensor: &Array3<f32>, config: &NormalizationConfig) -> Result<Array3<f32>> {
        let channels = tensor.len_of(Axis(0));
        if channels != 3 {
            return Err(ClsError::InvalidInput(format!(
                "normalization expects 3 channels in CHW layout, got {}",
                channels
            )));
        }

        let mut normalized = tensor.clone();
        for (c, mut plane) in normalized.axis_iter_mut(Axis(0)).enumerate() {
            let (mean, std) = (config.mean[c], config.std[c]);
            plane.mapv_inplace(|v| (v - mean) / std);
        }

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gradient(height: usize, width: usize) -> Array3<f32> {
        Array3::from_shape_fn((height, width, 3), |(h, w, c)| {
            ((h * 7 + w * 3 + c * 11) % 256) as f32
        })
    }

    #[test]
    fn resize_hits_exact_target_size() {
        for (h, w) in [(10, 10), (300, 17), (1, 1), (224, 224), (500, 640)] {
            let out = ImageTransforms::resize(&gradient(h, w), 224, 224).unwrap();
            assert_eq!(out.dim(), (224, 224, 3));
        }
    }

    #[test]
    fn resize_of_constant_image_stays_constant() {
        let image = Array3::<f32>::from_elem((31, 57, 3), 42.0);
        let out = ImageTransforms::resize(&image, 224, 224).unwrap();
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 42.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn downscale_samples_only_the_nearest_two_by_two() {
        // 8x8 -> 2x2：采样点落在 1.5 和 5.5，只读取第 1,2,5,6 行/列
        let sampled = |i: usize| matches!(i, 1 | 2 | 5 | 6);
        let image = Array3::<f32>::from_shape_fn((8, 8, 3), |(h, w, _)| {
            if sampled(h) && sampled(w) {
                0.0
            } else {
                255.0
            }
        });
        let out = ImageTransforms::resize(&image, 2, 2).unwrap();
        assert_eq!(out.dim(), (2, 2, 3));
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn resize_rejects_zero_target() {
        assert!(ImageTransforms::resize(&gradient(4, 4), 0, 4).is_err());
    }

    #[test]
    fn flip_mirrors_columns() {
        let image = gradient(3, 5);
        let flipped = ImageTransforms::horizontal_flip(&image);
        for h in 0..3 {
            for w in 0..5 {
                for c in 0..3 {
                    assert_eq!(flipped[[h, w, c]], image[[h, 4 - w, c]]);
                }
            }
        }
        assert_eq!(ImageTransforms::horizontal_flip(&flipped), image);
    }

    #[test]
    fn rotate_by_zero_is_identity() {
        let image = gradient(8, 6);
        assert_eq!(ImageTransforms::rotate(&image, 0.0), image);
    }

    #[test]
    fn rotate_quarter_turn_moves_bottom_to_right() {
        // 3x3 图像，中心下方像素旋转 +90 度后位于中心右侧
        let mut image = Array3::<f32>::zeros((3, 3, 3));
        image[[2, 1, 0]] = 200.0;
        let rotated = ImageTransforms::rotate(&image, 90.0);
        assert_eq!(rotated.dim(), (3, 3, 3));
        assert_eq!(rotated[[1, 2, 0]], 200.0);
        assert_eq!(rotated[[2, 1, 0]], 0.0);
    }

    #[test]
    fn rotate_fills_uncovered_corners_with_zero() {
        let image = Array3::<f32>::from_elem((20, 20, 3), 255.0);
        let rotated = ImageTransforms::rotate(&image, 45.0);
        assert_eq!(rotated[[0, 0, 0]], 0.0);
        assert_eq!(rotated[[10, 10, 0]], 255.0);
    }

    #[test]
    fn brightness_scales_and_clamps() {
        let image = Array3::<f32>::from_elem((2, 2, 3), 200.0);
        let brighter = ImageTransforms::adjust_brightness(&image, 1.2);
        assert_abs_diff_eq!(brighter[[0, 0, 0]], 240.0, epsilon = 1e-3);
        let saturated = ImageTransforms::adjust_brightness(&image, 2.0);
        assert_eq!(saturated[[0, 0, 0]], 255.0);
    }

    #[test]
    fn contrast_factor_one_is_identity() {
        let image = gradient(5, 5);
        let out = ImageTransforms::adjust_contrast(&image, 1.0);
        for (a, b) in out.iter().zip(image.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-3);
        }
    }

    #[test]
    fn zero_saturation_produces_gray_pixels() {
        let mut image = Array3::<f32>::zeros((1, 1, 3));
        image[[0, 0, 0]] = 255.0;
        let gray = ImageTransforms::adjust_saturation(&image, 0.0);
        let expected = 255.0 * 0.299;
        for c in 0..3 {
            assert_abs_diff_eq!(gray[[0, 0, c]], expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn to_tensor_permutes_and_scales() {
        let image = gradient(4, 6);
        let tensor = ImageTransforms::to_tensor(&image);
        assert_eq!(tensor.dim(), (3, 4, 6));
        assert_abs_diff_eq!(tensor[[2, 3, 5]], image[[3, 5, 2]] / 255.0, epsilon = 1e-6);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn normalize_uses_channel_statistics() {
        let config = NormalizationConfig::imagenet();
        let tensor = Array3::<f32>::from_shape_fn((3, 2, 2), |(c, _, _)| config.mean[c]);
        let normalized = ImageTransforms::normalize(&tensor, &config).unwrap();
        assert!(normalized.iter().all(|v| v.abs() < 1e-6));

        let ones = Array3::<f32>::ones((3, 1, 1));
        let normalized = ImageTransforms::normalize(&ones, &config).unwrap();
        assert_abs_diff_eq!(normalized[[0, 0, 0]], (1.0 - 0.485) / 0.229, epsilon = 1e-5);
        assert_abs_diff_eq!(normalized[[2, 0, 0]], (1.0 - 0.406) / 0.225, epsilon = 1e-5);
    }

    #[test]
    fn ensure_rgb_rejects_grayscale() {
        let gray = Array3::<f32>::zeros((4, 4, 1));
        assert!(matches!(
            ImageTransforms::ensure_rgb_hwc(&gray),
            Err(ClsError::InvalidInput(_))
        ));
    }
}
