//! Per-frame preprocessing: optional color reduction, optional binarization,
//! aspect-preserving resize. All transforms happen in place on the frame file.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::models::snapshot::SnapshotConfig;
use crate::pipeline::PipelineError;

/// Fallback target width when the config does not carry one.
pub const DEFAULT_RESIZE_WIDTH: u32 = 512;

/// Binarization cutoff: pixel >= threshold maps to max, else 0.
const BINARY_THRESHOLD: u8 = 127;

/// Apply the configured transforms to the frame at `path`, overwriting it.
///
/// Returns the final `(width, height)`, or `Ok(None)` when the file cannot
/// be decoded as an image — a recoverable per-frame condition, not fatal to
/// the batch. Re-running with the same config is a no-op: the resize check
/// short-circuits once the width matches the target.
pub fn preprocess_frame(
    path: &Path,
    cfg: &SnapshotConfig,
) -> Result<Option<(u32, u32)>, PipelineError> {
    let mut img = match image::open(path) {
        Ok(img) => img,
        Err(_) => return Ok(None),
    };

    if cfg.black_white {
        // Binarization implies single-channel and wins over grayscale.
        let mut luma = img.into_luma8();
        for px in luma.pixels_mut() {
            px.0[0] = if px.0[0] >= BINARY_THRESHOLD { u8::MAX } else { 0 };
        }
        img = DynamicImage::ImageLuma8(luma);
    } else if cfg.grayscale {
        img = DynamicImage::ImageLuma8(img.into_luma8());
    }

    // A non-positive stored width is treated as absent; `as` would wrap
    // a negative i32 into a huge u32 and defeat the positivity check.
    let target_width = cfg
        .resize_width
        .and_then(|w| u32::try_from(w).ok().filter(|w| *w > 0))
        .unwrap_or(DEFAULT_RESIZE_WIDTH);
    let (width, height) = img.dimensions();
    if width != target_width && width > 0 {
        let new_height = resized_height(width, height, target_width);
        img = img.resize_exact(target_width, new_height, FilterType::Triangle);
    }

    img.save(path)?;
    Ok(Some(img.dimensions()))
}

/// Height after scaling to `target_width` with the aspect ratio preserved,
/// floored to at least one pixel.
pub(crate) fn resized_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (height as f64 * target_width as f64 / width as f64).round() as u32;
    scaled.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot::ImageFormat;
    use chrono::Utc;
    use image::{ColorType, Rgb, RgbImage};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn config(grayscale: bool, black_white: bool, resize_width: Option<i32>) -> SnapshotConfig {
        SnapshotConfig {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            sampling_fps: 1.0,
            chunk_length_sec: 10,
            resize_width,
            grayscale,
            black_white,
            image_format: ImageFormat::Png,
            created_at: Utc::now(),
        }
    }

    fn write_rgb(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_fn(w, h, |x, _| {
            if x < w / 2 {
                Rgb([200, 180, 160])
            } else {
                Rgb([40, 30, 20])
            }
        });
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn resize_preserves_aspect_ratio() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_rgb(tmp.path(), "f.png", 100, 50);

        let dims = preprocess_frame(&path, &config(false, false, Some(50)))
            .unwrap()
            .unwrap();
        assert_eq!(dims, (50, 25));
    }

    #[test]
    fn resize_only_keeps_channel_count() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_rgb(tmp.path(), "f.png", 100, 50);

        preprocess_frame(&path, &config(false, false, Some(64))).unwrap();

        let reopened = image::open(&path).unwrap();
        assert_eq!(reopened.color(), ColorType::Rgb8);
    }

    #[test]
    fn matching_width_short_circuits_resize() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_rgb(tmp.path(), "f.png", 100, 50);

        let dims = preprocess_frame(&path, &config(false, false, Some(100)))
            .unwrap()
            .unwrap();
        assert_eq!(dims, (100, 50));
    }

    #[test]
    fn grayscale_reduces_to_single_channel() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_rgb(tmp.path(), "f.png", 100, 50);

        preprocess_frame(&path, &config(true, false, Some(100))).unwrap();

        let reopened = image::open(&path).unwrap();
        assert_eq!(reopened.color(), ColorType::L8);
    }

    #[test]
    fn black_white_binarizes_at_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_rgb(tmp.path(), "f.png", 100, 50);

        preprocess_frame(&path, &config(false, true, Some(100))).unwrap();

        let luma = image::open(&path).unwrap().into_luma8();
        for px in luma.pixels() {
            assert!(px.0[0] == 0 || px.0[0] == u8::MAX);
        }
    }

    #[test]
    fn black_white_takes_precedence_over_grayscale() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_rgb(tmp.path(), "f.png", 100, 50);

        // Both flags set: result must still be binarized.
        preprocess_frame(&path, &config(true, true, Some(100))).unwrap();

        let luma = image::open(&path).unwrap().into_luma8();
        for px in luma.pixels() {
            assert!(px.0[0] == 0 || px.0[0] == u8::MAX);
        }
    }

    #[test]
    fn non_positive_resize_width_falls_back_to_default() {
        let tmp = tempfile::tempdir().unwrap();

        for bad_width in [Some(-5), Some(0)] {
            let path = write_rgb(tmp.path(), "f.png", 100, 50);
            let dims = preprocess_frame(&path, &config(false, false, bad_width))
                .unwrap()
                .unwrap();
            assert_eq!(dims, (DEFAULT_RESIZE_WIDTH, DEFAULT_RESIZE_WIDTH / 2));
        }
    }

    #[test]
    fn undecodable_file_is_recoverable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let dims = preprocess_frame(&path, &config(false, false, None)).unwrap();
        assert_eq!(dims, None);
    }

    #[test]
    fn height_floors_at_one_pixel() {
        assert_eq!(resized_height(1000, 1, 100), 1);
        assert_eq!(resized_height(100, 50, 50), 25);
        // round, not truncate: 33 * 100 / 64 = 51.56..
        assert_eq!(resized_height(64, 33, 100), 52);
    }
}
