#![deny(clippy::all)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::inconsistent_struct_constructor)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::similar_names)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::use_self)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::create_dir)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::default_numeric_fallback)]
#![warn(clippy::exit)]
#![warn(clippy::filetype_is_file)]
#![warn(clippy::float_cmp_const)]
#![warn(clippy::if_then_some_else_none)]
#![warn(clippy::lossy_float_literal)]
#![warn(clippy::map_err_ignore)]
#![warn(clippy::mem_forget)]
#![warn(clippy::mod_module_files)]
#![warn(clippy::multiple_inherent_impl)]
#![warn(clippy::pattern_type_mismatch)]
#![warn(clippy::rc_buffer)]
#![warn(clippy::rc_mutex)]
#![warn(clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::same_name_method)]
#![warn(clippy::str_to_string)]
#![warn(clippy::string_to_string)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::unneeded_field_pattern)]
#![warn(clippy::use_debug)]
#![warn(clippy::verbose_file_reads)]

//! SSIMULACRA2: a perceptual image quality metric.
//!
//! The score compares a distorted image against its source. Identical images
//! score 100, typical lossy compression lands between 0 and 100 and very
//! strong distortions go negative.
//!
//! ```
//! let width = 16;
//! let height = 16;
//! let source = vec![128u8; width * height * 3];
//! let distorted = source.clone();
//!
//! let score = ssimulacra2::analyze(&source, &distorted, width, height)?;
//! assert!((score - 100.0).abs() < 1e-3);
//! # Ok::<(), ssimulacra2::Ssimulacra2Error>(())
//! ```

mod blur;
mod downscale;
mod input;
mod metrics;
mod score;
mod xyb;

use std::fmt::Display;

use log::{debug, trace};

pub use blur::Blur;
pub use input::{srgb_to_linear, ChannelLayout, ImageBuffer, Sample};
pub use metrics::MsssimScale;
pub use score::{remap, ErrorMap, FeatureVector, NUM_FEATURES, NUM_SCALES};
pub use xyb::linear_rgb_to_xyb;
pub use yuvxyb::{
    ColorPrimaries, Frame, LinearRgb, MatrixCoefficients, Pixel, Plane, Rgb,
    TransferCharacteristic, Yuv, YuvConfig,
};

use downscale::downscale_by_2;
use input::{infer_layout, LinearImage};
use metrics::{edge_diff_map, image_multiply, ssim_map};

/// Scales are only scored while both dimensions are at least this large.
const MIN_SCALE_SIZE: usize = 8;

/// Errors that can occur when computing the score.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ssimulacra2Error {
    /// The two images do not have the same width and height.
    #[error("Source and distorted image width and height must be equal")]
    DimensionMismatch,

    /// Only greyscale, RGB and RGBA buffers are accepted.
    #[error("Unsupported channel count {0}, expected 1, 3 or 4")]
    UnsupportedChannelLayout(usize),

    /// The buffer length does not match width, height and channel count.
    #[error("Buffer holds {actual} samples, expected {expected}")]
    InvalidBufferLength { expected: usize, actual: usize },

    /// A float sample is not finite or lies outside `[0, 1]`.
    #[error("Sample {index} is not finite or outside of [0, 1]")]
    SampleOutOfRange { index: usize },

    /// The image is empty or too small to be scored at any scale.
    #[error("Images must be at least 8x8 pixels")]
    DegenerateInput,

    /// A frame could not be converted to linear RGB.
    #[error("Failed to convert input image to linear RGB: {0}")]
    LinearRgbConversionFailed(String),
}

/// Computes the SSIMULACRA2 score for two interleaved sRGB buffers of the
/// same size and channel layout.
///
/// The channel layout (grey, RGB or RGBA) is derived from the buffer length.
/// See [`Sample`] for the accepted sample types and their ranges.
///
/// # Errors
/// - If the two buffers differ in length
/// - If a buffer length is not `width * height` times 1, 3 or 4
/// - If a float sample is not finite or outside `[0, 1]`
/// - If the images are smaller than 8x8 pixels
pub fn analyze<S: Sample>(
    source: &[S],
    distorted: &[S],
    width: usize,
    height: usize,
) -> Result<f64, Ssimulacra2Error> {
    if source.len() != distorted.len() {
        return Err(Ssimulacra2Error::DimensionMismatch);
    }
    let layout = infer_layout(source.len(), width, height)?;

    input::check_samples(source)?;
    input::check_samples(distorted)?;

    let img1 = input::linearize(source, layout, width, height);
    let img2 = input::linearize(distorted, layout, width, height);

    compute_linear_ssimulacra2(img1, img2)
}

/// Computes the SSIMULACRA2 score for a given source image and the distorted
/// version of that image.
///
/// # Errors
/// - If the source and distorted image width and height do not match
/// - If a float sample is not finite or outside `[0, 1]`
/// - If the images are smaller than 8x8 pixels
pub fn compute_ssimulacra2<S: Sample>(
    source: &ImageBuffer<S>,
    distorted: &ImageBuffer<S>,
) -> Result<f64, Ssimulacra2Error> {
    check_dimensions(
        (source.width(), source.height()),
        (distorted.width(), distorted.height()),
    )?;
    source.validate()?;
    distorted.validate()?;

    compute_linear_ssimulacra2(source.to_linear(), distorted.to_linear())
}

/// Computes the SSIMULACRA2 score for a given input frame and the distorted
/// version of that frame.
///
/// Accepts anything [`yuvxyb`] can turn into linear RGB, such as [`Rgb`]
/// images with arbitrary transfer characteristics or [`Yuv`] video frames.
///
/// # Errors
/// - If the source or distorted image cannot be converted to linear RGB
/// - If the source and distorted image width and height do not match
/// - If the images are smaller than 8x8 pixels
pub fn compute_frame_ssimulacra2<T, U>(source: T, distorted: U) -> Result<f64, Ssimulacra2Error>
where
    LinearRgb: TryFrom<T> + TryFrom<U>,
    <LinearRgb as TryFrom<T>>::Error: Display,
    <LinearRgb as TryFrom<U>>::Error: Display,
{
    let img1 = LinearRgb::try_from(source)
        .map_err(|e| Ssimulacra2Error::LinearRgbConversionFailed(e.to_string()))?;
    let img2 = LinearRgb::try_from(distorted)
        .map_err(|e| Ssimulacra2Error::LinearRgbConversionFailed(e.to_string()))?;

    compute_linear_ssimulacra2(LinearImage::from(&img1), LinearImage::from(&img2))
}

/// Computes all sub-scores for a source image and its distorted version,
/// without collapsing them into the final score.
///
/// # Errors
/// Same as [`compute_ssimulacra2`].
pub fn compute_ssimulacra2_features<S: Sample>(
    source: &ImageBuffer<S>,
    distorted: &ImageBuffer<S>,
) -> Result<FeatureVector, Ssimulacra2Error> {
    check_dimensions(
        (source.width(), source.height()),
        (distorted.width(), distorted.height()),
    )?;
    source.validate()?;
    distorted.validate()?;

    compute_features(source.to_linear(), distorted.to_linear())
}

fn check_dimensions(
    source: (usize, usize),
    distorted: (usize, usize),
) -> Result<(), Ssimulacra2Error> {
    if source != distorted {
        return Err(Ssimulacra2Error::DimensionMismatch);
    }
    Ok(())
}

fn compute_linear_ssimulacra2(
    img1: LinearImage,
    img2: LinearImage,
) -> Result<f64, Ssimulacra2Error> {
    let features = compute_features(img1, img2)?;

    let weighted_sum = features.weighted_sum();
    trace!("weighted sum of sub-scores: {}", weighted_sum);

    let score = remap(weighted_sum);
    if !score.is_finite() {
        return Err(Ssimulacra2Error::DegenerateInput);
    }
    Ok(score)
}

fn compute_features(
    mut img1: LinearImage,
    mut img2: LinearImage,
) -> Result<FeatureVector, Ssimulacra2Error> {
    check_dimensions((img1.width, img1.height), (img2.width, img2.height))?;

    if img1.width < MIN_SCALE_SIZE || img1.height < MIN_SCALE_SIZE {
        return Err(Ssimulacra2Error::DegenerateInput);
    }

    let mut width = img1.width;
    let mut height = img1.height;

    let mut mul = [
        vec![0.0f32; width * height],
        vec![0.0f32; width * height],
        vec![0.0f32; width * height],
    ];
    let mut blur = Blur::new(width, height);
    let mut features = FeatureVector::default();

    for scale in 0..NUM_SCALES {
        if width < MIN_SCALE_SIZE || height < MIN_SCALE_SIZE {
            debug!(
                "stopping after {} of {} scales at {}x{}",
                scale, NUM_SCALES, width, height
            );
            break;
        }

        if scale > 0 {
            img1 = downscale_by_2(&img1);
            img2 = downscale_by_2(&img2);
            width = img1.width;
            height = img1.height;
        }
        for c in &mut mul {
            c.truncate(width * height);
        }
        blur.shrink_to(width, height);

        let img1 = xyb::to_positive_xyb_planes(&img1);
        let img2 = xyb::to_positive_xyb_planes(&img2);

        image_multiply(&img1, &img1, &mut mul);
        let sigma1_sq = blur.blur(&mul);

        image_multiply(&img2, &img2, &mut mul);
        let sigma2_sq = blur.blur(&mul);

        image_multiply(&img1, &img2, &mut mul);
        let sigma12 = blur.blur(&mul);

        let mu1 = blur.blur(&img1);
        let mu2 = blur.blur(&img2);

        let sub_scores = MsssimScale {
            avg_ssim: ssim_map(width, height, &mu1, &mu2, &sigma1_sq, &sigma2_sq, &sigma12),
            avg_edgediff: edge_diff_map(width, height, &img1, &mu1, &img2, &mu2),
        };
        debug!(
            "scale {} ({}x{}): ssim {:.6} {:.6} {:.6}, artifact {:.6} {:.6} {:.6}, detail lost {:.6} {:.6} {:.6}",
            scale,
            width,
            height,
            sub_scores.avg_ssim[0],
            sub_scores.avg_ssim[2],
            sub_scores.avg_ssim[4],
            sub_scores.avg_edgediff[0],
            sub_scores.avg_edgediff[4],
            sub_scores.avg_edgediff[8],
            sub_scores.avg_edgediff[2],
            sub_scores.avg_edgediff[6],
            sub_scores.avg_edgediff[10],
        );
        features.set_scale(scale, &sub_scores);
    }

    if !features.is_finite() {
        return Err(Ssimulacra2Error::DegenerateInput);
    }

    Ok(features)
}
