//! Input buffers and their conversion to linear RGB.
//!
//! | Sample | Encoding | Normalization |
//! |--------|----------|---------------|
//! | `u8`   | sRGB     | `/255`, via lookup table |
//! | `u16`  | sRGB     | `/65535` |
//! | `f32`  | sRGB     | none, must be finite and within `[0, 1]` |
//!
//! Greyscale is replicated to all three channels and alpha is dropped.

use num_traits::{AsPrimitive, Bounded};

use crate::Ssimulacra2Error;

mod srgb {
    #![allow(clippy::unreadable_literal)]
    #![allow(clippy::excessive_precision)]
    include!(concat!(env!("OUT_DIR"), "/srgb_table.rs"));
}

/// Inverse of the sRGB transfer function.
///
/// Evaluated in double precision, like the 8-bit lookup table, so every
/// sample type decodes the same code value to the same linear value.
#[inline]
#[must_use]
pub fn srgb_to_linear(v: f32) -> f32 {
    srgb_to_linear_f64(f64::from(v)) as f32
}

#[inline]
fn srgb_to_linear_f64(v: f64) -> f64 {
    if v <= 0.04045f64 {
        v / 12.92f64
    } else {
        ((v + 0.055f64) / 1.055f64).powf(2.4f64)
    }
}

mod private {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for f32 {}
}

/// A single sRGB-encoded channel value accepted by the metric.
pub trait Sample: Copy + Send + Sync + private::Sealed {
    /// Whether the value can be interpreted at all.
    fn in_range(self) -> bool;

    /// Decodes the value to linear light in `[0, 1]`.
    fn to_linear(self) -> f32;
}

impl Sample for u8 {
    #[inline]
    fn in_range(self) -> bool {
        true
    }

    #[inline]
    fn to_linear(self) -> f32 {
        srgb::FROM_SRGB8_TABLE[usize::from(self)]
    }
}

impl Sample for u16 {
    #[inline]
    fn in_range(self) -> bool {
        true
    }

    #[inline]
    fn to_linear(self) -> f32 {
        srgb_to_linear_f64(normalize_int(self)) as f32
    }
}

impl Sample for f32 {
    #[inline]
    fn in_range(self) -> bool {
        self.is_finite() && (0.0..=1.0).contains(&self)
    }

    #[inline]
    fn to_linear(self) -> f32 {
        srgb_to_linear(self)
    }
}

#[inline]
fn normalize_int<T: AsPrimitive<f64> + Bounded>(v: T) -> f64 {
    v.as_() / T::max_value().as_()
}

/// Interleaved channel layouts understood by the metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Gray,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    /// Maps a channel count to its layout.
    ///
    /// # Errors
    /// - If `channels` is not 1, 3 or 4
    pub const fn from_channels(channels: usize) -> Result<Self, Ssimulacra2Error> {
        match channels {
            1 => Ok(Self::Gray),
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            other => Err(Ssimulacra2Error::UnsupportedChannelLayout(other)),
        }
    }

    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// An interleaved, row-major image as handed over by a decoder.
#[derive(Debug, Clone)]
pub struct ImageBuffer<S: Sample> {
    samples: Vec<S>,
    width: usize,
    height: usize,
    layout: ChannelLayout,
}

impl<S: Sample> ImageBuffer<S> {
    /// Wraps decoded samples.
    ///
    /// Sample values are checked later, when the buffer is scored.
    ///
    /// # Errors
    /// - If `width` or `height` is zero
    /// - If `channels` is not 1, 3 or 4
    /// - If `samples.len() != width * height * channels`
    pub fn new(
        samples: Vec<S>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, Ssimulacra2Error> {
        if width == 0 || height == 0 {
            return Err(Ssimulacra2Error::DegenerateInput);
        }
        let layout = ChannelLayout::from_channels(channels)?;
        let expected = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(channels));
        if expected != Some(samples.len()) {
            return Err(Ssimulacra2Error::InvalidBufferLength {
                expected: expected.unwrap_or(usize::MAX),
                actual: samples.len(),
            });
        }

        Ok(Self {
            samples,
            width,
            height,
            layout,
        })
    }

    /// Wraps decoded samples, inferring the channel layout from the length.
    ///
    /// # Errors
    /// - If `width` or `height` is zero
    /// - If the length is not `width * height` times 1, 3 or 4
    pub fn with_inferred_layout(
        samples: Vec<S>,
        width: usize,
        height: usize,
    ) -> Result<Self, Ssimulacra2Error> {
        let layout = infer_layout(samples.len(), width, height)?;
        Ok(Self {
            samples,
            width,
            height,
            layout,
        })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn layout(&self) -> ChannelLayout {
        self.layout
    }

    #[must_use]
    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    /// Checks every sample against the range its type allows.
    ///
    /// # Errors
    /// - If a sample is out of range, reporting the first offending index
    pub fn validate(&self) -> Result<(), Ssimulacra2Error> {
        check_samples(&self.samples)
    }

    /// Removes the sRGB encoding, producing a three-channel linear image.
    pub(crate) fn to_linear(&self) -> LinearImage {
        linearize(&self.samples, self.layout, self.width, self.height)
    }
}

/// Derives the channel layout of an interleaved buffer from its length.
pub(crate) fn infer_layout(
    len: usize,
    width: usize,
    height: usize,
) -> Result<ChannelLayout, Ssimulacra2Error> {
    if width == 0 || height == 0 {
        return Err(Ssimulacra2Error::DegenerateInput);
    }
    let Some(pixels) = width.checked_mul(height) else {
        return Err(Ssimulacra2Error::InvalidBufferLength {
            expected: usize::MAX,
            actual: len,
        });
    };
    if len % pixels != 0 {
        return Err(Ssimulacra2Error::InvalidBufferLength {
            expected: pixels.saturating_mul(3),
            actual: len,
        });
    }
    ChannelLayout::from_channels(len / pixels)
}

pub(crate) fn check_samples<S: Sample>(samples: &[S]) -> Result<(), Ssimulacra2Error> {
    match samples.iter().position(|&s| !s.in_range()) {
        Some(index) => Err(Ssimulacra2Error::SampleOutOfRange { index }),
        None => Ok(()),
    }
}

pub(crate) fn linearize<S: Sample>(
    samples: &[S],
    layout: ChannelLayout,
    width: usize,
    height: usize,
) -> LinearImage {
    let channels = layout.channels();
    debug_assert_eq!(samples.len(), width * height * channels);

    let convert = |px: &[S]| -> [f32; 3] {
        if channels == 1 {
            let luma = px[0].to_linear();
            [luma, luma, luma]
        } else {
            [px[0].to_linear(), px[1].to_linear(), px[2].to_linear()]
        }
    };

    #[cfg(feature = "rayon")]
    let data = {
        use rayon::prelude::*;
        samples.par_chunks_exact(channels).map(convert).collect()
    };

    #[cfg(not(feature = "rayon"))]
    let data = samples.chunks_exact(channels).map(convert).collect();

    LinearImage::new(data, width, height)
}

/// Linear-light RGB, one `[f32; 3]` per pixel.
#[derive(Debug, Clone)]
pub struct LinearImage {
    pub(crate) data: Vec<[f32; 3]>,
    pub(crate) width: usize,
    pub(crate) height: usize,
}

impl LinearImage {
    pub(crate) fn new(data: Vec<[f32; 3]>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }
}

impl From<&yuvxyb::LinearRgb> for LinearImage {
    fn from(rgb: &yuvxyb::LinearRgb) -> Self {
        Self::new(rgb.data().to_vec(), rgb.width(), rgb.height())
    }
}
