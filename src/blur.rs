mod gaussian;

use gaussian::RecursiveGaussian;

/// Structure handling image blur.
///
/// This struct contains the necessary buffers and the kernel used for blurring
/// (currently a recursive approximation of the Gaussian filter, sigma 1.5,
/// with replicated borders).
///
/// Note that the width and height of the image passed to [blur][Self::blur] needs to exactly
/// match the width and height of this instance. If you reduce the image size (e.g. via
/// downscaling), [`shrink_to`][Self::shrink_to] can be used to resize the internal buffers.
pub struct Blur {
    kernel: RecursiveGaussian,
    temp: Vec<f32>,
    transposed_input: Vec<f32>,
    transposed_output: Vec<f32>,
    width: usize,
    height: usize,
}

impl Blur {
    /// Create a new [Blur] for images of the given width and height.
    /// This pre-allocates the necessary buffers.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Blur {
            kernel: RecursiveGaussian,
            temp: vec![0.0f32; size],
            transposed_input: vec![0.0f32; size],
            transposed_output: vec![0.0f32; size],
            width,
            height,
        }
    }

    /// Truncates the internal buffers to fit images of the given width and height.
    ///
    /// This will [truncate][Vec::truncate] the internal buffers
    /// without affecting the allocated memory.
    ///
    /// # Panics
    /// If the new size is larger than the current one.
    pub fn shrink_to(&mut self, width: usize, height: usize) {
        assert!(width * height <= self.width * self.height);

        let size = width * height;
        self.temp.truncate(size);
        self.transposed_input.truncate(size);
        self.transposed_output.truncate(size);
        self.width = width;
        self.height = height;
    }

    /// Blur the given image.
    ///
    /// # Panics
    /// If any plane does not hold exactly `width * height` samples.
    pub fn blur(&mut self, img: &[Vec<f32>; 3]) -> [Vec<f32>; 3] {
        [
            self.blur_plane(&img[0]),
            self.blur_plane(&img[1]),
            self.blur_plane(&img[2]),
        ]
    }

    fn blur_plane(&mut self, plane: &[f32]) -> Vec<f32> {
        let mut out = vec![0f32; self.width * self.height];
        self.kernel.horizontal_pass(plane, &mut self.temp, self.width);
        self.kernel.vertical_pass(
            &self.temp,
            &mut out,
            self.width,
            self.height,
            &mut self.transposed_input,
            &mut self.transposed_output,
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_keeps_flat_planes_flat() {
        let (width, height) = (23, 17);
        let img = [
            vec![0.1f32; width * height],
            vec![0.5f32; width * height],
            vec![0.9f32; width * height],
        ];
        let mut blur = Blur::new(width, height);
        let out = blur.blur(&img);

        for (plane, expected) in out.iter().zip([0.1f32, 0.5, 0.9]) {
            assert_eq!(plane.len(), width * height);
            for &v in plane {
                assert!((v - expected).abs() < 1e-4, "{} vs {}", v, expected);
            }
        }
    }

    #[test]
    fn blur_smooths_a_step() {
        let (width, height) = (16, 8);
        let step: Vec<f32> = (0..width * height)
            .map(|i| if i % width < width / 2 { 0.0 } else { 1.0 })
            .collect();
        let img = [step.clone(), step.clone(), step];
        let out = Blur::new(width, height).blur(&img);

        let row = &out[1][3 * width..4 * width];
        assert!(row[0].abs() < 1e-4);
        assert!((row[width - 1] - 1.0).abs() < 1e-4);
        assert!(row[width / 2 - 1] > 0.1 && row[width / 2 - 1] < 0.5);
        assert!(row[width / 2] > 0.5 && row[width / 2] < 0.9);
        assert!(row.windows(2).all(|w| w[1] >= w[0] - 1e-3));
    }

    #[test]
    fn shrink_to_reuses_buffers() {
        let mut blur = Blur::new(32, 32);
        blur.shrink_to(16, 8);
        let img = [vec![0.3f32; 128], vec![0.3f32; 128], vec![0.3f32; 128]];
        let out = blur.blur(&img);
        assert!(out.iter().all(|plane| plane.len() == 128));
    }
}
