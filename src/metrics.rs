/// Sub-scores of a single scale, as produced by [`ssim_map`] and
/// [`edge_diff_map`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MsssimScale {
    /// Per channel: 1-norm and 4-norm of `1 - SSIM`.
    pub avg_ssim: [f64; 3 * 2],
    /// Per channel: 1-norm and 4-norm of the artifact map, then 1-norm and
    /// 4-norm of the detail-lost map.
    pub avg_edgediff: [f64; 3 * 4],
}

pub(crate) fn image_multiply(img1: &[Vec<f32>; 3], img2: &[Vec<f32>; 3], out: &mut [Vec<f32>; 3]) {
    for ((plane1, plane2), out_plane) in img1.iter().zip(img2.iter()).zip(out.iter_mut()) {
        for ((&p1, &p2), o) in plane1.iter().zip(plane2.iter()).zip(out_plane.iter_mut()) {
            *o = p1 * p2;
        }
    }
}

/// Runs `f` once per channel and collects the results in channel order.
fn per_channel<const N: usize, F>(f: F) -> [[f64; N]; 3]
where
    F: Fn(usize) -> [f64; N] + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;

        let mut out = [[0f64; N]; 3];
        out[..]
            .par_iter_mut()
            .enumerate()
            .for_each(|(c, o)| *o = f(c));
        out
    }

    #[cfg(not(feature = "rayon"))]
    {
        [f(0), f(1), f(2)]
    }
}

/// Turns a plane's sum and sum of fourth powers into the 1-norm and 4-norm.
#[inline]
fn norms(sum: f64, sum_pow4: f64, one_per_pixels: f64) -> [f64; 2] {
    [
        one_per_pixels * sum,
        (one_per_pixels * sum_pow4).sqrt().sqrt(),
    ]
}

pub(crate) fn ssim_map(
    width: usize,
    height: usize,
    m1: &[Vec<f32>; 3],
    m2: &[Vec<f32>; 3],
    s11: &[Vec<f32>; 3],
    s22: &[Vec<f32>; 3],
    s12: &[Vec<f32>; 3],
) -> [f64; 3 * 2] {
    const C2: f32 = 0.0009f32;

    let one_per_pixels = 1.0f64 / (width * height) as f64;

    let per_plane = per_channel(|c| {
        let mut sum1 = [0.0f64; 2];
        for (row_m1, (row_m2, (row_s11, (row_s22, row_s12)))) in m1[c].chunks_exact(width).zip(
            m2[c].chunks_exact(width).zip(
                s11[c]
                    .chunks_exact(width)
                    .zip(s22[c].chunks_exact(width).zip(s12[c].chunks_exact(width))),
            ),
        ) {
            for x in 0..width {
                let mu1 = row_m1[x];
                let mu2 = row_m2[x];
                let mu11 = mu1 * mu1;
                let mu22 = mu2 * mu2;
                let mu12 = mu1 * mu2;
                let mu_diff = mu1 - mu2;

                // The classic luminance term 2 * mu1 * mu2 / (mu1^2 + mu2^2)
                // equals 1 - (mu1 - mu2)^2 / (mu1^2 + mu2^2). XYB is already
                // perceptually uniform, so the denominator would only make
                // errors in the darks (and in arbitrary chroma directions)
                // weigh more. It is dropped, and C1 with it.
                let num_m = mu_diff.mul_add(-mu_diff, 1.0f32);
                let num_s = 2f32.mul_add(row_s12[x] - mu12, C2);
                let denom_s = (row_s11[x] - mu11) + (row_s22[x] - mu22) + C2;
                // 1 - SSIM is an error score, which makes an L4 norm meaningful.
                let mut d = 1.0f64 - f64::from((num_m * num_s) / denom_s);
                d = d.max(0.0);
                sum1[0] += d;
                sum1[1] += d.powi(4);
            }
        }
        norms(sum1[0], sum1[1], one_per_pixels)
    });

    let mut plane_averages = [0f64; 3 * 2];
    for (c, avg) in per_plane.iter().enumerate() {
        plane_averages[c * 2..c * 2 + 2].copy_from_slice(avg);
    }
    plane_averages
}

pub(crate) fn edge_diff_map(
    width: usize,
    height: usize,
    img1: &[Vec<f32>; 3],
    mu1: &[Vec<f32>; 3],
    img2: &[Vec<f32>; 3],
    mu2: &[Vec<f32>; 3],
) -> [f64; 3 * 4] {
    let one_per_pixels = 1.0f64 / (width * height) as f64;

    let per_plane = per_channel(|c| {
        let mut sum1 = [0.0f64; 4];
        for (row1, (row2, (rowm1, rowm2))) in img1[c].chunks_exact(width).zip(
            img2[c]
                .chunks_exact(width)
                .zip(mu1[c].chunks_exact(width).zip(mu2[c].chunks_exact(width))),
        ) {
            for x in 0..width {
                let d1: f64 = (1.0 + f64::from((row2[x] - rowm2[x]).abs()))
                    / (1.0 + f64::from((row1[x] - rowm1[x]).abs()))
                    - 1.0;

                // d1 > 0: distorted has an edge where original is smooth
                //         (ringing, color banding, blockiness)
                let artifact = d1.max(0.0);
                sum1[0] += artifact;
                sum1[1] += artifact.powi(4);

                // d1 < 0: original has an edge where distorted is smooth
                //         (smoothing, blurring, smearing)
                let detail_lost = (-d1).max(0.0);
                sum1[2] += detail_lost;
                sum1[3] += detail_lost.powi(4);
            }
        }
        let [artifact, artifact_4] = norms(sum1[0], sum1[1], one_per_pixels);
        let [detail_lost, detail_lost_4] = norms(sum1[2], sum1[3], one_per_pixels);
        [artifact, artifact_4, detail_lost, detail_lost_4]
    });

    let mut plane_averages = [0f64; 3 * 4];
    for (c, avg) in per_plane.iter().enumerate() {
        plane_averages[c * 4..c * 4 + 4].copy_from_slice(avg);
    }
    plane_averages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planes(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> [Vec<f32>; 3] {
        let plane: Vec<f32> = (0..width * height)
            .map(|i| f(i % width, i / width))
            .collect();
        [plane.clone(), plane.clone(), plane]
    }

    #[test]
    fn identical_statistics_have_zero_ssim_error() {
        let (w, h) = (6, 4);
        let mu = planes(w, h, |x, y| 0.1 * (x + y) as f32);
        let s11 = planes(w, h, |x, y| {
            let m = 0.1 * (x + y) as f32;
            m * m + 0.01 * x as f32
        });
        let avg = ssim_map(w, h, &mu, &mu, &s11, &s11, &s11);
        assert!(avg.iter().all(|&v| v == 0.0), "{:?}", avg);
    }

    #[test]
    fn mean_shift_is_penalized() {
        let (w, h) = (8, 8);
        let mu1 = planes(w, h, |_, _| 0.5);
        let mu2 = planes(w, h, |_, _| 0.25);
        let s11 = planes(w, h, |_, _| 0.25);
        let s22 = planes(w, h, |_, _| 0.0625);
        let s12 = planes(w, h, |_, _| 0.125);
        let avg = ssim_map(w, h, &mu1, &mu2, &s11, &s22, &s12);
        // 1 - (1 - 0.25^2) with zero variance everywhere.
        for c in 0..3 {
            assert!((avg[c * 2] - 0.0625).abs() < 1e-6, "{:?}", avg);
            assert!((avg[c * 2 + 1] - 0.0625).abs() < 1e-6, "{:?}", avg);
        }
    }

    #[test]
    fn edge_maps_separate_artifacts_from_blur() {
        let (w, h) = (4, 4);
        let flat = planes(w, h, |_, _| 0.5);
        let edgy = planes(w, h, |x, _| if x % 2 == 0 { 0.6 } else { 0.4 });

        // Distorted has edges the source lacks.
        let ringing = edge_diff_map(w, h, &flat, &flat, &edgy, &flat);
        for c in 0..3 {
            assert!((ringing[c * 4] - 0.1).abs() < 1e-6, "{:?}", ringing);
            assert!((ringing[c * 4 + 1] - 0.1).abs() < 1e-6);
            assert_eq!(ringing[c * 4 + 2], 0.0);
            assert_eq!(ringing[c * 4 + 3], 0.0);
        }

        // Source has edges the distorted lacks.
        let blurred = edge_diff_map(w, h, &edgy, &flat, &flat, &flat);
        for c in 0..3 {
            assert_eq!(blurred[c * 4], 0.0);
            assert!((blurred[c * 4 + 2] - (1.0 - 1.0 / 1.1)).abs() < 1e-6, "{:?}", blurred);
        }
    }

    #[test]
    fn four_norm_emphasizes_local_errors() {
        let (w, h) = (8, 8);
        let flat = planes(w, h, |_, _| 0.5);
        let spot = planes(w, h, |x, y| if x == 3 && y == 3 { 1.5 } else { 0.5 });
        let avg = edge_diff_map(w, h, &flat, &flat, &spot, &flat);
        assert!(avg[1] > 10.0 * avg[0], "{:?}", avg);
    }

    #[test]
    fn multiply_is_elementwise() {
        let a = planes(3, 1, |x, _| x as f32);
        let b = planes(3, 1, |_, _| 2.0);
        let mut out = planes(3, 1, |_, _| 0.0);
        image_multiply(&a, &b, &mut out);
        assert_eq!(out[2], vec![0.0, 2.0, 4.0]);
    }
}
