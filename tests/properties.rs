use image::{imageops, GrayImage, Rgb, RgbImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ssimulacra2::{analyze, compute_ssimulacra2, ImageBuffer, Ssimulacra2Error};

fn random_texture(seed: u64, width: u32, height: u32) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

fn add_noise(img: &[u8], amplitude: i16, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    img.iter()
        .map(|&v| (i16::from(v) + rng.gen_range(-amplitude..=amplitude)).clamp(0, 255) as u8)
        .collect()
}

fn score_rgb(source: &RgbImage, distorted: &RgbImage) -> f64 {
    let (width, height) = source.dimensions();
    analyze(
        source.as_raw(),
        distorted.as_raw(),
        width as usize,
        height as usize,
    )
    .unwrap()
}

#[test]
fn identical_mid_grey_scores_100() {
    let img = vec![128u8; 64 * 64 * 3];
    let score = analyze(&img, &img, 64, 64).unwrap();
    assert!((score - 100.0).abs() < 1e-3, "{}", score);
}

#[test]
fn identical_images_score_100_for_every_sample_type() {
    let texture = random_texture(1, 40, 33);
    let score = score_rgb(&texture, &texture);
    assert!((score - 100.0).abs() < 1e-3, "{}", score);

    let wide: Vec<u16> = texture.as_raw().iter().map(|&v| u16::from(v) * 257).collect();
    let score = analyze(&wide, &wide, 40, 33).unwrap();
    assert!((score - 100.0).abs() < 1e-3, "{}", score);

    let float: Vec<f32> = texture
        .as_raw()
        .iter()
        .map(|&v| f32::from(v) / 255.0)
        .collect();
    let score = analyze(&float, &float, 40, 33).unwrap();
    assert!((score - 100.0).abs() < 1e-3, "{}", score);
}

#[test]
fn noise_lowers_the_score() {
    let source = random_texture(2, 64, 64);
    let noisy = add_noise(source.as_raw(), 20, 3);
    let score = analyze(source.as_raw(), &noisy, 64, 64).unwrap();
    assert!(score < 95.0, "{}", score);
    assert!(score > 0.0, "{}", score);
}

#[test]
fn light_noise_on_flat_grey_is_noticed() {
    let source = vec![128u8; 64 * 64 * 3];
    let noisy = add_noise(&source, 6, 4);
    let score = analyze(&source, &noisy, 64, 64).unwrap();
    assert!(score < 95.0, "{}", score);
    assert!(score > 0.0, "{}", score);
}

#[test]
fn stronger_noise_scores_lower() {
    let source = random_texture(5, 96, 80);
    let scores: Vec<f64> = [2, 5, 10, 20, 40]
        .iter()
        .map(|&amplitude| {
            let noisy = add_noise(source.as_raw(), amplitude, 6);
            analyze(source.as_raw(), &noisy, 96, 80).unwrap()
        })
        .collect();
    assert!(scores.windows(2).all(|w| w[1] < w[0]), "{:?}", scores);
}

#[test]
fn coarser_quantization_tends_to_score_lower() {
    let source = random_texture(7, 128, 96);
    let scores: Vec<f64> = [2u8, 4, 8, 16, 32, 64]
        .iter()
        .map(|&step| {
            let quantized = RgbImage::from_fn(128, 96, |x, y| {
                let Rgb(px) = *source.get_pixel(x, y);
                Rgb(px.map(|v| v / step * step + step / 2))
            });
            score_rgb(&source, &quantized)
        })
        .collect();

    let ordered = scores.windows(2).filter(|w| w[1] <= w[0]).count();
    assert!(ordered >= 4, "{:?}", scores);
    assert!(scores[scores.len() - 1] < scores[0], "{:?}", scores);
}

#[test]
fn blurred_image_scores_below_100() {
    let source = random_texture(8, 64, 48);
    let blurred = imageops::blur(&source, 1.0);
    let score = score_rgb(&source, &blurred);
    assert!(score.is_finite());
    assert!(score < 90.0, "{}", score);
}

#[test]
fn score_is_not_symmetric() {
    let source = random_texture(9, 64, 64);
    let blurred = imageops::blur(&source, 2.0);
    let forward = score_rgb(&source, &blurred);
    let backward = score_rgb(&blurred, &source);
    assert!((forward - backward).abs() > 1e-3, "{} vs {}", forward, backward);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let source = random_texture(10, 72, 56);
    let noisy = add_noise(source.as_raw(), 12, 11);
    let first = analyze(source.as_raw(), &noisy, 72, 56).unwrap();
    for _ in 0..3 {
        let again = analyze(source.as_raw(), &noisy, 72, 56).unwrap();
        assert_eq!(first.to_bits(), again.to_bits());
    }
}

#[test]
fn buffers_of_different_size_are_rejected() {
    let a = ImageBuffer::new(vec![0u8; 16 * 16 * 3], 16, 16, 3).unwrap();
    let b = ImageBuffer::new(vec![0u8; 16 * 17 * 3], 16, 17, 3).unwrap();
    assert_eq!(
        compute_ssimulacra2(&a, &b),
        Err(Ssimulacra2Error::DimensionMismatch)
    );
    assert_eq!(
        analyze(a.samples(), b.samples(), 16, 16),
        Err(Ssimulacra2Error::DimensionMismatch)
    );
}

#[test]
fn tiny_images_are_degenerate() {
    for size in [1usize, 2, 7] {
        let img = vec![200u8; size * size * 3];
        assert_eq!(
            analyze(&img, &img, size, size),
            Err(Ssimulacra2Error::DegenerateInput),
            "{}x{}",
            size,
            size
        );
    }
}

#[test]
fn out_of_range_floats_are_rejected() {
    let mut img = vec![0.5f32; 16 * 16 * 3];
    let mut distorted = img.clone();
    distorted[17] = 1.25;
    assert_eq!(
        analyze(&img, &distorted, 16, 16),
        Err(Ssimulacra2Error::SampleOutOfRange { index: 17 })
    );

    img[3] = f32::NAN;
    assert_eq!(
        analyze(&img, &img, 16, 16),
        Err(Ssimulacra2Error::SampleOutOfRange { index: 3 })
    );
}

#[test]
fn unsupported_layouts_are_rejected() {
    let img = vec![0u8; 16 * 16 * 2];
    assert_eq!(
        analyze(&img, &img, 16, 16),
        Err(Ssimulacra2Error::UnsupportedChannelLayout(2))
    );
}

#[test]
fn decoded_layouts_score_alike() {
    let source = random_texture(12, 48, 40);
    let noisy = RgbImage::from_raw(48, 40, add_noise(source.as_raw(), 10, 13)).unwrap();
    let rgb = score_rgb(&source, &noisy);

    let with_alpha = |img: &RgbImage| {
        RgbaImage::from_fn(48, 40, |x, y| {
            let Rgb([r, g, b]) = *img.get_pixel(x, y);
            Rgba([r, g, b, 255])
        })
    };
    let rgba = analyze(
        with_alpha(&source).as_raw(),
        with_alpha(&noisy).as_raw(),
        48,
        40,
    )
    .unwrap();
    assert_eq!(rgb.to_bits(), rgba.to_bits());

    let gray_source = GrayImage::from_fn(48, 40, |x, y| image::Luma([source.get_pixel(x, y)[1]]));
    let gray_noisy = GrayImage::from_fn(48, 40, |x, y| image::Luma([noisy.get_pixel(x, y)[1]]));
    let gray = analyze(gray_source.as_raw(), gray_noisy.as_raw(), 48, 40).unwrap();
    assert!(gray < 100.0, "{}", gray);
}

#[test]
fn sample_types_score_the_same_image_alike() {
    let source = random_texture(14, 32, 32);
    let noisy = add_noise(source.as_raw(), 15, 15);
    let narrow = analyze(source.as_raw(), &noisy, 32, 32).unwrap();

    let widen = |v: &[u8]| -> Vec<u16> { v.iter().map(|&s| u16::from(s) * 257).collect() };
    let wide = analyze(&widen(source.as_raw()), &widen(&noisy), 32, 32).unwrap();
    assert_eq!(narrow.to_bits(), wide.to_bits(), "{} vs {}", narrow, wide);

    let to_float = |v: &[u8]| -> Vec<f32> { v.iter().map(|&s| f32::from(s) / 255.0).collect() };
    let float = analyze(&to_float(source.as_raw()), &to_float(&noisy), 32, 32).unwrap();
    assert!((narrow - float).abs() < 0.5, "{} vs {}", narrow, float);
}

#[test]
fn huge_dimensions_are_rejected() {
    let img = [0u8; 6];
    assert!(matches!(
        analyze(&img, &img, usize::MAX / 2 + 2, 2),
        Err(Ssimulacra2Error::InvalidBufferLength { .. })
    ));
    assert!(matches!(
        ImageBuffer::new(vec![0u8; 3], usize::MAX, 2, 3),
        Err(Ssimulacra2Error::InvalidBufferLength { .. })
    ));
}
