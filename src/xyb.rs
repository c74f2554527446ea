use crate::input::LinearImage;

const K_M02: f32 = 0.078f32;
const K_M00: f32 = 0.30f32;
const K_M01: f32 = 1.0f32 - K_M02 - K_M00;

const K_M12: f32 = 0.078f32;
const K_M10: f32 = 0.23f32;
const K_M11: f32 = 1.0f32 - K_M12 - K_M10;

const K_M20: f32 = 0.243_422_69_f32;
const K_M21: f32 = 0.204_767_45_f32;
const K_M22: f32 = 1.0f32 - K_M20 - K_M21;

const K_B0: f32 = 0.003_793_073_4_f32;
const K_B0_ROOT: f32 = 0.155_954_2_f32;

const OPSIN_ABSORBANCE_MATRIX: [f32; 9] = [
    K_M00, K_M01, K_M02, K_M10, K_M11, K_M12, K_M20, K_M21, K_M22,
];
const OPSIN_ABSORBANCE_BIAS: f32 = K_B0;
const OPSIN_ABSORBANCE_BIAS_ROOT: f32 = K_B0_ROOT;

/// Converts one linear RGB pixel to XYB.
#[inline]
#[must_use]
pub fn linear_rgb_to_xyb(px: [f32; 3]) -> [f32; 3] {
    let m = &OPSIN_ABSORBANCE_MATRIX;
    let [r, g, b] = px;

    let mixed = [
        m[0].mul_add(r, m[1].mul_add(g, m[2].mul_add(b, OPSIN_ABSORBANCE_BIAS))),
        m[3].mul_add(r, m[4].mul_add(g, m[5].mul_add(b, OPSIN_ABSORBANCE_BIAS))),
        m[6].mul_add(r, m[7].mul_add(g, m[8].mul_add(b, OPSIN_ABSORBANCE_BIAS))),
    ]
    .map(|v| v.max(0.0).cbrt() - OPSIN_ABSORBANCE_BIAS_ROOT);

    [
        0.5f32 * (mixed[0] - mixed[1]),
        0.5f32 * (mixed[0] + mixed[1]),
        mixed[2],
    ]
}

// Get all components in more or less 0..1 range
// Range of Rec2020 with these adjustments:
//  X: 0.017223..0.998838
//  Y: 0.010000..0.855303
//  B: 0.048759..0.989551
// Range of sRGB:
//  X: 0.204594..0.813402
//  Y: 0.010000..0.855308
//  B: 0.272295..0.938012
// The maximum pixel-wise difference has to be <= 1 for the ssim formula to make
// sense.
#[inline]
fn make_positive_xyb(xyb: [f32; 3]) -> [f32; 3] {
    let [x, y, b] = xyb;
    [x.mul_add(14.0, 0.42), y + 0.01, (b - y) + 0.55]
}

/// Converts a linear image into three planes of positive XYB, which is the
/// layout the blur and the error maps work on.
pub(crate) fn to_positive_xyb_planes(img: &LinearImage) -> [Vec<f32>; 3] {
    let size = img.width * img.height;
    let mut planes = [vec![0f32; size], vec![0f32; size], vec![0f32; size]];

    let [ref mut p0, ref mut p1, ref mut p2] = planes;
    for (((&px, o0), o1), o2) in img
        .data
        .iter()
        .zip(p0.iter_mut())
        .zip(p1.iter_mut())
        .zip(p2.iter_mut())
    {
        let [x, y, b] = make_positive_xyb(linear_rgb_to_xyb(px));
        *o0 = x;
        *o1 = y;
        *o2 = b;
    }

    planes
}
