use crate::input::LinearImage;

/// Halves both dimensions (rounding up) by averaging 2x2 blocks. Blocks that
/// hang over the right or bottom edge reuse the last column or row.
pub(crate) fn downscale_by_2(in_data: &LinearImage) -> LinearImage {
    const SCALE: usize = 2;
    let in_w = in_data.width;
    let in_h = in_data.height;
    let out_w = (in_w + SCALE - 1) / SCALE;
    let out_h = (in_h + SCALE - 1) / SCALE;
    let mut out_data = vec![[0.0f32; 3]; out_w * out_h];
    let normalize = 1f32 / (SCALE * SCALE) as f32;

    let in_data = &in_data.data;
    for oy in 0..out_h {
        for ox in 0..out_w {
            let out_pix = &mut out_data[oy * out_w + ox];
            for iy in 0..SCALE {
                for ix in 0..SCALE {
                    let x = (ox * SCALE + ix).min(in_w - 1);
                    let y = (oy * SCALE + iy).min(in_h - 1);
                    let in_pix = in_data[y * in_w + x];

                    out_pix[0] += in_pix[0];
                    out_pix[1] += in_pix[1];
                    out_pix[2] += in_pix[2];
                }
            }
            for c in out_pix.iter_mut() {
                *c *= normalize;
            }
        }
    }

    LinearImage::new(out_data, out_w, out_h)
}
