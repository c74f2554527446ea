mod consts {
    #![allow(clippy::unreadable_literal)]
    #![allow(clippy::excessive_precision)]
    include!(concat!(env!("OUT_DIR"), "/recursive_gaussian.rs"));
}

/// Implements "Recursive Implementation of the Gaussian Filter Using Truncated
/// Cosine Functions" by Charalampidis [2016].
///
/// The recursion is an FIR filter in disguise: every output depends only on
/// inputs within `RADIUS - 1` of it. Rows are extended by `RADIUS` replicated
/// edge samples on each side before filtering, so the borders see the edge
/// value instead of zero.
pub struct RecursiveGaussian;

impl RecursiveGaussian {
    #[inline(always)]
    pub fn horizontal_pass(&self, input: &[f32], output: &mut [f32], width: usize) {
        assert_eq!(input.len(), output.len());

        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            input
                .par_chunks_exact(width)
                .zip(output.par_chunks_exact_mut(width))
                .for_each(|(input, output)| self.horizontal_row(input, output, width));
        }

        #[cfg(not(feature = "rayon"))]
        {
            input
                .chunks_exact(width)
                .zip(output.chunks_exact_mut(width))
                .for_each(|(input, output)| self.horizontal_row(input, output, width));
        }
    }

    #[inline(always)]
    fn horizontal_row(&self, input: &[f32], output: &mut [f32], width: usize) {
        let big_n = consts::RADIUS as isize;
        let pad = big_n;
        let width = width as isize;

        let [mul_in_1, mul_in_3, mul_in_5] = [consts::MUL_IN_1, consts::MUL_IN_3, consts::MUL_IN_5];
        let [mul_prev_1, mul_prev_3, mul_prev_5] =
            [consts::MUL_PREV_1, consts::MUL_PREV_3, consts::MUL_PREV_5];
        let mul_prev2 = consts::MUL_PREV2;

        // Replicated inside [-pad, width + pad), zero beyond.
        let sample = |i: isize| -> f32 {
            if i < -pad || i >= width + pad {
                0f32
            } else {
                input[i.clamp(0, width - 1) as usize]
            }
        };

        let mut prev = [0f32; 3];
        let mut prev2 = [0f32; 3];

        let mut n = -pad - big_n + 1;
        while n < width {
            let sum = sample(n - big_n - 1) + sample(n + big_n - 1);

            let mut out = [sum * mul_in_1, sum * mul_in_3, sum * mul_in_5];

            out[0] = mul_prev2.mul_add(prev2[0], out[0]);
            out[1] = mul_prev2.mul_add(prev2[1], out[1]);
            out[2] = mul_prev2.mul_add(prev2[2], out[2]);

            prev2 = prev;

            out[0] = mul_prev_1.mul_add(prev[0], out[0]);
            out[1] = mul_prev_3.mul_add(prev[1], out[1]);
            out[2] = mul_prev_5.mul_add(prev[2], out[2]);

            prev = out;

            if n >= 0 {
                output[n as usize] = out[0] + out[1] + out[2];
            }

            n += 1;
        }
    }

    #[inline(always)]
    fn transpose(&self, input: &[f32], output: &mut [f32], width: usize, height: usize) {
        assert_eq!(input.len(), width * height);
        assert_eq!(output.len(), width * height);

        for y in 0..height {
            for x in 0..width {
                output[x * height + y] = input[y * width + x];
            }
        }
    }

    /// Filters columns by transposing, running the row filter, and
    /// transposing back. The two scratch buffers must hold `width * height`
    /// samples.
    #[inline(always)]
    pub fn vertical_pass(
        &self,
        input: &[f32],
        output: &mut [f32],
        width: usize,
        height: usize,
        transposed_input: &mut [f32],
        transposed_output: &mut [f32],
    ) {
        let size = width * height;
        assert_eq!(input.len(), size);
        assert_eq!(output.len(), size);

        self.transpose(input, transposed_input, width, height);
        self.horizontal_pass(transposed_input, transposed_output, height);
        self.transpose(transposed_output, output, height, width);
    }
}
