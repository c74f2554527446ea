use crate::metrics::MsssimScale;

/// How often to downscale and score the input images.
/// Each scaling step will downscale by a factor of two.
pub const NUM_SCALES: usize = 6;

/// One entry per channel, scale, norm and error map.
pub const NUM_FEATURES: usize = 3 * NUM_SCALES * 2 * 3;

/// The three error maps scored at every scale, in weight-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMap {
    /// `1 - SSIM`.
    Ssim = 0,
    /// Edges in the distorted image that the source lacks.
    Artifact = 1,
    /// Edges in the source that the distorted image lacks.
    DetailLost = 2,
}

/// The complete set of sub-scores the final score is computed from.
///
/// Every sub-score has a fixed slot, see [`FeatureVector::index`]. Scales
/// that were not computed because the image ran out of pixels keep their
/// slots at zero. Weights are handed out in order over the computed scales
/// only, so a small image uses the leading part of each channel's weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; NUM_FEATURES],
    scales: usize,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: [0f64; NUM_FEATURES],
            scales: 0,
        }
    }
}

impl FeatureVector {
    /// Slot of a sub-score. `norm` is 0 for the 1-norm and 1 for the 4-norm.
    ///
    /// # Panics
    /// If `channel`, `scale` or `norm` is out of range.
    #[must_use]
    pub fn index(channel: usize, scale: usize, norm: usize, map: ErrorMap) -> usize {
        assert!(channel < 3 && scale < NUM_SCALES && norm < 2);
        channel * NUM_SCALES * 6 + scale * 6 + norm * 3 + map as usize
    }

    pub(crate) fn set_scale(&mut self, scale: usize, sub_scores: &MsssimScale) {
        for c in 0..3 {
            for n in 0..2 {
                self.values[Self::index(c, scale, n, ErrorMap::Ssim)] = sub_scores.avg_ssim[c * 2 + n];
                self.values[Self::index(c, scale, n, ErrorMap::Artifact)] =
                    sub_scores.avg_edgediff[c * 4 + n];
                self.values[Self::index(c, scale, n, ErrorMap::DetailLost)] =
                    sub_scores.avg_edgediff[c * 4 + n + 2];
            }
        }
        self.scales = self.scales.max(scale + 1);
    }

    /// Number of scales that contributed sub-scores.
    #[must_use]
    pub const fn scales(&self) -> usize {
        self.scales
    }

    #[must_use]
    pub fn get(&self, channel: usize, scale: usize, norm: usize, map: ErrorMap) -> f64 {
        self.values[Self::index(channel, scale, norm, map)]
    }

    #[must_use]
    pub const fn as_array(&self) -> &[f64; NUM_FEATURES] {
        &self.values
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// The weighted sum of the sub-scores, before any remapping.
    #[must_use]
    pub fn weighted_sum(&self) -> f64 {
        let mut ssim = 0.0f64;

        let mut i = 0usize;
        for c in 0..3 {
            for scale in 0..self.scales {
                for n in 0..2 {
                    for map in [ErrorMap::Ssim, ErrorMap::Artifact, ErrorMap::DetailLost] {
                        ssim = WEIGHT[i].mul_add(self.get(c, scale, n, map).abs(), ssim);
                        i += 1;
                    }
                }
            }
        }

        ssim
    }

    /// The final score: 100 for identical images, lower for larger
    /// differences, possibly negative.
    #[must_use]
    pub fn score(&self) -> f64 {
        remap(self.weighted_sum())
    }
}

/// Monotonic mapping of the weighted sum onto the score scale.
#[must_use]
pub fn remap(weighted_sum: f64) -> f64 {
    let mut ssim = weighted_sum * 0.956_238_261_683_484_4_f64;
    ssim = (6.248_496_625_763_138e-5 * ssim * ssim).mul_add(
        ssim,
        2.326_765_642_916_932f64.mul_add(ssim, -0.020_884_521_182_843_837 * ssim * ssim),
    );

    if ssim > 0.0f64 {
        ssim.powf(0.627_633_646_783_138_7)
            .mul_add(-10.0f64, 100.0f64)
    } else {
        100.0f64
    }
}

// The final score is based on a weighted sum of 108 sub-scores:
// - for 6 scales (1:1 to 1:32, downsampled in linear RGB)
// - for 3 components (X, Y, B-Y, rescaled to 0..1 range)
// - using 2 norms (the 1-norm and the 4-norm)
// - over 3 error maps:
//     - SSIM' (SSIM without the spurious gamma correction term)
//     - "ringing" (distorted edges where there are no orig edges)
//     - "blurring" (orig edges where there are no distorted edges)
// The weights were obtained by running Nelder-Mead simplex search,
// optimizing to minimize MSE for the CID22 training set and to
// maximize Kendall rank correlation (and with a lower weight,
// also Pearson correlation) with the CID22 training set and the
// TID2013, Kadid10k and KonFiG-IQA datasets.
// Validation was done on the CID22 validation set.
// Final results after tuning (Kendall | Spearman | Pearson):
//    CID22:     0.6903 | 0.8805 | 0.8583
//    TID2013:   0.6590 | 0.8445 | 0.8471
//    KADID-10k: 0.6175 | 0.8133 | 0.8030
//    KonFiG(F): 0.7668 | 0.9194 | 0.9136
pub(crate) const WEIGHT: [f64; NUM_FEATURES] = [
    0.0,
    0.000_737_660_670_740_658_6,
    0.0,
    0.0,
    0.000_779_348_168_286_730_9,
    0.0,
    0.0,
    0.000_437_115_573_010_737_9,
    0.0,
    1.104_172_642_665_734_6,
    0.000_662_848_341_292_71,
    0.000_152_316_327_837_187_52,
    0.0,
    0.001_640_643_745_659_975_4,
    0.0,
    1.842_245_552_053_929_8,
    11.441_172_603_757_666,
    0.0,
    0.000_798_910_943_601_516_3,
    0.000_176_816_438_078_653,
    0.0,
    1.878_759_497_954_638_7,
    10.949_069_906_051_42,
    0.0,
    0.000_728_934_699_150_807_2,
    0.967_793_708_062_683_3,
    0.0,
    0.000_140_034_242_854_358_84,
    0.998_176_697_785_496_7,
    0.000_319_497_559_344_350_53,
    0.000_455_099_211_379_206_3,
    0.0,
    0.0,
    0.001_364_876_616_324_339_8,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    7.466_890_328_078_848,
    0.0,
    17.445_833_984_131_262,
    0.000_623_560_163_404_146_6,
    0.0,
    0.0,
    6.683_678_146_179_332,
    0.000_377_244_079_796_112_96,
    1.027_889_937_768_264,
    225.205_153_008_492_74,
    0.0,
    0.0,
    19.213_238_186_143_016,
    0.001_140_152_458_661_836_1,
    0.001_237_755_635_509_985,
    176.393_175_984_506_94,
    0.0,
    0.0,
    24.433_009_998_704_76,
    0.285_208_026_121_177_57,
    0.000_448_543_692_383_340_8,
    0.0,
    0.0,
    0.0,
    34.779_063_444_837_72,
    44.835_625_328_877_896,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.000_868_055_657_329_169_8,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.000_531_319_187_435_874_7,
    0.0,
    0.000_165_338_141_613_791_12,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.000_417_917_180_325_133_6,
    0.001_729_082_823_472_283_3,
    0.0,
    0.002_082_700_584_663_643_7,
    0.0,
    0.0,
    8.826_982_764_996_862,
    23.192_433_439_989_26,
    0.0,
    95.108_049_881_108_6,
    0.986_397_803_440_068_2,
    0.983_438_279_246_535_3,
    0.001_228_640_504_827_849_3,
    171.266_725_589_730_7,
    0.980_785_887_243_537_9,
    0.0,
    0.0,
    0.0,
    0.000_513_006_458_899_067_9,
    0.0,
    0.000_108_540_578_584_115_37,
];
