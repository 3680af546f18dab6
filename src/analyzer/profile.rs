use crate::imaging::is_lit;
use image::GrayImage;
use std::ops::Index;

/// Lit-pixel counts for equal-width vertical bands of a mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityProfile {
    counts: Vec<u32>,
    band_width: u32,
}

impl IntensityProfile {
    /// Slice `mask` into `num_slices` bands of `width / num_slices` columns and
    /// count lit pixels in each. Columns past the last whole band are ignored.
    pub fn from_mask(mask: &GrayImage, num_slices: usize) -> Self {
        let (width, _) = mask.dimensions();
        let band_width = if num_slices == 0 {
            0
        } else {
            width / num_slices as u32
        };
        let mut counts = vec![0u32; num_slices];

        if band_width > 0 {
            let covered = band_width as usize * num_slices;
            for row in mask.rows() {
                for (x, pixel) in row.take(covered).enumerate() {
                    if is_lit(pixel[0]) {
                        counts[x / band_width as usize] += 1;
                    }
                }
            }
        }

        Self { counts, band_width }
    }

    /// Build a profile from precomputed band counts
    pub fn from_counts(counts: Vec<u32>, band_width: u32) -> Self {
        Self { counts, band_width }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Width of one band in mask pixels
    pub fn band_width(&self) -> u32 {
        self.band_width
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

impl Index<usize> for IntensityProfile {
    type Output = u32;

    fn index(&self, band: usize) -> &u32 {
        &self.counts[band]
    }
}
