use super::profile::IntensityProfile;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Band positions of a detected body, all indices into the intensity profile.
///
/// Ordering always holds: `left_arm_start <= torso_start <= right_arm_start <= body_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySpan {
    pub left_arm_start: usize,
    pub torso_start: usize,
    pub right_arm_start: usize,
    pub body_end: usize,
    /// Pixel width of one band in the processed frame
    pub band_width_pixels: u32,
    /// Sum of band intensities over the whole body run
    pub total_intensity: u64,
}

impl BodySpan {
    pub fn torso_width(&self) -> usize {
        self.right_arm_start - self.torso_start
    }

    pub fn left_arm_width(&self) -> usize {
        self.torso_start - self.left_arm_start
    }

    pub fn right_arm_width(&self) -> usize {
        self.body_end - self.right_arm_start
    }

    /// Pixel column where `band` starts
    pub fn band_to_pixel(&self, band: usize) -> u32 {
        band as u32 * self.band_width_pixels
    }

    /// Pixel columns covered by the whole body, end exclusive
    pub fn body_pixels(&self) -> (u32, u32) {
        (
            self.band_to_pixel(self.left_arm_start),
            self.band_to_pixel(self.body_end) + self.band_width_pixels,
        )
    }

    /// Pixel columns covered by the torso, end exclusive
    pub fn torso_pixels(&self) -> (u32, u32) {
        (
            self.band_to_pixel(self.torso_start),
            self.band_to_pixel(self.right_arm_start) + self.band_width_pixels,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyRegion {
    NoBody,
    Body(BodySpan),
}

impl BodyRegion {
    pub fn is_body(&self) -> bool {
        matches!(self, BodyRegion::Body(_))
    }

    pub fn span(&self) -> Option<&BodySpan> {
        match self {
            BodyRegion::Body(span) => Some(span),
            BodyRegion::NoBody => None,
        }
    }
}

/// Contiguous stretch of occupied bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: usize,
    end: usize,
    total: u64,
}

impl Run {
    fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Locates a body and its torso in an intensity profile
#[derive(Debug, Clone, Copy)]
pub struct BodySegmenter {
    torso_coefficient: f32,
}

impl BodySegmenter {
    pub fn new(torso_coefficient: f32) -> Self {
        Self { torso_coefficient }
    }

    /// Intensity a band must exceed to count as occupied, normalized to a 1280-wide frame
    pub fn min_band_intensity(frame_width: u32) -> u32 {
        200 * frame_width / 1280
    }

    pub fn segment(&self, profile: &IntensityProfile, frame_width: u32) -> BodyRegion {
        let counts = profile.counts();
        if counts.is_empty() {
            return BodyRegion::NoBody;
        }

        let band_width_pixels = frame_width / counts.len() as u32;
        if band_width_pixels == 0 {
            debug!(
                "Frame width {} too narrow for {} bands",
                frame_width,
                counts.len()
            );
            return BodyRegion::NoBody;
        }

        let min_sum = Self::min_band_intensity(frame_width);
        let run = match longest_run(counts, min_sum) {
            Some(run) => run,
            None => {
                trace!("No band exceeds {} lit pixels", min_sum);
                return BodyRegion::NoBody;
            }
        };

        let (peak, peak_value) = brightest_band(counts, &run);
        let cutoff = peak_value as f32 * self.torso_coefficient;

        let mut torso_start = peak;
        while torso_start > run.start && counts[torso_start - 1] as f32 > cutoff {
            torso_start -= 1;
        }

        let mut right_arm_start = peak;
        while right_arm_start < run.end && counts[right_arm_start + 1] as f32 > cutoff {
            right_arm_start += 1;
        }

        debug!(
            "Body run {}..={} (total {}), peak band {} ({}), torso {}..={}",
            run.start, run.end, run.total, peak, peak_value, torso_start, right_arm_start
        );

        BodyRegion::Body(BodySpan {
            left_arm_start: run.start,
            torso_start,
            right_arm_start,
            body_end: run.end,
            band_width_pixels,
            total_intensity: run.total,
        })
    }
}

/// Longest run of bands above `min_sum`; the earliest wins a tie
fn longest_run(counts: &[u32], min_sum: u32) -> Option<Run> {
    let mut best: Option<Run> = None;
    let mut current: Option<Run> = None;

    for (band, &count) in counts.iter().enumerate() {
        if count > min_sum {
            let run = current.get_or_insert(Run {
                start: band,
                end: band,
                total: 0,
            });
            run.end = band;
            run.total += count as u64;

            if best.map_or(true, |b| run.len() > b.len()) {
                best = Some(*run);
            }
        } else {
            current = None;
        }
    }

    best
}

/// First band holding the maximum intensity inside `run`
fn brightest_band(counts: &[u32], run: &Run) -> (usize, u32) {
    let mut peak = run.start;
    for band in run.start..=run.end {
        if counts[band] > counts[peak] {
            peak = band;
        }
    }
    (peak, counts[peak])
}
