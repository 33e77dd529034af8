//! Frequency-to-column mapping and per-bucket post-processing.
//!
//! A bucket is the run of bins `(previous, target]` that collapses onto one
//! display column. Columns whose target does not advance past the previous
//! bucket carry no new value of their own.

use crate::audio::config::{AmplitudeScale, ViewKind};
use crate::audio::constants::{
    self, DENOISE_MAX_WINDOW, DENOISE_MIN_WINDOW, DENOISE_OUTPUT_SCALE, DENOISE_PEAK_WEIGHT,
    MAGNITUDE_EPSILON, MIN_FREQUENCY,
};
use crate::audio::fft_engine::magnitude_bins;

/// One bucket boundary: `column` shows bin `target`, bins after `previous` fold into it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub column: usize,
    pub previous: usize,
    pub target: usize,
}

impl Bucket {
    /// Number of bins folded into this bucket, always at least one
    pub fn skip_count(&self) -> usize {
        self.target.saturating_sub(self.previous).max(1)
    }
}

/// Column to bin mapping for one (transform size, sample rate, width, scale) combination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketMap {
    transform_size: usize,
    sample_rate: u32,
    columns: usize,
    /// Index of the last column; column `span` shows 20 kHz
    span: usize,
    /// Highest addressable magnitude bin
    max_bin: usize,
    /// Linear transition step, `None` for the logarithmic policy
    linear_step: Option<usize>,
}

impl BucketMap {
    pub fn new(
        transform_size: usize,
        sample_rate: u32,
        columns: usize,
        scale: AmplitudeScale,
        view: ViewKind,
    ) -> Self {
        let span = columns.saturating_sub(1).max(1);
        let sample_rate = sample_rate.max(1);
        let linear = scale == AmplitudeScale::Linear || view == ViewKind::Splines;

        Self {
            transform_size,
            sample_rate,
            columns,
            span,
            max_bin: magnitude_bins(transform_size) - 1,
            linear_step: linear.then(|| linear_transition(span, sample_rate, transform_size)),
        }
    }

    pub fn linear_step(&self) -> Option<usize> {
        self.linear_step
    }

    /// Bin whose frequency is shown at `column` under the logarithmic spacing
    fn frequency_bin(&self, column: usize) -> usize {
        let freq = constants::column_frequency(column, self.span);
        let bin = (freq * self.transform_size as f32 / self.sample_rate as f32) as usize;
        bin.max(1).min(self.max_bin)
    }

    /// Last column at or before `column` where the linear policy re-evaluates
    fn last_update_column(&self, column: usize, step: usize) -> Option<usize> {
        let final_update = self.span - 1;
        if column >= final_update {
            return Some(final_update);
        }
        if self.span <= step {
            return None;
        }
        let last_regular = (self.span - step - 1) / step * step;
        Some((column / step * step).min(last_regular))
    }

    /// Target bin for `column`; non-decreasing in `column`
    pub fn target(&self, column: usize) -> usize {
        match self.linear_step {
            None => self.frequency_bin(column),
            Some(step) => self
                .last_update_column(column, step)
                .map(|update| self.frequency_bin(update))
                .unwrap_or(1),
        }
    }

    /// Bucket ending at `column`, if the target advances there
    pub fn bucket_at(&self, column: usize) -> Option<Bucket> {
        if column >= self.columns {
            return None;
        }
        let previous = if column == 0 {
            0
        } else {
            self.target(column - 1)
        };
        let target = self.target(column);
        (target > previous).then_some(Bucket {
            column,
            previous,
            target,
        })
    }

    /// Every bucket in column order
    pub fn buckets(&self) -> impl Iterator<Item = Bucket> + '_ {
        let mut previous = 0;
        (0..self.columns).filter_map(move |column| {
            let target = self.target(column);
            if target > previous {
                let bucket = Bucket {
                    column,
                    previous,
                    target,
                };
                previous = target;
                Some(bucket)
            } else {
                None
            }
        })
    }
}

/// Column stride of the linear policy: roughly half the width taken by the
/// first two bins on the logarithmic axis, never below one column
pub fn linear_transition(span: usize, sample_rate: u32, transform_size: usize) -> usize {
    let bin_width = 2.0 * sample_rate as f32 / transform_size.max(1) as f32;
    let ratio = (MIN_FREQUENCY + bin_width) / MIN_FREQUENCY;
    let base = (span as f32 * libm::logf(ratio) / libm::logf(constants::FREQUENCY_SPAN)) as usize;
    let base = base.max(1);
    let stretch = (span % base) as f32 / (span / base).max(1) as f32;
    ((base as f32 + stretch) as usize / 2).max(1)
}

/// Fold skipped bins into the bucket target; `average` divides by the skip count
pub fn accumulate_skipped(raw: &mut [f32], bucket: &Bucket, average: bool) {
    let target = bucket.target;
    if target >= raw.len() {
        return;
    }
    let mut sum = raw[target];
    for j in (bucket.previous + 1)..target {
        sum += raw[j].abs();
    }
    if average {
        sum /= bucket.skip_count() as f32;
    }
    raw[target] = sum;
}

/// Suppress the neighbourhood of the bucket target and keep what stands out
///
/// The neighbourhood is `clamp(2 * skip, 10, 400)` bins on each side of the
/// target (excluding bin 0 and the phase half). The target keeps
/// `0.25 * (0.6 * n * |x| - sum)`, floored at epsilon, where `sum` covers
/// `n` neighbourhood magnitudes including the target itself.
pub fn denoise_peak(raw: &mut [f32], bucket: &Bucket, max_bin: usize) {
    let target = bucket.target;
    if target >= raw.len() {
        return;
    }
    let max_bin = max_bin.min(raw.len() - 1);
    let window = (2 * bucket.skip_count()).clamp(DENOISE_MIN_WINDOW, DENOISE_MAX_WINDOW);

    let mut sum = 0.0;
    let mut count = 0usize;
    for k in 0..window {
        if target > k {
            sum += raw[target - k].abs();
            count += 1;
        }
        if k != 0 && target + k <= max_bin {
            sum += raw[target + k].abs();
            count += 1;
        }
    }

    let peak = DENOISE_PEAK_WEIGHT * count as f32 * raw[target].abs() - sum;
    raw[target] = DENOISE_OUTPUT_SCALE * peak.max(MAGNITUDE_EPSILON);
}

/// Sign of |left| - |right|; `None` when both are equal so the caller keeps the previous sign
pub fn difference_sign(left: f32, right: f32) -> Option<f32> {
    let diff = left.abs() - right.abs();
    if diff > 0.0 {
        Some(1.0)
    } else if diff < 0.0 {
        Some(-1.0)
    } else {
        None
    }
}
