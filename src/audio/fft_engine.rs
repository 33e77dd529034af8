use crate::audio::config::ChannelRouting;
use crate::audio::sample_buffer_engine::IngestReader;
use crate::audio::window_functions::{WindowKind, WindowTable};
use realfft::{num_complex::Complex32, FftError, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Owns the transform plan and the per-channel analysis input
///
/// Output is written as a non-normalized, magnitude/phase packed spectrum of
/// `size` floats: magnitudes of bins `0..=size/2` at their own index, phases of
/// bins `1..size/2` mirrored at `size - k`.
pub struct FftEngine {
    // FFT planner and instance
    planner: RealFftPlanner<f32>,
    fft: Arc<dyn RealToComplex<f32>>,

    // Windowed analysis input, one per channel
    input_left: Vec<f32>,
    input_right: Vec<f32>,

    // Complex output (size/2 + 1 bins) and planner scratch
    output: Vec<Complex32>,
    scratch: Vec<Complex32>,

    // Fixed taper times the selected window
    window: WindowTable,

    size: usize,
}

impl FftEngine {
    pub fn new(size: usize, window_kind: WindowKind) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let output = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();

        Self {
            planner,
            fft,
            input_left: vec![0.0; size],
            input_right: vec![0.0; size],
            output,
            scratch,
            window: WindowTable::new(window_kind, size),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn window_kind(&self) -> WindowKind {
        self.window.kind()
    }

    /// Rebuild the plan and every buffer for a new transform size
    pub fn resize(&mut self, size: usize) {
        if size == self.size {
            return;
        }
        tracing::debug!(from = self.size, to = size, "rebuilding transform plan");

        self.fft = self.planner.plan_fft_forward(size);
        self.output = self.fft.make_output_vec();
        self.scratch = self.fft.make_scratch_vec();
        self.input_left = vec![0.0; size];
        self.input_right = vec![0.0; size];
        self.window.rebuild(self.window.kind(), size);
        self.size = size;
    }

    pub fn set_window_kind(&mut self, kind: WindowKind) {
        if kind != self.window.kind() {
            self.window.rebuild(kind, self.size);
        }
    }

    /// Zero both analysis inputs
    pub fn clear_inputs(&mut self) {
        self.input_left.fill(0.0);
        self.input_right.fill(0.0);
    }

    /// Copy the most recent `size` frames out of the ring, windowed and routed
    ///
    /// Bin `i` reads the frame `size - i` frames behind the write cursor, so the
    /// block runs oldest to newest.
    pub fn load_window(&mut self, reader: &IngestReader, routing: ChannelRouting) {
        let cursor = reader.write_cursor();
        let size = self.size;

        for i in 0..size {
            let (left, right) = reader.frame_behind(cursor, size - i);
            let weight = self.window.at(i);
            let (left, right) = routing.apply(left * weight, right * weight);
            self.input_left[i] = left;
            self.input_right[i] = right;
        }
    }

    /// Run the forward transform for the left input and, if requested, the right
    pub fn execute(
        &mut self,
        left_out: &mut [f32],
        right_out: Option<&mut [f32]>,
    ) -> Result<(), FftError> {
        self.fft.process_with_scratch(
            &mut self.input_left,
            &mut self.output,
            &mut self.scratch,
        )?;
        pack_spectrum(&self.output, self.size, left_out);

        if let Some(right_out) = right_out {
            self.fft.process_with_scratch(
                &mut self.input_right,
                &mut self.output,
                &mut self.scratch,
            )?;
            pack_spectrum(&self.output, self.size, right_out);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn inputs(&self) -> (&[f32], &[f32]) {
        (&self.input_left, &self.input_right)
    }
}

/// Store magnitudes of bins 0..=size/2 and phases of bins 1..size/2 mirrored at size - k
fn pack_spectrum(bins: &[Complex32], size: usize, out: &mut [f32]) {
    let half = size / 2;
    for (k, bin) in bins.iter().enumerate().take(half + 1) {
        if let Some(slot) = out.get_mut(k) {
            *slot = bin.norm();
        }
        if k > 0 && k < half {
            if let Some(slot) = out.get_mut(size - k) {
                *slot = bin.arg();
            }
        }
    }
}

/// Number of magnitude bins in a packed spectrum of `size` floats
#[inline]
pub fn magnitude_bins(size: usize) -> usize {
    size / 2 + 1
}
