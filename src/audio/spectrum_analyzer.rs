use crate::audio::bucket_mapper::{self, Bucket, BucketMap};
use crate::audio::config::{ChannelMode, Configuration, LevelCoefficients, PostMode, ViewKind};
use crate::audio::constants::{
    self, DEFAULT_SAMPLE_RATE, DISPLAY_OFFSET_DEFAULT, DISPLAY_OFFSET_IMAGE, MAGNITUDE_EPSILON,
};
use crate::audio::dynamics::{ChannelState, DynamicsPolicy};
use crate::audio::fft_engine::{magnitude_bins, FftEngine};
use crate::audio::sample_buffer_engine::{self, IngestReader, SampleIngest};
use crate::ui::grid_overlay::{Gridline, GridlineGenerator};
use crate::ui::style::{curve_style, CurveStyle};

/// One mapped column of an overlay pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayColumn {
    /// Normalized display coordinate; `None` when the column carries no new
    /// value, `+INFINITY` in spline view for "interpolate me"
    pub value: Option<f32>,
    pub style: CurveStyle,
}

/// Which realtime layer the drawing side should request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphLayer {
    /// Overlay passes redrawn in place
    RealtimeGraph,
    /// One scrolling line per frame (spectralizer modes)
    RealtimeMoving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers {
    pub graph: GraphLayer,
    /// The cached grid must be regenerated
    pub cache_grid: bool,
}

/// Real-time spectrum analyzer driven from the draw thread
///
/// Audio goes in through the [`SampleIngest`] handle returned by
/// [`Analyzer::new`]. Once per draw pass the caller runs [`Analyzer::advance`],
/// which may recompute the transform and always advances the temporal
/// dynamics, then reads any number of columns, passes and gridlines.
pub struct Analyzer {
    config: Configuration,
    levels: LevelCoefficients,
    sample_rate: u32,

    ingest: SampleIngest,
    reader: IngestReader,
    engine: FftEngine,

    left: ChannelState,
    right: ChannelState,

    /// Draw passes since the last recompute
    cadence_counter: u32,
    /// Set by a resolution change: the next cycle only clears the inputs
    pending_reconfigure: bool,

    grid: GridlineGenerator,
    /// Mode or level changed since the grid was last generated
    grid_dirty: bool,
}

impl Analyzer {
    /// Create an analyzer with the default configuration
    /// Returns (analyzer for the draw thread, ingest handle for the audio thread)
    pub fn new(sample_rate: u32) -> (Self, SampleIngest) {
        Self::with_config(sample_rate, Configuration::default())
    }

    pub fn with_config(sample_rate: u32, config: Configuration) -> (Self, SampleIngest) {
        let config = config.normalized();
        let size = config.transform_size();
        let (ingest, reader) = sample_buffer_engine::ingest_channel();

        let analyzer = Self {
            config,
            levels: config.level_coefficients(),
            sample_rate: sanitize_sample_rate(sample_rate),
            ingest: ingest.clone(),
            reader,
            engine: FftEngine::new(size, config.window_kind),
            left: ChannelState::new(size),
            right: ChannelState::new(size),
            cadence_counter: 0,
            pending_reconfigure: false,
            grid: GridlineGenerator::new(),
            grid_dirty: false,
        };
        tracing::debug!(size, sample_rate = analyzer.sample_rate, "analyzer created");

        (analyzer, ingest)
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn transform_size(&self) -> usize {
        self.engine.size()
    }

    /// Spectral state of the (left, right) channels
    pub fn channels(&self) -> (&ChannelState, &ChannelState) {
        (&self.left, &self.right)
    }

    /// Ingest one frame from the thread that owns the analyzer
    #[inline]
    pub fn push_sample(&self, left: f32, right: f32) {
        self.ingest.push_sample(left, right);
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        let sample_rate = sanitize_sample_rate(sample_rate);
        if sample_rate != self.sample_rate {
            tracing::info!(from = self.sample_rate, to = sample_rate, "sample rate changed");
            self.sample_rate = sample_rate;
        }
    }

    /// Apply a new configuration, resetting only what the change invalidates
    pub fn configure(&mut self, config: Configuration) {
        let config = config.normalized();
        let previous = self.config;
        if config == previous {
            return;
        }

        if config.resolution_level != previous.resolution_level {
            let size = config.transform_size();
            tracing::debug!(size, "reallocating spectral buffers");
            self.engine.resize(size);
            self.left.reallocate(size);
            self.right.reallocate(size);
            self.pending_reconfigure = true;
        }

        if config.window_kind != previous.window_kind {
            self.engine.set_window_kind(config.window_kind);
        }

        if config.is_structural_change(&previous) {
            tracing::debug!(
                mode = ?config.channel_mode,
                smoothing = ?config.smoothing_mode,
                post = ?config.post_mode,
                "resetting temporal state"
            );
            self.left.clear();
            self.right.clear();
            self.cadence_counter = 0;
        }

        if config.channel_mode != previous.channel_mode || config.level_gain != previous.level_gain
        {
            self.grid_dirty = true;
        }

        self.levels = config.level_coefficients();
        self.config = config;
    }

    /// Run one draw-pass step and report whether a new transform completed
    ///
    /// Call once per draw pass with the column count of the display, before
    /// reading columns.
    pub fn advance(&mut self, total_columns: usize) -> bool {
        let fft_done = self.transform_cycle();
        self.walk_buckets(total_columns, fft_done);
        fft_done
    }

    fn transform_cycle(&mut self) -> bool {
        if self.pending_reconfigure {
            self.pending_reconfigure = false;
            self.engine.clear_inputs();
            return false;
        }

        let due = self.cadence_counter % self.config.cadence_divisor() == 0;
        if due {
            self.cadence_counter = 0;
        }
        self.cadence_counter += 1;
        if !due {
            return false;
        }

        let mode = self.config.channel_mode;
        let smoothing = self.config.effective_smoothing();
        let bins = magnitude_bins(self.engine.size());
        self.left.absorb_previous(smoothing, bins);
        self.right.absorb_previous(smoothing, bins);

        self.engine.load_window(&self.reader, mode.routing());
        let right = if mode.needs_right_transform() {
            Some(self.right.raw.as_mut_slice())
        } else {
            None
        };
        match self.engine.execute(&mut self.left.raw, right) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "transform failed, skipping cycle");
                false
            }
        }
    }

    fn walk_buckets(&mut self, total_columns: usize, fft_done: bool) {
        let map = self.bucket_map(total_columns);
        let policy = DynamicsPolicy::from_config(&self.config);
        let right_policy = policy.for_right_channel();
        let mode = self.config.channel_mode;
        let max_bin = magnitude_bins(self.engine.size()) - 1;
        // the moving line is the only spectralizer pass and it shows hold when enabled
        let show_hold = self.is_hold_pass(0);
        let mut posneg = 1.0;

        for bucket in map.buckets() {
            if fft_done && bucket.column != 0 {
                if mode == ChannelMode::Difference {
                    let (l, r) = (self.left.raw[bucket.target], self.right.raw[bucket.target]);
                    if let Some(sign) = bucket_mapper::difference_sign(l, r) {
                        posneg = sign;
                    }
                } else {
                    self.post_process(&bucket, max_bin);
                }
            }

            self.left.step(bucket.target, &policy, fft_done, posneg);
            if mode.tracks_right_dynamics() {
                self.right.step(bucket.target, &right_policy, fft_done, posneg);
            }

            if !self.config.freeze_enabled {
                self.left.capture_freeze(bucket.target, policy.smoothing, show_hold);
                self.right.capture_freeze(bucket.target, policy.smoothing, show_hold);
            }
        }
    }

    fn post_process(&mut self, bucket: &Bucket, max_bin: usize) {
        let post = self.config.post_mode;
        apply_post_mode(post, &mut self.left.raw, bucket, max_bin);
        if self.config.channel_mode.tracks_right_dynamics() {
            apply_post_mode(post, &mut self.right.raw, bucket, max_bin);
        }
    }

    fn bucket_map(&self, total_columns: usize) -> BucketMap {
        BucketMap::new(
            self.engine.size(),
            self.sample_rate,
            total_columns,
            self.config.amplitude_scale,
            self.config.view_kind,
        )
    }

    /// Bin shown at `column`, if the column starts a bucket
    pub fn column_bin(&self, column: usize, total_columns: usize) -> Option<usize> {
        self.bucket_map(total_columns)
            .bucket_at(column)
            .map(|bucket| bucket.target)
    }

    // === PASS CATALOGUE ===

    /// Whether overlay `pass` is drawn under the current mode and hold setting
    pub fn is_pass_drawn(&self, pass: usize) -> bool {
        let hold = self.config.hold_mode;
        match self.config.channel_mode {
            ChannelMode::Average | ChannelMode::Left | ChannelMode::Right => {
                pass == 0 || (pass == 1 && hold)
            }
            ChannelMode::Stereo | ChannelMode::Image => pass < 2 || (pass < 4 && hold),
            ChannelMode::Difference => pass == 0,
            ChannelMode::SpectralizerAverage
            | ChannelMode::SpectralizerLeft
            | ChannelMode::SpectralizerRight => false,
        }
    }

    /// Number of overlay passes drawn per frame
    pub fn pass_count(&self) -> usize {
        (0..4).take_while(|&pass| self.is_pass_drawn(pass)).count()
    }

    fn is_hold_pass(&self, pass: usize) -> bool {
        let mode = self.config.channel_mode;
        (pass == 1 && mode.is_single_channel())
            || pass > 1
            || (mode.is_spectralizer() && self.config.hold_mode)
    }

    /// (left, right) values feeding the display for `bin` on `pass`
    fn selected_values(&self, pass: usize, bin: usize) -> (f32, f32) {
        if self.config.freeze_enabled {
            (self.left.frozen_value(bin), self.right.frozen_value(bin))
        } else if self.is_hold_pass(pass) {
            (self.left.hold_value(bin), self.right.hold_value(bin))
        } else {
            let smoothing = self.config.effective_smoothing();
            (
                self.left.live_value(bin, smoothing),
                self.right.live_value(bin, smoothing),
            )
        }
    }

    /// Map the selected amplitude of `bin` to a display coordinate
    fn display_value(&self, pass: usize, bin: usize, column: usize) -> f32 {
        let (left, right) = self.selected_values(pass, bin);
        let scale = 2.0 / self.engine.size() as f32;
        let curve = |amplitude: f32, base: f32, offset: f32| {
            constants::db_grid(amplitude.abs() * scale + MAGNITUDE_EPSILON, base, offset)
        };

        match self.config.channel_mode {
            ChannelMode::Stereo => {
                let amplitude = if pass % 2 == 0 { left } else { right };
                curve(amplitude, self.levels.main, DISPLAY_OFFSET_DEFAULT)
            }
            ChannelMode::Image => {
                if pass % 2 == 0 {
                    curve(left, self.levels.main, DISPLAY_OFFSET_IMAGE).max(0.0)
                } else {
                    -curve(right, self.levels.main, DISPLAY_OFFSET_IMAGE).max(0.0)
                }
            }
            ChannelMode::Difference => {
                if column == 0 {
                    return 0.0;
                }
                let offset = 1.0 / self.levels.level_adjust.max(MAGNITUDE_EPSILON);
                let value = curve(left.abs() - right.abs(), self.levels.difference, offset).max(0.0);
                if left.abs() < right.abs() {
                    -value
                } else {
                    value
                }
            }
            ChannelMode::Average
            | ChannelMode::Left
            | ChannelMode::Right
            | ChannelMode::SpectralizerAverage
            | ChannelMode::SpectralizerLeft
            | ChannelMode::SpectralizerRight => {
                curve(left, self.levels.main, DISPLAY_OFFSET_DEFAULT)
            }
        }
    }

    // === DRAWING INTERFACE ===

    /// Mapped value and style hint for one column of one pass
    ///
    /// Returns `None` when `pass` is not drawn under the current mode. Pure
    /// read; [`Analyzer::advance`] must have run for the current frame.
    pub fn next_display_column(
        &self,
        pass: usize,
        column: usize,
        total_columns: usize,
    ) -> Option<DisplayColumn> {
        if !self.is_pass_drawn(pass) || column >= total_columns {
            return None;
        }
        let value = match self.bucket_map(total_columns).bucket_at(column) {
            Some(bucket) => Some(self.display_value(pass, bucket.target, column)),
            None if self.config.view_kind == ViewKind::Splines => Some(f32::INFINITY),
            None => None,
        };
        Some(DisplayColumn {
            value,
            style: curve_style(&self.config, pass),
        })
    }

    /// Fill `out` (one slot per column) for `pass`
    ///
    /// Columns without a new value are left untouched, or set to `+INFINITY`
    /// in spline view.
    pub fn render_pass(&self, pass: usize, out: &mut [f32]) -> Option<CurveStyle> {
        if !self.is_pass_drawn(pass) {
            return None;
        }
        self.render_columns(pass, out);
        Some(curve_style(&self.config, pass))
    }

    /// Fill `out` with the newest scrolling line of the spectralizer display
    pub fn render_moving(&self, out: &mut [f32]) -> bool {
        if !self.config.channel_mode.is_spectralizer() {
            return false;
        }
        self.render_columns(0, out);
        true
    }

    fn render_columns(&self, pass: usize, out: &mut [f32]) {
        if self.config.view_kind == ViewKind::Splines {
            out.fill(f32::INFINITY);
        }
        let map = self.bucket_map(out.len());
        for bucket in map.buckets() {
            out[bucket.column] = self.display_value(pass, bucket.target, bucket.column);
        }
    }

    // === GRID ===

    /// Next gridline of the current grid pass, `None` once the pass is complete
    pub fn next_gridline(&mut self, pass_index: usize) -> Option<Gridline> {
        if pass_index == 0 {
            self.grid_dirty = false;
        }
        self.grid.next(pass_index, self.config.channel_mode, &self.levels)
    }

    pub fn should_redraw_grid(&self, generation: u64) -> bool {
        generation == 0 || self.grid_dirty
    }

    pub fn layers(&self, generation: u64) -> Layers {
        let graph = if self.config.channel_mode.is_spectralizer() {
            GraphLayer::RealtimeMoving
        } else {
            GraphLayer::RealtimeGraph
        };
        Layers {
            graph,
            cache_grid: self.should_redraw_grid(generation),
        }
    }
}

fn apply_post_mode(post: PostMode, raw: &mut [f32], bucket: &Bucket, max_bin: usize) {
    match post {
        PostMode::Normalized => {}
        PostMode::Additive => bucket_mapper::accumulate_skipped(raw, bucket, true),
        PostMode::AdditiveRecalc => bucket_mapper::accumulate_skipped(raw, bucket, false),
        PostMode::DenoisedPeaks => bucket_mapper::denoise_peak(raw, bucket, max_bin),
    }
}

fn sanitize_sample_rate(sample_rate: u32) -> u32 {
    if sample_rate == 0 {
        tracing::warn!(fallback = DEFAULT_SAMPLE_RATE, "sample rate of 0 Hz, using fallback");
        DEFAULT_SAMPLE_RATE
    } else {
        sample_rate
    }
}
