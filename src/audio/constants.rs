/// Analysis constants and the decibel display curve
/// Kept apart from the display-side style hints in ui::style

/// Frequency span of the display: 20 Hz up to 20 Hz * 1000 = 20 kHz
pub const MIN_FREQUENCY: f32 = 20.0;
pub const FREQUENCY_SPAN: f32 = 1000.0;
pub const MAX_FREQUENCY: f32 = MIN_FREQUENCY * FREQUENCY_SPAN;

/// Sample rate used until the host reports one
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Transform size is 2^(RESOLUTION_BASE_EXPONENT + resolution_level)
pub const RESOLUTION_BASE_EXPONENT: u32 = 7;
pub const MAX_RESOLUTION_LEVEL: u8 = 6;
pub const MIN_TRANSFORM_SIZE: usize = 1 << RESOLUTION_BASE_EXPONENT; // 128
pub const MAX_TRANSFORM_SIZE: usize =
    1 << (RESOLUTION_BASE_EXPONENT + MAX_RESOLUTION_LEVEL as u32); // 16384

/// Sweep speed range; the recompute divisor is CADENCE_BASE - speed
pub const MAX_SWEEP_SPEED: u8 = 15;
pub const CADENCE_BASE: u32 = 16;

/// Ingest ring capacity in stereo frames, strictly above 2x the largest window
pub const INGEST_CAPACITY_FRAMES: usize = 4 * MAX_TRANSFORM_SIZE;

/// Floor added before taking logarithms and used for degenerate divisors
pub const MAGNITUDE_EPSILON: f32 = 1e-20;

/// Falling-policy floors and attenuation factors
pub const FALLING_FLOOR: f32 = 0.91;
pub const FALLING_FLOOR_SPECTRALIZER: f32 = 0.99;
pub const FALLING_FACTOR: f32 = 2000.0;
pub const FALLING_FACTOR_SPECTRALIZER: f32 = 50.0;

/// Denoised-peaks neighbourhood window bounds and weights
pub const DENOISE_MIN_WINDOW: usize = 10;
pub const DENOISE_MAX_WINDOW: usize = 400;
pub const DENOISE_PEAK_WEIGHT: f32 = 0.6;
pub const DENOISE_OUTPUT_SCALE: f32 = 0.25;

/// Display offsets handed to the dB curve per channel mode
pub const DISPLAY_OFFSET_DEFAULT: f32 = 0.75;
pub const DISPLAY_OFFSET_IMAGE: f32 = 1.0;

/// Base of the level coefficients: coeff = LEVEL_BASE^level
pub const LEVEL_BASE: f32 = 64.0;

/// Number of frequency gridlines (10 Hz .. 20 kHz)
pub const FREQUENCY_GRIDLINES: usize = 28;

/// Upper bound on amplitude gridlines walked per half
pub const MAX_AMPLITUDE_GRIDLINES: usize = 32;

// === HELPER FUNCTIONS ===

/// Transform size for a resolution level, clamped to the supported range
pub fn transform_size_for_level(level: u8) -> usize {
    1 << (RESOLUTION_BASE_EXPONENT + level.min(MAX_RESOLUTION_LEVEL) as u32)
}

/// Frequency shown at a column of the logarithmic display axis
pub fn column_frequency(column: usize, span: usize) -> f32 {
    MIN_FREQUENCY * libm::powf(FREQUENCY_SPAN, column as f32 / span.max(1) as f32)
}

/// Convert frequency to logarithmic position (0.0 at 20 Hz, 1.0 at 20 kHz)
pub fn freq_to_log_position(freq: f32) -> f32 {
    libm::logf(freq / MIN_FREQUENCY) / libm::logf(FREQUENCY_SPAN)
}

/// Compressive dB curve: log_base(amplitude) + offset
///
/// With base 64 one unit on the display axis spans 36 dB. The base is
/// floored so a zero level never divides by zero.
pub fn db_grid(amplitude: f32, base: f32, offset: f32) -> f32 {
    let log_base = libm::logf(base).max(MAGNITUDE_EPSILON);
    libm::logf(amplitude.max(MAGNITUDE_EPSILON)) / log_base + offset
}
