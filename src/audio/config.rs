//! Analyzer configuration and the closed mode enumerations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{self, MAX_RESOLUTION_LEVEL, MAX_SWEEP_SPEED};
use super::window_functions::WindowKind;

/// Errors raised when host parameter codes cannot be mapped onto a [`Configuration`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("resolution level {0} is outside 0..={max}", max = MAX_RESOLUTION_LEVEL)]
    ResolutionOutOfRange(u8),
    #[error("sweep speed {0} is outside 0..={max}", max = MAX_SWEEP_SPEED)]
    SpeedOutOfRange(u8),
    #[error("unknown {parameter} code {code}")]
    UnknownCode { parameter: &'static str, code: u8 },
    #[error("level gain {0} is not a finite positive number")]
    InvalidLevel(f32),
}

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $parameter:literal {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Numeric code used by host parameter automation.
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ConfigError;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(ConfigError::UnknownCode {
                        parameter: $parameter,
                        code,
                    }),
                }
            }
        }
    };
}

coded_enum! {
    /// Which channels feed the transform and how the result is drawn.
    ChannelMode, "channel mode" {
        Average = 0,
        Left = 1,
        Right = 2,
        /// Left and right curves overlaid
        Stereo = 3,
        /// Left above, right mirrored below the centre line
        Image = 4,
        /// Signed left/right difference around the centre line
        Difference = 5,
        SpectralizerAverage = 6,
        SpectralizerLeft = 7,
        SpectralizerRight = 8,
    }
}

coded_enum! {
    /// Temporal smoothing applied between transform recomputations.
    SmoothingMode, "smoothing mode" {
        Off = 0,
        /// Peak follower with slow multiplicative decay
        Falling = 1,
        /// Geometric (or, for signed modes, linear) glide toward each new frame
        Averaging = 2,
    }
}

coded_enum! {
    /// How skipped bins inside a bucket are folded into its target bin.
    PostMode, "post-processing mode" {
        Normalized = 0,
        Additive = 1,
        AdditiveRecalc = 2,
        DenoisedPeaks = 3,
    }
}

coded_enum! {
    /// Bucket spacing along the frequency axis.
    AmplitudeScale, "scale" {
        Logarithmic = 0,
        /// Target bin only re-evaluated every linear-transition step
        Linear = 1,
    }
}

coded_enum! {
    ViewKind, "view" {
        Bars = 0,
        Lines = 1,
        Splines = 2,
    }
}

impl Default for ChannelMode {
    fn default() -> Self {
        Self::Left
    }
}

impl Default for SmoothingMode {
    fn default() -> Self {
        Self::Falling
    }
}

impl Default for PostMode {
    fn default() -> Self {
        Self::Normalized
    }
}

impl Default for AmplitudeScale {
    fn default() -> Self {
        Self::Logarithmic
    }
}

impl Default for ViewKind {
    fn default() -> Self {
        Self::Lines
    }
}

impl ChannelMode {
    /// Modes that need a second transform over the right channel.
    pub fn needs_right_transform(self) -> bool {
        matches!(self, Self::Stereo | Self::Image | Self::Difference)
    }

    /// Modes that keep separate right-channel dynamics.
    pub fn tracks_right_dynamics(self) -> bool {
        matches!(self, Self::Stereo | Self::Image)
    }

    pub fn is_spectralizer(self) -> bool {
        matches!(
            self,
            Self::SpectralizerAverage | Self::SpectralizerLeft | Self::SpectralizerRight
        )
    }

    /// Signed display centred on zero (difference mode only).
    pub fn is_signed(self) -> bool {
        self == Self::Difference
    }

    /// Image and difference draw around a centre line.
    pub fn is_centered(self) -> bool {
        matches!(self, Self::Image | Self::Difference)
    }

    /// Single-curve modes: average, left, right.
    pub fn is_single_channel(self) -> bool {
        matches!(self, Self::Average | Self::Left | Self::Right)
    }

    /// How the two input channels are routed into the transform inputs.
    pub fn routing(self) -> ChannelRouting {
        match self {
            Self::Average | Self::SpectralizerAverage => ChannelRouting::Average,
            Self::Right | Self::SpectralizerRight => ChannelRouting::Swap,
            Self::Left
            | Self::Stereo
            | Self::Image
            | Self::Difference
            | Self::SpectralizerLeft => ChannelRouting::PassThrough,
        }
    }
}

/// Channel combination applied while building the analysis input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRouting {
    Average,
    PassThrough,
    Swap,
}

impl ChannelRouting {
    #[inline]
    pub fn apply(self, left: f32, right: f32) -> (f32, f32) {
        match self {
            Self::Average => {
                let mid = (left + right) / 2.0;
                (mid, mid)
            }
            Self::PassThrough => (left, right),
            Self::Swap => (right, left),
        }
    }
}

/// Full analyzer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Transform size is 2^(7 + resolution_level)
    pub resolution_level: u8,
    pub hold_mode: bool,
    pub smoothing_mode: SmoothingMode,
    pub channel_mode: ChannelMode,
    pub amplitude_scale: AmplitudeScale,
    pub post_mode: PostMode,
    /// 0..=15, the recompute divisor is 16 - speed
    pub sweep_speed: u8,
    pub window_kind: WindowKind,
    pub view_kind: ViewKind,
    pub freeze_enabled: bool,
    pub level_gain: f32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            resolution_level: 3,
            hold_mode: false,
            smoothing_mode: SmoothingMode::default(),
            channel_mode: ChannelMode::default(),
            amplitude_scale: AmplitudeScale::default(),
            post_mode: PostMode::default(),
            sweep_speed: 2,
            window_kind: WindowKind::default(),
            view_kind: ViewKind::default(),
            freeze_enabled: false,
            level_gain: 1.0,
        }
    }
}

const MIN_LEVEL_GAIN: f32 = 1.0 / 64.0;
const MAX_LEVEL_GAIN: f32 = 16.0;

impl Configuration {
    /// Ensures the configuration respects runtime invariants.
    pub fn normalize(&mut self) {
        self.resolution_level = self.resolution_level.min(MAX_RESOLUTION_LEVEL);
        self.sweep_speed = self.sweep_speed.min(MAX_SWEEP_SPEED);
        if !self.level_gain.is_finite() || self.level_gain <= 0.0 {
            self.level_gain = 1.0;
        }
        self.level_gain = self.level_gain.clamp(MIN_LEVEL_GAIN, MAX_LEVEL_GAIN);
    }

    /// Returns a normalized copy of this configuration.
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn transform_size(&self) -> usize {
        constants::transform_size_for_level(self.resolution_level)
    }

    /// Recompute divisor, always in 1..=16.
    pub fn cadence_divisor(&self) -> u32 {
        constants::CADENCE_BASE - self.sweep_speed.min(MAX_SWEEP_SPEED) as u32
    }

    /// Smoothing actually applied: difference mode has no falling policy.
    pub fn effective_smoothing(&self) -> SmoothingMode {
        match (self.channel_mode, self.smoothing_mode) {
            (ChannelMode::Difference, SmoothingMode::Falling) => SmoothingMode::Averaging,
            (_, mode) => mode,
        }
    }

    /// Whether switching from `previous` to `self` invalidates the temporal buffers.
    pub fn is_structural_change(&self, previous: &Configuration) -> bool {
        self.resolution_level != previous.resolution_level
            || self.hold_mode != previous.hold_mode
            || self.smoothing_mode != previous.smoothing_mode
            || self.channel_mode != previous.channel_mode
            || self.amplitude_scale != previous.amplitude_scale
            || self.post_mode != previous.post_mode
    }

    pub fn level_coefficients(&self) -> LevelCoefficients {
        LevelCoefficients::from_level(self.level_gain)
    }

    /// Lossy conversion from host codes: unknown values fall back to defaults.
    pub fn from_raw_lossy(raw: RawParameters) -> Self {
        let defaults = Self::default();
        let mut config = Self {
            resolution_level: raw.resolution_level,
            hold_mode: raw.hold,
            smoothing_mode: lossy(raw.smoothing, defaults.smoothing_mode),
            channel_mode: lossy(raw.mode, defaults.channel_mode),
            amplitude_scale: lossy(raw.scale, defaults.amplitude_scale),
            post_mode: lossy(raw.post, defaults.post_mode),
            sweep_speed: raw.speed,
            window_kind: lossy(raw.windowing, defaults.window_kind),
            view_kind: lossy(raw.view, defaults.view_kind),
            freeze_enabled: raw.freeze,
            level_gain: raw.level,
        };
        if raw.resolution_level > MAX_RESOLUTION_LEVEL || raw.speed > MAX_SWEEP_SPEED {
            tracing::warn!(
                resolution_level = raw.resolution_level,
                speed = raw.speed,
                "clamping out-of-range analyzer parameters"
            );
        }
        config.normalize();
        config
    }
}

fn lossy<T>(code: u8, fallback: T) -> T
where
    T: TryFrom<u8, Error = ConfigError>,
{
    T::try_from(code).unwrap_or_else(|err| {
        tracing::warn!(%err, "falling back to default");
        fallback
    })
}

/// Numeric parameter codes as delivered by a plugin host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawParameters {
    pub level: f32,
    pub resolution_level: u8,
    pub hold: bool,
    pub smoothing: u8,
    pub mode: u8,
    pub scale: u8,
    pub post: u8,
    pub speed: u8,
    pub windowing: u8,
    pub view: u8,
    pub freeze: bool,
}

impl TryFrom<RawParameters> for Configuration {
    type Error = ConfigError;

    fn try_from(raw: RawParameters) -> Result<Self, Self::Error> {
        if raw.resolution_level > MAX_RESOLUTION_LEVEL {
            return Err(ConfigError::ResolutionOutOfRange(raw.resolution_level));
        }
        if raw.speed > MAX_SWEEP_SPEED {
            return Err(ConfigError::SpeedOutOfRange(raw.speed));
        }
        if !raw.level.is_finite() || raw.level <= 0.0 {
            return Err(ConfigError::InvalidLevel(raw.level));
        }
        Ok(Self {
            resolution_level: raw.resolution_level,
            hold_mode: raw.hold,
            smoothing_mode: SmoothingMode::try_from(raw.smoothing)?,
            channel_mode: ChannelMode::try_from(raw.mode)?,
            amplitude_scale: AmplitudeScale::try_from(raw.scale)?,
            post_mode: PostMode::try_from(raw.post)?,
            sweep_speed: raw.speed,
            window_kind: WindowKind::try_from(raw.windowing)?,
            view_kind: ViewKind::try_from(raw.view)?,
            freeze_enabled: raw.freeze,
            level_gain: raw.level,
        }
        .normalized())
    }
}

/// Coefficients of the dB display curve derived from the level gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCoefficients {
    /// Compressed level used by difference mode
    pub level_adjust: f32,
    /// Curve base for every mode except difference
    pub main: f32,
    /// Curve base for difference mode
    pub difference: f32,
}

impl LevelCoefficients {
    pub fn from_level(level: f32) -> Self {
        let level_adjust = if level > 1.0 {
            1.0 + (level - 1.0) / 4.0
        } else {
            level
        };
        Self {
            level_adjust,
            main: libm::powf(constants::LEVEL_BASE, level),
            difference: libm::powf(constants::LEVEL_BASE, 2.0 * level_adjust),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawParameters {
        RawParameters {
            level: 1.0,
            resolution_level: 3,
            hold: false,
            smoothing: 0,
            mode: 5,
            scale: 0,
            post: 3,
            speed: 4,
            windowing: 2,
            view: 1,
            freeze: false,
        }
    }

    #[test]
    fn raw_codes_map_onto_named_variants() {
        let config = Configuration::try_from(raw()).unwrap();
        assert_eq!(config.channel_mode, ChannelMode::Difference);
        assert_eq!(config.post_mode, PostMode::DenoisedPeaks);
        assert_eq!(config.window_kind, WindowKind::Hann);
        assert_eq!(config.cadence_divisor(), 12);
        assert_eq!(config.transform_size(), 1024);
    }

    #[test]
    fn unknown_codes_are_rejected_or_defaulted() {
        let mut bad = raw();
        bad.mode = 42;
        bad.windowing = 99;
        assert_eq!(
            Configuration::try_from(bad),
            Err(ConfigError::UnknownCode {
                parameter: "channel mode",
                code: 42
            })
        );

        let config = Configuration::from_raw_lossy(bad);
        assert_eq!(config.channel_mode, ChannelMode::Left);
        assert_eq!(config.window_kind, WindowKind::Rectangular);
    }

    #[test]
    fn out_of_range_levels_are_clamped() {
        let mut bad = raw();
        bad.resolution_level = 9;
        bad.speed = 30;
        assert_eq!(
            Configuration::try_from(bad),
            Err(ConfigError::ResolutionOutOfRange(9))
        );
        let config = Configuration::from_raw_lossy(bad);
        assert_eq!(config.resolution_level, MAX_RESOLUTION_LEVEL);
        assert_eq!(config.cadence_divisor(), 1);
    }

    #[test]
    fn difference_mode_never_falls() {
        let config = Configuration {
            channel_mode: ChannelMode::Difference,
            smoothing_mode: SmoothingMode::Falling,
            ..Configuration::default()
        };
        assert_eq!(config.effective_smoothing(), SmoothingMode::Averaging);
    }

    #[test]
    fn structural_changes_exclude_cosmetic_fields() {
        let base = Configuration::default();
        let cosmetic = Configuration {
            freeze_enabled: true,
            sweep_speed: 9,
            view_kind: ViewKind::Bars,
            window_kind: WindowKind::Blackman,
            level_gain: 2.0,
            ..base
        };
        assert!(!cosmetic.is_structural_change(&base));
        let structural = Configuration {
            post_mode: PostMode::Additive,
            ..base
        };
        assert!(structural.is_structural_change(&base));
    }

    #[test]
    fn level_coefficients_follow_level() {
        let unity = LevelCoefficients::from_level(1.0);
        assert!((unity.main - 64.0).abs() < 1e-3);
        assert!((unity.difference - 4096.0).abs() < 1e-1);
        let loud = LevelCoefficients::from_level(3.0);
        assert!((loud.level_adjust - 1.5).abs() < 1e-6);
    }
}
