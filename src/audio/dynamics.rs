//! Per-channel temporal state: falling peaks, averaging glide, hold and freeze.
//!
//! All buffers hold exactly `transform_size` floats and are reallocated only
//! from [`ChannelState::reallocate`], which runs on reconfiguration and never
//! on the draw path.

use crate::audio::config::{Configuration, SmoothingMode};
use crate::audio::constants::{
    FALLING_FACTOR, FALLING_FACTOR_SPECTRALIZER, FALLING_FLOOR, FALLING_FLOOR_SPECTRALIZER,
    MAGNITUDE_EPSILON,
};

/// Spectral state of one channel
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    /// Latest packed transform output
    pub(crate) raw: Vec<f32>,
    /// Display-ready smoothed or falling value
    pub(crate) smooth: Vec<f32>,
    /// Per-bin rate: decay factor (falling), ratio root (averaging) or step (signed)
    pub(crate) delta: Vec<f32>,
    /// Running max of |raw| since the last reset
    pub(crate) hold: Vec<f32>,
    /// Last live display value, frozen while freeze is enabled
    pub(crate) freeze: Vec<f32>,
}

impl ChannelState {
    pub fn new(size: usize) -> Self {
        let mut state = Self::default();
        state.reallocate(size);
        state
    }

    /// Replace every buffer with a zeroed one of `size` bins
    pub fn reallocate(&mut self, size: usize) {
        self.raw = vec![0.0; size];
        self.smooth = vec![0.0; size];
        self.delta = vec![0.0; size];
        self.hold = vec![0.0; size];
        self.freeze = vec![0.0; size];
    }

    /// Zero the temporal buffers without touching their allocation
    pub fn clear(&mut self) {
        self.raw.fill(0.0);
        self.smooth.fill(0.0);
        self.delta.fill(0.0);
        self.hold.fill(0.0);
    }

    pub fn raw(&self) -> &[f32] {
        &self.raw
    }

    pub fn hold(&self) -> &[f32] {
        &self.hold
    }

    pub fn smooth(&self) -> &[f32] {
        &self.smooth
    }

    pub fn freeze(&self) -> &[f32] {
        &self.freeze
    }

    /// Fold the outgoing frame into hold and smoothing before it is overwritten
    pub fn absorb_previous(&mut self, smoothing: SmoothingMode, bins: usize) {
        let bins = bins.min(self.raw.len());
        for i in 0..bins {
            let previous = self.raw[i];
            let magnitude = previous.abs();

            match smoothing {
                SmoothingMode::Averaging => self.smooth[i] = previous,
                SmoothingMode::Falling => {
                    if self.smooth[i] < magnitude {
                        self.smooth[i] = magnitude;
                        self.delta[i] = 1.0;
                    }
                }
                SmoothingMode::Off => {}
            }

            if magnitude > self.hold[i] {
                self.hold[i] = magnitude;
            }
        }
    }

    /// Advance the smoothing policy for one bucket target bin
    pub fn step(&mut self, bin: usize, policy: &DynamicsPolicy, fft_done: bool, sign: f32) {
        if bin >= self.raw.len() {
            return;
        }

        match policy.smoothing {
            SmoothingMode::Off => {}
            SmoothingMode::Averaging => {
                if fft_done {
                    let target = self.raw[bin].abs();
                    let delta = if policy.signed {
                        (sign * target - self.smooth[bin]) / policy.divisor
                    } else {
                        let ratio = target / self.smooth[bin].abs().max(MAGNITUDE_EPSILON);
                        libm::powf(ratio, 1.0 / policy.divisor)
                    };
                    self.delta[bin] = finite_or_floor(delta);
                } else if policy.signed {
                    self.smooth[bin] += self.delta[bin];
                } else {
                    self.smooth[bin] *= self.delta[bin];
                }
            }
            SmoothingMode::Falling => {
                self.smooth[bin] *= self.delta[bin];
                if self.delta[bin] > policy.floor {
                    self.delta[bin] *= policy.attenuation;
                }
            }
        }
    }

    /// Value shown for `bin` when neither freeze nor hold applies
    #[inline]
    pub fn live_value(&self, bin: usize, smoothing: SmoothingMode) -> f32 {
        let source = match smoothing {
            SmoothingMode::Off => &self.raw,
            SmoothingMode::Falling | SmoothingMode::Averaging => &self.smooth,
        };
        source.get(bin).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn hold_value(&self, bin: usize) -> f32 {
        self.hold.get(bin).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn frozen_value(&self, bin: usize) -> f32 {
        self.freeze.get(bin).copied().unwrap_or(0.0)
    }

    /// Value on screen for `bin` while freeze is off
    #[inline]
    pub fn shown_value(&self, bin: usize, smoothing: SmoothingMode, show_hold: bool) -> f32 {
        if show_hold {
            self.hold_value(bin)
        } else {
            self.live_value(bin, smoothing)
        }
    }

    /// Live-update the freeze snapshot for one bucket with the value on screen
    #[inline]
    pub fn capture_freeze(&mut self, bin: usize, smoothing: SmoothingMode, show_hold: bool) {
        let value = self.shown_value(bin, smoothing, show_hold);
        if let Some(slot) = self.freeze.get_mut(bin) {
            *slot = value;
        }
    }
}

fn finite_or_floor(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        MAGNITUDE_EPSILON
    }
}

/// Smoothing parameters resolved from the configuration once per pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsPolicy {
    pub smoothing: SmoothingMode,
    /// Difference mode glides linearly toward a signed target
    pub signed: bool,
    /// Recompute divisor as float
    pub divisor: f32,
    /// Falling delta is attenuated until it reaches this floor
    pub floor: f32,
    /// Per-pass multiplier applied to a falling delta above the floor
    pub attenuation: f32,
}

impl DynamicsPolicy {
    pub fn from_config(config: &Configuration) -> Self {
        let spectralizer = config.channel_mode.is_spectralizer();
        let (floor, factor) = if spectralizer {
            (FALLING_FLOOR_SPECTRALIZER, FALLING_FACTOR_SPECTRALIZER)
        } else {
            (FALLING_FLOOR, FALLING_FACTOR)
        };
        let divisor = config.cadence_divisor();
        let speed = (crate::audio::constants::CADENCE_BASE - divisor) as f32;

        Self {
            smoothing: config.effective_smoothing(),
            signed: config.channel_mode.is_signed(),
            divisor: divisor as f32,
            floor,
            attenuation: 1.0 - speed / factor,
        }
    }

    /// Right channel always uses the standard falling rate
    pub fn for_right_channel(mut self) -> Self {
        self.floor = FALLING_FLOOR;
        self.attenuation = 1.0 - (crate::audio::constants::CADENCE_BASE as f32 - self.divisor)
            / FALLING_FACTOR;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::config::ChannelMode;

    fn policy(smoothing: SmoothingMode, signed: bool) -> DynamicsPolicy {
        DynamicsPolicy {
            smoothing,
            signed,
            divisor: 4.0,
            floor: FALLING_FLOOR,
            attenuation: 1.0 - 12.0 / FALLING_FACTOR,
        }
    }

    #[test]
    fn hold_tracks_running_max() {
        let mut state = ChannelState::new(8);
        state.raw[2] = -3.0;
        state.absorb_previous(SmoothingMode::Off, 8);
        assert_eq!(state.hold[2], 3.0);

        state.raw[2] = 1.0;
        state.absorb_previous(SmoothingMode::Off, 8);
        assert_eq!(state.hold[2], 3.0);
    }

    #[test]
    fn falling_peak_decays_toward_floor() {
        let mut state = ChannelState::new(8);
        state.raw[1] = 2.0;
        state.absorb_previous(SmoothingMode::Falling, 8);
        assert_eq!(state.smooth[1], 2.0);
        assert_eq!(state.delta[1], 1.0);

        let policy = policy(SmoothingMode::Falling, false);
        let mut previous = state.smooth[1];
        for _ in 0..200 {
            state.step(1, &policy, false, 1.0);
            assert!(state.smooth[1] <= previous);
            previous = state.smooth[1];
        }
        assert!(state.delta[1] <= FALLING_FLOOR);
        assert!(state.delta[1] > FALLING_FLOOR * policy.attenuation - 1e-6);
        assert!(state.smooth[1] < 0.01);
    }

    #[test]
    fn averaging_glides_geometrically() {
        let mut state = ChannelState::new(8);
        state.raw[3] = 1.0;
        state.absorb_previous(SmoothingMode::Averaging, 8);
        state.raw[3] = 16.0;

        let policy = policy(SmoothingMode::Averaging, false);
        state.step(3, &policy, true, 1.0);
        assert!((state.delta[3] - 2.0).abs() < 1e-5);

        for _ in 0..4 {
            state.step(3, &policy, false, 1.0);
        }
        assert!((state.smooth[3] - 16.0).abs() < 1e-3);
    }

    #[test]
    fn signed_averaging_glides_linearly() {
        let mut state = ChannelState::new(8);
        state.raw[3] = 0.8;
        let policy = policy(SmoothingMode::Averaging, true);
        state.step(3, &policy, true, -1.0);
        assert!((state.delta[3] + 0.2).abs() < 1e-6);

        state.step(3, &policy, false, -1.0);
        state.step(3, &policy, false, -1.0);
        assert!((state.smooth[3] + 0.4).abs() < 1e-6);
    }

    #[test]
    fn averaging_from_silence_stays_finite() {
        let mut state = ChannelState::new(4);
        state.raw[0] = 5.0;
        let policy = policy(SmoothingMode::Averaging, false);
        state.step(0, &policy, true, 1.0);
        state.step(0, &policy, false, 1.0);
        assert!(state.delta[0].is_finite());
        assert!(state.smooth[0].is_finite());
    }

    #[test]
    fn clear_keeps_freeze_snapshot() {
        let mut state = ChannelState::new(4);
        state.raw[1] = 1.5;
        state.capture_freeze(1, SmoothingMode::Off, false);
        state.hold[1] = 2.0;
        state.clear();
        assert_eq!(state.hold[1], 0.0);
        assert_eq!(state.raw[1], 0.0);
        assert_eq!(state.frozen_value(1), 1.5);
    }

    #[test]
    fn freeze_snapshot_takes_hold_when_hold_is_shown() {
        let mut state = ChannelState::new(4);
        state.raw[2] = 0.25;
        state.hold[2] = 3.0;
        state.capture_freeze(2, SmoothingMode::Off, true);
        assert_eq!(state.frozen_value(2), 3.0);
        state.capture_freeze(2, SmoothingMode::Off, false);
        assert_eq!(state.frozen_value(2), 0.25);
    }

    #[test]
    fn spectralizer_policy_uses_slow_floor() {
        let config = Configuration {
            channel_mode: ChannelMode::SpectralizerLeft,
            sweep_speed: 6,
            ..Configuration::default()
        };
        let policy = DynamicsPolicy::from_config(&config);
        assert_eq!(policy.floor, FALLING_FLOOR_SPECTRALIZER);
        assert!((policy.attenuation - (1.0 - 6.0 / 50.0)).abs() < 1e-6);
        assert_eq!(policy.for_right_channel().floor, FALLING_FLOOR);
        assert!(!policy.signed);

        let difference = Configuration {
            channel_mode: ChannelMode::Difference,
            ..config
        };
        assert!(DynamicsPolicy::from_config(&difference).signed);
    }
}
