/// Window functions for FFT spectral analysis
///
/// Every analysis block is shaped twice before the transform: first by a fixed
/// periodic Hamming taper, then by the user-selected [`WindowKind`]. Both are
/// folded into one [`WindowTable`] whenever the transform size or the window
/// kind changes, so the draw path never evaluates trig functions per bin.
use core::f32::consts::PI;
use libm::{cosf, expf, fabsf, sinf};
use serde::{Deserialize, Serialize};

use super::config::ConfigError;

/// Window function types selectable by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Rectangular: No windowing, maximum frequency resolution
    #[default]
    Rectangular,
    /// Hamming: Better sidelobe suppression
    Hamming,
    /// Hann: Good general-purpose balance
    Hann,
    /// Blackman: Excellent sidelobe suppression, wider main lobe
    Blackman,
    BlackmanHarris,
    BlackmanNuttall,
    Sine,
    Lanczos,
    /// Gaussian with sigma = 0.4
    Gaussian,
    Bartlett,
    Triangular,
    BartlettHann,
}

impl WindowKind {
    pub const ALL: [WindowKind; 12] = [
        Self::Rectangular,
        Self::Hamming,
        Self::Hann,
        Self::Blackman,
        Self::BlackmanHarris,
        Self::BlackmanNuttall,
        Self::Sine,
        Self::Lanczos,
        Self::Gaussian,
        Self::Bartlett,
        Self::Triangular,
        Self::BartlettHann,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Coefficients (a0, a1, a2, a3) of the generalized cosine-sum family
    /// w[n] = a0 - a1 cos(2πn/M) + a2 cos(4πn/M) - a3 cos(6πn/M)
    fn cosine_sum(self) -> Option<(f64, f64, f64, f64)> {
        match self {
            Self::Hamming => Some((0.54, 0.46, 0.0, 0.0)),
            Self::Hann => Some((0.5, 0.5, 0.0, 0.0)),
            Self::Blackman => Some((0.42, 0.5, 0.08, 0.0)),
            Self::BlackmanHarris => Some((0.35875, 0.48829, 0.14128, 0.01168)),
            Self::BlackmanNuttall => Some((0.3635819, 0.4891775, 0.1365995, 0.0106411)),
            _ => None,
        }
    }
}

impl TryFrom<u8> for WindowKind {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(ConfigError::UnknownCode {
                parameter: "window",
                code,
            })
    }
}

/// Weight of the user-selected window at bin `i` of a `size`-point block
///
/// Symmetric closed forms over M = size - 1. Indices outside `0..size` are
/// clamped to the last bin.
pub fn weight(i: usize, size: usize, kind: WindowKind) -> f32 {
    if size <= 1 {
        return 1.0;
    }
    let m = (size - 1) as f32;
    let n = i.min(size - 1) as f32;
    let half = m / 2.0;

    match kind {
        WindowKind::Rectangular => 1.0,
        WindowKind::Hamming
        | WindowKind::Hann
        | WindowKind::Blackman
        | WindowKind::BlackmanHarris
        | WindowKind::BlackmanNuttall => {
            let (a0, a1, a2, a3) = kind.cosine_sum().unwrap_or((1.0, 0.0, 0.0, 0.0));
            let phase = 2.0 * PI * n / m;
            a0 as f32 - a1 as f32 * cosf(phase) + a2 as f32 * cosf(2.0 * phase)
                - a3 as f32 * cosf(3.0 * phase)
        }
        WindowKind::Sine => sinf(PI * n / m),
        WindowKind::Lanczos => sinc(2.0 * n / m - 1.0),
        WindowKind::Gaussian => {
            const SIGMA: f32 = 0.4;
            let x = (n - half) / (SIGMA * half);
            expf(-0.5 * x * x)
        }
        WindowKind::Bartlett => 1.0 - fabsf((n - half) / half),
        WindowKind::Triangular => 1.0 - fabsf((n - half) / (size as f32 / 2.0)),
        WindowKind::BartlettHann => {
            0.62 - 0.48 * fabsf(n / m - 0.5) - 0.38 * cosf(2.0 * PI * n / m)
        }
    }
}

/// Fixed periodic Hamming taper applied ahead of the selected window
#[inline]
pub fn analysis_weight(i: usize, size: usize) -> f32 {
    0.54 - 0.46 * cosf(2.0 * PI * i as f32 / size.max(1) as f32)
}

fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        sinf(PI * x) / (PI * x)
    }
}

/// Pre-computed product of the analysis taper and the selected window
pub struct WindowTable {
    kind: WindowKind,
    coefficients: Vec<f32>,
}

impl WindowTable {
    pub fn new(kind: WindowKind, size: usize) -> Self {
        let mut table = Self {
            kind,
            coefficients: Vec::new(),
        };
        table.rebuild(kind, size);
        table
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Recompute coefficients, reusing the allocation when the size is unchanged
    pub fn rebuild(&mut self, kind: WindowKind, size: usize) {
        self.kind = kind;
        self.coefficients.clear();
        self.coefficients.resize(size, 1.0);

        match kind.cosine_sum() {
            Some((a0, a1, a2, a3)) if size > 1 => {
                for (coeff, w) in self
                    .coefficients
                    .iter_mut()
                    .zip(apodize::cosine_iter(a0, a1, a2, a3, size))
                {
                    *coeff = w as f32;
                }
            }
            _ => {
                for (i, coeff) in self.coefficients.iter_mut().enumerate() {
                    *coeff = weight(i, size, kind);
                }
            }
        }

        for (i, coeff) in self.coefficients.iter_mut().enumerate() {
            *coeff *= analysis_weight(i, size);
        }
    }

    /// Combined weight at bin `i`; zero outside the table
    #[inline]
    pub fn at(&self, i: usize) -> f32 {
        self.coefficients.get(i).copied().unwrap_or(0.0)
    }
}
