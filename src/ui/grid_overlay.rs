use crate::audio::config::{ChannelMode, LevelCoefficients};
use crate::audio::constants::{self, FREQUENCY_GRIDLINES, MAX_AMPLITUDE_GRIDLINES};
use crate::ui::UITheme;

/// Axis a gridline runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Constant frequency, spans the amplitude axis
    Vertical,
    /// Constant amplitude, spans the frequency axis
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridRole {
    Frequency,
    Amplitude,
    /// Zero line of the centred modes
    Center,
}

/// One gridline in normalized display coordinates
///
/// Vertical lines sit at `0.0..=1.0` across the frequency axis. Horizontal lines
/// sit at `-1.0..=1.0` on the amplitude axis, `0.0` being the centre line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gridline {
    pub position: f32,
    pub orientation: Orientation,
    pub role: GridRole,
    pub label: Option<&'static str>,
    pub dashed: bool,
    pub alpha: f32,
}

/// Cursor of the gridline walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridState {
    #[default]
    Idle,
    FrequencyTicks(usize),
    AmplitudeLower(usize),
    AmplitudeUpper(usize),
    AmplitudeCenter,
    Done,
}

/// Labels of the even image ticks, 0 dB down in 12 dB steps
const IMAGE_DB_LABELS: [&str; MAX_AMPLITUDE_GRIDLINES / 2] = [
    "0 dB", "-12 dB", "-24 dB", "-36 dB", "-48 dB", "-60 dB", "-72 dB", "-84 dB", "-96 dB",
    "-108 dB", "-120 dB", "-132 dB", "-144 dB", "-156 dB", "-168 dB", "-180 dB",
];

/// Labels of the even difference ticks, -72 dB up in 12 dB steps
const DIFFERENCE_DB_LABELS: [&str; MAX_AMPLITUDE_GRIDLINES / 2] = [
    "-72 dB", "-60 dB", "-48 dB", "-36 dB", "-24 dB", "-12 dB", "0 dB", "12 dB", "24 dB",
    "36 dB", "48 dB", "60 dB", "72 dB", "84 dB", "96 dB", "108 dB",
];

/// Amplitude walk flavour for the centred modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmplitudeWalk {
    /// 0 dB at both edges, walking toward the centre in -6 dB steps
    Image,
    /// -72 dB at the centre, walking outward in +6 dB steps
    Difference,
}

impl AmplitudeWalk {
    fn for_mode(mode: ChannelMode) -> Option<Self> {
        match mode {
            ChannelMode::Image => Some(Self::Image),
            ChannelMode::Difference => Some(Self::Difference),
            _ => None,
        }
    }

    fn lower_position(self, k: usize, levels: &LevelCoefficients) -> f32 {
        match self {
            Self::Image => constants::db_grid(octave(-(k as i32)), levels.main, 1.0),
            Self::Difference => constants::db_grid(octave(k as i32), levels.difference, 0.0),
        }
    }

    fn upper_position(self, k: usize, levels: &LevelCoefficients) -> f32 {
        match self {
            Self::Image => -constants::db_grid(octave(-(k as i32)), levels.main, 1.0),
            Self::Difference => -constants::db_grid(octave(k as i32), levels.difference, 0.0),
        }
    }

    fn lower_exhausted(self, position: f32) -> bool {
        match self {
            Self::Image => position < 0.0,
            Self::Difference => position > 1.0,
        }
    }

    /// Label of tick `k`, odd ticks are unlabelled
    fn label(self, k: usize) -> Option<&'static str> {
        if k % 2 != 0 {
            return None;
        }
        let table = match self {
            Self::Image => &IMAGE_DB_LABELS,
            Self::Difference => &DIFFERENCE_DB_LABELS,
        };
        table.get(k / 2).copied()
    }

    fn tick(self, k: usize, position: f32) -> Gridline {
        let labelled = k % 2 == 0;
        Gridline {
            position,
            orientation: Orientation::Horizontal,
            role: GridRole::Amplitude,
            label: self.label(k),
            dashed: !labelled,
            alpha: if k == 0 {
                UITheme::GRID_ALPHA_MAJOR
            } else {
                UITheme::GRID_ALPHA_MINOR
            },
        }
    }
}

/// 2^exponent as an amplitude ratio
fn octave(exponent: i32) -> f32 {
    libm::powf(2.0, exponent as f32)
}

/// Frequency of the `index`-th tick: 10..90 Hz, 100..900 Hz, 1..9 kHz, then 10 kHz
pub fn tick_frequency(index: usize) -> f32 {
    match index {
        0..=8 => 10.0 * (index + 1) as f32,
        9..=17 => 100.0 * (index - 8) as f32,
        18..=26 => 1000.0 * (index - 17) as f32,
        _ => 10_000.0 * (index - 26) as f32,
    }
}

fn frequency_label(index: usize) -> Option<&'static str> {
    match index {
        9 => Some("100 Hz"),
        18 => Some("1 kHz"),
        27 => Some("10 kHz"),
        _ => None,
    }
}

fn frequency_gridline(index: usize) -> Gridline {
    let label = frequency_label(index);
    Gridline {
        position: constants::freq_to_log_position(tick_frequency(index)),
        orientation: Orientation::Vertical,
        role: GridRole::Frequency,
        alpha: if label.is_some() {
            UITheme::GRID_ALPHA_MAJOR
        } else {
            UITheme::GRID_ALPHA_MINOR
        },
        label,
        dashed: false,
    }
}

/// Emits gridlines one call at a time
///
/// Call index 0 restarts the walk. Default, stereo and spectralizer modes stop
/// after the frequency ticks; image and difference continue with amplitude
/// ticks on both halves of the display.
#[derive(Debug, Clone, Default)]
pub struct GridlineGenerator {
    state: GridState,
}

impl GridlineGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    pub fn next(
        &mut self,
        call_index: usize,
        mode: ChannelMode,
        levels: &LevelCoefficients,
    ) -> Option<Gridline> {
        if call_index == 0 || self.state == GridState::Idle {
            self.state = GridState::FrequencyTicks(0);
        }
        let walk = AmplitudeWalk::for_mode(mode);

        loop {
            match (self.state, walk) {
                (GridState::Idle | GridState::Done, _) => return None,
                (GridState::FrequencyTicks(i), _) if i < FREQUENCY_GRIDLINES => {
                    self.state = GridState::FrequencyTicks(i + 1);
                    return Some(frequency_gridline(i));
                }
                (GridState::FrequencyTicks(_), Some(_)) => {
                    self.state = GridState::AmplitudeLower(0);
                }
                (_, None) => self.state = GridState::Done,
                (GridState::AmplitudeLower(k), Some(walk)) => {
                    let position = walk.lower_position(k, levels);
                    if k >= MAX_AMPLITUDE_GRIDLINES || walk.lower_exhausted(position) {
                        self.state = GridState::AmplitudeUpper(1);
                        continue;
                    }
                    self.state = GridState::AmplitudeLower(k + 1);
                    return Some(walk.tick(k, position));
                }
                (GridState::AmplitudeUpper(k), Some(walk)) => {
                    let position = walk.upper_position(k, levels);
                    let exhausted = k >= MAX_AMPLITUDE_GRIDLINES;
                    match walk {
                        AmplitudeWalk::Image if exhausted || position > 0.0 => {
                            self.state = GridState::AmplitudeCenter;
                        }
                        AmplitudeWalk::Difference if exhausted || position < -1.0 => {
                            self.state = GridState::Done;
                        }
                        _ => {
                            self.state = GridState::AmplitudeUpper(k + 1);
                            return Some(walk.tick(k, position));
                        }
                    }
                }
                (GridState::AmplitudeCenter, Some(_)) => {
                    self.state = GridState::Done;
                    return Some(Gridline {
                        position: 0.0,
                        orientation: Orientation::Horizontal,
                        role: GridRole::Center,
                        label: None,
                        dashed: false,
                        alpha: UITheme::GRID_ALPHA_MAJOR,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mode: ChannelMode, level: f32) -> Vec<Gridline> {
        let levels = LevelCoefficients::from_level(level);
        let mut generator = GridlineGenerator::new();
        let mut lines = Vec::new();
        let mut index = 0;
        while let Some(line) = generator.next(index, mode, &levels) {
            lines.push(line);
            index += 1;
            assert!(index < 200, "gridline walk did not terminate");
        }
        lines
    }

    #[test]
    fn frequency_ticks_cover_decades_with_three_labels() {
        let lines = drain(ChannelMode::Left, 1.0);
        assert_eq!(lines.len(), FREQUENCY_GRIDLINES);
        assert!(lines.iter().all(|l| l.orientation == Orientation::Vertical));

        let labels: Vec<&str> = lines.iter().filter_map(|l| l.label).collect();
        assert_eq!(labels, ["100 Hz", "1 kHz", "10 kHz"]);
        assert!((lines[18].position - constants::freq_to_log_position(1000.0)).abs() < 1e-6);
        assert_eq!(tick_frequency(27), 10_000.0);
        assert!(lines[9].alpha > lines[10].alpha);
    }

    #[test]
    fn image_mode_emits_one_centre_line_then_stops() {
        let levels = LevelCoefficients::from_level(1.0);
        let lines = drain(ChannelMode::Image, 1.0);
        let centres = lines.iter().filter(|l| l.role == GridRole::Center).count();
        assert_eq!(centres, 1);
        assert_eq!(lines.last().map(|l| l.role), Some(GridRole::Center));

        let amplitude = &lines[FREQUENCY_GRIDLINES..];
        assert_eq!(amplitude[0].label, Some("0 dB"));
        assert!((amplitude[0].position - 1.0).abs() < 1e-6);
        assert!(amplitude[1].dashed);
        assert!(amplitude.iter().any(|l| l.position < 0.0));

        // the walk stays finished without flipping between halves
        let mut generator = GridlineGenerator::new();
        let mut index = 0;
        while generator.next(index, ChannelMode::Image, &levels).is_some() {
            index += 1;
        }
        for extra in 1..10 {
            assert!(generator
                .next(index + extra, ChannelMode::Image, &levels)
                .is_none());
            assert_eq!(generator.state(), GridState::Done);
        }
    }

    #[test]
    fn difference_mode_walks_out_from_minus_72_db() {
        let lines = drain(ChannelMode::Difference, 1.0);
        let amplitude = &lines[FREQUENCY_GRIDLINES..];
        assert_eq!(amplitude[0].label, Some("-72 dB"));
        assert!(amplitude[0].position.abs() < 1e-6);
        assert!(amplitude.iter().all(|l| l.position.abs() <= 1.0 + 1e-6));
        assert!(amplitude.iter().any(|l| l.position > 0.5));
        assert!(amplitude.iter().any(|l| l.position < -0.5));
        assert!(!lines.iter().any(|l| l.role == GridRole::Center));
    }

    #[test]
    fn amplitude_labels_cover_every_even_tick() {
        for walk in [AmplitudeWalk::Image, AmplitudeWalk::Difference] {
            for k in 0..MAX_AMPLITUDE_GRIDLINES {
                let db = match walk {
                    AmplitudeWalk::Image => -6 * k as i32,
                    AmplitudeWalk::Difference => 6 * k as i32 - 72,
                };
                let expected = format!("{db} dB");
                assert_eq!(walk.label(k), (k % 2 == 0).then_some(expected.as_str()));
            }
        }
    }

    #[test]
    fn difference_halves_share_label_parity() {
        let lines = drain(ChannelMode::Difference, 1.0);
        let amplitude = &lines[FREQUENCY_GRIDLINES..];
        let split = amplitude
            .iter()
            .position(|l| l.position < 0.0)
            .unwrap();
        let (lower, upper) = amplitude.split_at(split);

        // upper tick k mirrors lower tick k, so labels and dashes line up
        assert_eq!(upper[0].label, None);
        assert!(upper[0].dashed);
        for (lower, upper) in lower.iter().skip(1).zip(upper) {
            assert_eq!(lower.label, upper.label);
            assert_eq!(lower.dashed, upper.dashed);
            assert!((lower.position + upper.position).abs() < 1e-6);
        }
    }

    #[test]
    fn extreme_levels_still_terminate() {
        for level in [1.0 / 64.0, 16.0] {
            for mode in [ChannelMode::Image, ChannelMode::Difference] {
                let lines = drain(mode, level);
                assert!(lines.len() <= FREQUENCY_GRIDLINES + 2 * MAX_AMPLITUDE_GRIDLINES + 1);
            }
        }
    }

    #[test]
    fn call_index_zero_restarts_the_walk() {
        let levels = LevelCoefficients::from_level(1.0);
        let mut generator = GridlineGenerator::new();
        for index in 0..5 {
            generator.next(index, ChannelMode::Stereo, &levels);
        }
        let first = generator.next(0, ChannelMode::Stereo, &levels);
        assert_eq!(first, Some(frequency_gridline(0)));
    }
}
