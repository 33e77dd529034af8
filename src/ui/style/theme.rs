use crate::audio::config::{ChannelMode, Configuration, ViewKind};

/// Straight RGBA colour hint handed to the drawing layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// How one overlay pass should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Lines,
    /// Filled bars from the bottom edge
    Bars,
    /// Outlined boxes, used for hold overlays in bar view
    Boxes,
    /// Bars growing away from the centre line
    CenteredBars,
}

/// Draw-mode and colour hint for one pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveStyle {
    pub mode: DrawMode,
    /// `None` keeps the drawing layer's default curve colour
    pub color: Option<Rgba>,
    pub line_width: f32,
}

/// colors and line dimensions only
/// Analysis constants are in audio::constants
pub struct UITheme;

impl UITheme {
    // === COLORS ===

    /// Subtle hold overlay for single-channel and image modes
    pub const HOLD_CURVE: Rgba = Rgba::new(0.35, 0.4, 0.2, 0.2);

    /// Stereo analyzer overlays
    pub const STEREO_LEFT: Rgba = Rgba::new(0.25, 0.10, 0.0, 0.3);
    pub const STEREO_RIGHT: Rgba = Rgba::new(0.05, 0.25, 0.0, 0.3);
    pub const STEREO_LEFT_HOLD: Rgba = Rgba::new(0.45, 0.30, 0.2, 0.2);
    pub const STEREO_RIGHT_HOLD: Rgba = Rgba::new(0.25, 0.45, 0.2, 0.2);

    // === DIMENSIONS ===
    pub const CURVE_LINE_WIDTH: f32 = 0.75;

    /// Grid line opacity
    pub const GRID_ALPHA_MAJOR: f32 = 0.33;
    pub const GRID_ALPHA_MINOR: f32 = 0.2;
}

/// Style hint for `pass` under the given configuration
pub fn curve_style(config: &Configuration, pass: usize) -> CurveStyle {
    let mode = config.channel_mode;
    let bars = config.view_kind == ViewKind::Bars;

    let draw_mode = if mode.is_centered() {
        match (bars, pass > 1) {
            (true, true) => DrawMode::Boxes,
            (true, false) => DrawMode::CenteredBars,
            (false, _) => DrawMode::Lines,
        }
    } else if bars {
        let filled = (pass == 0 && mode.is_single_channel())
            || (pass <= 1 && mode == ChannelMode::Stereo);
        if filled {
            DrawMode::Bars
        } else {
            DrawMode::Boxes
        }
    } else {
        DrawMode::Lines
    };

    CurveStyle {
        mode: draw_mode,
        color: pass_color(mode, pass),
        line_width: UITheme::CURVE_LINE_WIDTH,
    }
}

fn pass_color(mode: ChannelMode, pass: usize) -> Option<Rgba> {
    match (mode, pass) {
        (ChannelMode::Stereo, 0) => Some(UITheme::STEREO_LEFT),
        (ChannelMode::Stereo, 1) => Some(UITheme::STEREO_RIGHT),
        (ChannelMode::Stereo, 2) => Some(UITheme::STEREO_LEFT_HOLD),
        (ChannelMode::Stereo, 3) => Some(UITheme::STEREO_RIGHT_HOLD),
        (ChannelMode::Image, p) if p > 1 => Some(UITheme::HOLD_CURVE),
        (m, 1) if m.is_single_channel() => Some(UITheme::HOLD_CURVE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(channel_mode: ChannelMode, view_kind: ViewKind) -> Configuration {
        Configuration {
            channel_mode,
            view_kind,
            hold_mode: true,
            ..Configuration::default()
        }
    }

    #[test]
    fn bar_view_fills_live_passes_and_boxes_holds() {
        let left = config(ChannelMode::Left, ViewKind::Bars);
        assert_eq!(curve_style(&left, 0).mode, DrawMode::Bars);
        assert_eq!(curve_style(&left, 1).mode, DrawMode::Boxes);

        let stereo = config(ChannelMode::Stereo, ViewKind::Bars);
        assert_eq!(curve_style(&stereo, 1).mode, DrawMode::Bars);
        assert_eq!(curve_style(&stereo, 2).mode, DrawMode::Boxes);
    }

    #[test]
    fn centred_modes_grow_from_the_middle() {
        let image = config(ChannelMode::Image, ViewKind::Bars);
        assert_eq!(curve_style(&image, 0).mode, DrawMode::CenteredBars);
        assert_eq!(curve_style(&image, 3).mode, DrawMode::Boxes);

        let difference = config(ChannelMode::Difference, ViewKind::Splines);
        assert_eq!(curve_style(&difference, 0).mode, DrawMode::Lines);
    }

    #[test]
    fn hold_and_stereo_passes_are_tinted() {
        let left = config(ChannelMode::Left, ViewKind::Lines);
        assert_eq!(curve_style(&left, 0).color, None);
        assert_eq!(curve_style(&left, 1).color, Some(UITheme::HOLD_CURVE));

        let stereo = config(ChannelMode::Stereo, ViewKind::Lines);
        assert_eq!(curve_style(&stereo, 0).color, Some(UITheme::STEREO_LEFT));
        assert_eq!(curve_style(&stereo, 3).color, Some(UITheme::STEREO_RIGHT_HOLD));

        let image = config(ChannelMode::Image, ViewKind::Lines);
        assert_eq!(curve_style(&image, 1).color, None);
        assert_eq!(curve_style(&image, 2).color, Some(UITheme::HOLD_CURVE));
        assert_eq!(curve_style(&image, 2).line_width, UITheme::CURVE_LINE_WIDTH);
    }
}
