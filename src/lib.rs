//! Real-time spectrum analysis core.
//!
//! Audio frames are pushed from the audio thread through a [`SampleIngest`]
//! handle. The draw thread owns the [`Analyzer`], calls
//! [`Analyzer::advance`] once per frame and then reads mapped columns,
//! overlay passes and gridlines. Nothing here paints; the `ui` module only
//! produces geometry and style hints for a drawing layer.

pub mod audio;
pub mod ui;

pub use audio::config::{
    AmplitudeScale, ChannelMode, ConfigError, Configuration, PostMode, RawParameters,
    SmoothingMode, ViewKind,
};
pub use audio::sample_buffer_engine::SampleIngest;
pub use audio::spectrum_analyzer::{Analyzer, DisplayColumn, GraphLayer, Layers};
pub use audio::window_functions::WindowKind;
pub use ui::grid_overlay::{GridRole, Gridline, Orientation};
pub use ui::style::{CurveStyle, DrawMode, Rgba};
