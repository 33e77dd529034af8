pub mod theme;

pub use theme::{curve_style, CurveStyle, DrawMode, Rgba, UITheme};
