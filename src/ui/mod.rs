pub mod grid_overlay;
pub mod style;

pub use grid_overlay::{Gridline, GridlineGenerator, Orientation};
pub use style::UITheme;
