mod component;
mod render;
mod state;

pub use component::LineageGraphCanvas;
pub use state::HighlightSettings;
