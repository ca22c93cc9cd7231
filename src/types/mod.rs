//! Core types shared by every pipeline stage.

mod colour;
mod frame;
pub mod palette;
mod spec;

pub use colour::Colour;
pub use frame::{content_bounds, ContentBounds, Pivot, ProcessedFrame, RawFrame};
pub use spec::{
    Constraints, GenerationSpec, PaletteConstraint, Resolution, SpecBuilder, Style, ViewAngle,
    DEFAULT_ACTION, DEFAULT_THEME, MAX_BATCH_PIXELS, MAX_EDGE, MAX_FRAMES,
};
