//! Core data models: paper records and page geometry.

mod geometry;
mod paper;

pub use geometry::{
    GeometrySettings, Orientation, DEFAULT_HEIGHT, DEFAULT_MARGIN, DEFAULT_WIDTH,
};
pub use paper::{Paper, PaperBuilder};
