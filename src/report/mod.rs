//! Report module - terminal tables and build summaries

pub mod render;
pub mod summary;

pub use render::*;
pub use summary::*;
