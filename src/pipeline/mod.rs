//! Pipeline module - ABT construction and analysis steps

pub mod abt;
pub mod binning;
pub mod calendar;
pub mod diagnostics;
pub mod export;
pub mod features;
pub mod history;
pub mod loader;
pub mod preprocess;

pub use abt::*;
pub use binning::*;
pub use calendar::*;
pub use diagnostics::*;
pub use export::*;
pub use features::*;
pub use history::*;
pub use loader::*;
pub use preprocess::*;
