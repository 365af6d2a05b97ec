//! Pattern compiler and renderer

pub mod compiler;
pub mod level_names;
pub mod render;
pub mod spec;

pub use compiler::{CompiledPattern, Field, Segment, DEFAULT_PATTERN};
pub use level_names::LevelNames;
pub use spec::{Align, NumericSpec, StringSpec, MAX_WIDTH};
