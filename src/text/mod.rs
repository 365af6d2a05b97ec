//! Text primitives used by pattern rendering

pub mod buffer;
pub mod cached;
pub mod codepoints;

pub use buffer::{GrowableBuffer, DEFAULT_INLINE_CAPACITY};
pub use cached::{CachedStr, CachedString};
pub use codepoints::{count_codepoints, CodeUnit};
