//! Codepoint counting and transcoding for the supported code unit types
//!
//! Field widths in patterns are measured in Unicode scalar values, never in
//! bytes or UTF-16 units. Every buffer element type implements [`CodeUnit`],
//! which knows how to count scalars in an already-encoded slice and how to
//! append UTF-8 text in its own encoding.

use std::fmt;

/// An element type a pattern can render into.
///
/// - `u8`: UTF-8
/// - `u16`: UTF-16 (the "wide" encoding on some platforms)
/// - `u32`: UTF-32
pub trait CodeUnit: Copy + Default + Eq + fmt::Debug + Send + Sync + 'static {
    /// Number of Unicode scalar values in `units`.
    ///
    /// Malformed sequences are counted leniently: every unit that could start
    /// a scalar counts as one.
    fn count_codepoints(units: &[Self]) -> usize;

    /// Number of units `text` occupies once transcoded into this encoding.
    fn encoded_len(text: &str) -> usize;

    /// Transcode `text` and append it to `out`.
    fn encode<E: Extend<Self>>(text: &str, out: &mut E);
}

impl CodeUnit for u8 {
    #[inline]
    fn count_codepoints(units: &[Self]) -> usize {
        // Continuation bytes are 0b10xx_xxxx.
        units.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
    }

    #[inline]
    fn encoded_len(text: &str) -> usize {
        text.len()
    }

    #[inline]
    fn encode<E: Extend<Self>>(text: &str, out: &mut E) {
        out.extend(text.bytes());
    }
}

impl CodeUnit for u16 {
    #[inline]
    fn count_codepoints(units: &[Self]) -> usize {
        units
            .iter()
            .filter(|&&u| !(0xDC00..=0xDFFF).contains(&u))
            .count()
    }

    #[inline]
    fn encoded_len(text: &str) -> usize {
        text.chars().map(char::len_utf16).sum()
    }

    #[inline]
    fn encode<E: Extend<Self>>(text: &str, out: &mut E) {
        out.extend(text.encode_utf16());
    }
}

impl CodeUnit for u32 {
    #[inline]
    fn count_codepoints(units: &[Self]) -> usize {
        units.len()
    }

    #[inline]
    fn encoded_len(text: &str) -> usize {
        text.chars().count()
    }

    #[inline]
    fn encode<E: Extend<Self>>(text: &str, out: &mut E) {
        out.extend(text.chars().map(u32::from));
    }
}

/// Count the Unicode scalar values of UTF-8 text.
#[inline]
pub fn count_codepoints(text: &str) -> usize {
    u8::count_codepoints(text.as_bytes())
}
