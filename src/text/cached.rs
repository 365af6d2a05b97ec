//! Strings that remember their codepoint count
//!
//! Padding a field needs the value's width in codepoints, and counting is a
//! full scan. Category names and level names are rendered on every call, so
//! their count is computed once and cached.
//!
//! A [`CachedString`] owns the text and the canonical count cell. A
//! [`CachedStr`] is a borrowed view: views covering the whole owner borrow the
//! owner's cell, so whichever side counts first fills it for both. Views over
//! arbitrary text or over a sub-range carry their own cell instead of sharing
//! a mutable alias; the cost is one extra count per such view.

use super::codepoints::count_codepoints;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cell::OnceCell;
use std::fmt;
use std::ops::{Deref, Range};
use std::sync::OnceLock;

/// Owned text with a lazily computed, thread-safe codepoint count.
#[derive(Default)]
pub struct CachedString {
    text: Box<str>,
    codepoints: OnceLock<usize>,
}

impl CachedString {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().into_boxed_str(),
            codepoints: OnceLock::new(),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Codepoint count, computed on first use.
    #[inline]
    pub fn codepoints(&self) -> usize {
        *self.codepoints.get_or_init(|| count_codepoints(&self.text))
    }

    /// `true` once the count has been computed, by this string or any view of it.
    pub fn is_counted(&self) -> bool {
        self.codepoints.get().is_some()
    }

    /// A view over the whole string sharing this string's count cell.
    #[inline]
    pub fn view(&self) -> CachedStr<'_> {
        CachedStr {
            text: &self.text,
            count: CountCell::Shared(&self.codepoints),
        }
    }
}

impl Clone for CachedString {
    fn clone(&self) -> Self {
        let codepoints = OnceLock::new();
        if let Some(&count) = self.codepoints.get() {
            let _ = codepoints.set(count);
        }
        Self {
            text: self.text.clone(),
            codepoints,
        }
    }
}

impl PartialEq for CachedString {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for CachedString {}

impl fmt::Debug for CachedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.text, f)
    }
}

impl fmt::Display for CachedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Deref for CachedString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl From<&str> for CachedString {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for CachedString {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl Serialize for CachedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for CachedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[derive(Clone)]
enum CountCell<'a> {
    Local(OnceCell<usize>),
    Shared(&'a OnceLock<usize>),
}

/// Borrowed text with a lazily computed codepoint count.
#[derive(Clone)]
pub struct CachedStr<'a> {
    text: &'a str,
    count: CountCell<'a>,
}

impl<'a> CachedStr<'a> {
    /// A view with its own, not yet computed, count.
    #[inline]
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            count: CountCell::Local(OnceCell::new()),
        }
    }

    /// A view whose count is stored in `cell`, shared with whoever owns it.
    #[inline]
    pub fn with_shared_count(text: &'a str, cell: &'a OnceLock<usize>) -> Self {
        Self {
            text,
            count: CountCell::Shared(cell),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Codepoint count, computed on first use.
    #[inline]
    pub fn codepoints(&self) -> usize {
        let text = self.text;
        match &self.count {
            CountCell::Local(cell) => *cell.get_or_init(|| count_codepoints(text)),
            CountCell::Shared(cell) => *cell.get_or_init(|| count_codepoints(text)),
        }
    }

    /// A view over `range` (byte offsets on char boundaries).
    ///
    /// The full range keeps sharing the parent's cell; any other range gets a
    /// fresh one.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds or not on char boundaries.
    pub fn slice(&self, range: Range<usize>) -> CachedStr<'a> {
        if range.start == 0 && range.end == self.text.len() {
            return self.clone();
        }
        CachedStr::new(&self.text[range])
    }
}

impl<'a> From<&'a str> for CachedStr<'a> {
    fn from(text: &'a str) -> Self {
        Self::new(text)
    }
}

impl<'a> From<&'a CachedString> for CachedStr<'a> {
    fn from(owner: &'a CachedString) -> Self {
        owner.view()
    }
}

impl Deref for CachedStr<'_> {
    type Target = str;

    fn deref(&self) -> &str {
        self.text
    }
}

impl fmt::Debug for CachedStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.text, f)
    }
}

impl fmt::Display for CachedStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}
