//! Format specs attached to placeholders
//!
//! String fields accept `[[fill]align][width]`:
//!
//! - `align` is `<` (left), `>` (right) or `^` (center)
//! - `fill` is whatever precedes the alignment character, one space if absent;
//!   it may be more than one codepoint
//! - `width` is a decimal count of codepoints, `0` meaning no padding
//!
//! Numeric fields accept `[align][0][width]`, where `0` pads with zeros.

use crate::core::error::PatternError;
use std::fmt;

/// Largest accepted field width, in codepoints.
pub const MAX_WIDTH: usize = 0xFFFF;

const DEFAULT_FILL: &str = " ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    /// No alignment given; pads like [`Align::Left`].
    #[default]
    None,
    Left,
    Right,
    Center,
}

impl Align {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            _ => None,
        }
    }

    /// Split `padding` into (left, right) shares.
    #[inline]
    pub fn split(self, padding: usize) -> (usize, usize) {
        match self {
            Align::Right => (padding, 0),
            Align::Center => (padding / 2, padding - padding / 2),
            Align::Left | Align::None => (0, padding),
        }
    }
}

/// Width, alignment and fill of a string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSpec {
    pub width: usize,
    pub align: Align,
    pub fill: String,
}

impl Default for StringSpec {
    fn default() -> Self {
        Self {
            width: 0,
            align: Align::None,
            fill: DEFAULT_FILL.to_string(),
        }
    }
}

impl StringSpec {
    /// Parse the text after `name:` in a string placeholder.
    pub fn parse(field: &str, spec: &str) -> Result<Self, PatternError> {
        if spec.is_empty() {
            return Ok(Self::default());
        }

        let head_len = spec.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (head, digits) = spec.split_at(head_len);
        let width = parse_width(field, digits)?;

        let mut chars = head.chars();
        let (align, fill) = match chars.next_back() {
            None => (Align::None, DEFAULT_FILL),
            Some(last) => {
                let align = Align::from_char(last).ok_or_else(|| {
                    PatternError::invalid_spec(
                        field,
                        spec,
                        format!(
                            "unexpected '{}', expected [[fill]align][width] with align one of '<', '>', '^'",
                            last
                        ),
                    )
                })?;
                let fill = chars.as_str();
                (align, if fill.is_empty() { DEFAULT_FILL } else { fill })
            }
        };

        Ok(Self {
            width,
            align,
            fill: fill.to_string(),
        })
    }
}

/// Width and padding of a numeric field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumericSpec {
    pub width: usize,
    pub align: Align,
    pub zero_pad: bool,
}

impl NumericSpec {
    pub const fn zero_padded(width: usize) -> Self {
        Self {
            width,
            align: Align::None,
            zero_pad: true,
        }
    }

    /// Parse the text after `name:` in a numeric placeholder; `default`
    /// applies when there is none.
    pub fn parse(field: &str, spec: &str, default: NumericSpec) -> Result<Self, PatternError> {
        if spec.is_empty() {
            return Ok(default);
        }

        let mut rest = spec;
        let mut align = Align::None;
        if let Some(first) = rest.chars().next() {
            if let Some(parsed) = Align::from_char(first) {
                align = parsed;
                rest = &rest[first.len_utf8()..];
            }
        }

        let zero_pad = rest.len() > 1 && rest.starts_with('0');
        if zero_pad {
            rest = &rest[1..];
        }
        if zero_pad && align != Align::None {
            return Err(PatternError::invalid_spec(
                field,
                spec,
                "zero padding cannot be combined with alignment",
            ));
        }
        if let Some(bad) = rest.chars().find(|c| !c.is_ascii_digit()) {
            return Err(PatternError::invalid_spec(
                field,
                spec,
                format!("unsupported type suffix '{}'", bad),
            ));
        }

        Ok(Self {
            width: parse_width(field, rest)?,
            align,
            zero_pad,
        })
    }

    /// Write `value` padded per this spec.
    pub fn write<W: fmt::Write + ?Sized>(&self, out: &mut W, value: u64) -> fmt::Result {
        let width = self.width;
        if width == 0 {
            return write!(out, "{}", value);
        }
        if self.zero_pad {
            return write!(out, "{:0width$}", value);
        }
        match self.align {
            Align::Left => write!(out, "{:<width$}", value),
            Align::Center => write!(out, "{:^width$}", value),
            Align::Right | Align::None => write!(out, "{:>width$}", value),
        }
    }
}

fn parse_width(field: &str, digits: &str) -> Result<usize, PatternError> {
    if digits.is_empty() {
        return Ok(0);
    }
    let overflow = || PatternError::WidthOverflow {
        field: field.to_string(),
        width: digits.to_string(),
        max: MAX_WIDTH,
    };
    let width: usize = digits.parse().map_err(|_| overflow())?;
    if width > MAX_WIDTH {
        return Err(overflow());
    }
    Ok(width)
}
