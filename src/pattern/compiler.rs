//! Template compilation
//!
//! A template such as `"[{time}] {level:<7} {category} - {message}"` is parsed
//! once into a list of [`Segment`]s. Literal text is unescaped (`{{` and `}}`)
//! into a buffer owned by the compiled pattern, and literal segments refer to
//! ranges of it, so the caller's template need not outlive compilation.

use super::spec::{NumericSpec, StringSpec};
use crate::core::error::PatternError;
use crate::core::timestamp::TimestampFormat;
use std::fmt;
use std::ops::Range;

/// Pattern used by loggers that were never given one.
pub const DEFAULT_PATTERN: &str = "[{time}.{msec}] [{level}] {category} - {message}";

/// A record attribute a placeholder can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Category,
    Level,
    File,
    Line,
    Function,
    Message,
    Time,
    Msec,
    Usec,
    Nsec,
    Thread,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Category,
        Field::Level,
        Field::File,
        Field::Line,
        Field::Function,
        Field::Message,
        Field::Time,
        Field::Msec,
        Field::Usec,
        Field::Nsec,
        Field::Thread,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Category => "category",
            Field::Level => "level",
            Field::File => "file",
            Field::Line => "line",
            Field::Function => "function",
            Field::Message => "message",
            Field::Time => "time",
            Field::Msec => "msec",
            Field::Usec => "usec",
            Field::Nsec => "nsec",
            Field::Thread => "thread",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Byte range into the pattern's literal buffer
    Literal(Range<usize>),
    Category(StringSpec),
    Level(StringSpec),
    File(StringSpec),
    Function(StringSpec),
    Message(StringSpec),
    Line(NumericSpec),
    Thread(NumericSpec),
    Msec(NumericSpec),
    Usec(NumericSpec),
    Nsec(NumericSpec),
    Time(TimestampFormat),
}

impl Segment {
    /// The field this segment renders; `None` for literals.
    pub fn field(&self) -> Option<Field> {
        let field = match self {
            Segment::Literal(_) => return None,
            Segment::Category(_) => Field::Category,
            Segment::Level(_) => Field::Level,
            Segment::File(_) => Field::File,
            Segment::Function(_) => Field::Function,
            Segment::Message(_) => Field::Message,
            Segment::Line(_) => Field::Line,
            Segment::Thread(_) => Field::Thread,
            Segment::Msec(_) => Field::Msec,
            Segment::Usec(_) => Field::Usec,
            Segment::Nsec(_) => Field::Nsec,
            Segment::Time(_) => Field::Time,
        };
        Some(field)
    }

    fn parse_placeholder(body: &str, position: usize) -> Result<Self, PatternError> {
        let (name, spec) = body.split_once(':').unwrap_or((body, ""));
        let field = Field::from_name(name).ok_or_else(|| PatternError::UnknownPlaceholder {
            name: name.to_string(),
            position,
        })?;

        let numeric = |default| NumericSpec::parse(name, spec, default);
        let segment = match field {
            Field::Category => Segment::Category(StringSpec::parse(name, spec)?),
            Field::Level => Segment::Level(StringSpec::parse(name, spec)?),
            Field::File => Segment::File(StringSpec::parse(name, spec)?),
            Field::Function => Segment::Function(StringSpec::parse(name, spec)?),
            Field::Message => Segment::Message(StringSpec::parse(name, spec)?),
            Field::Line => Segment::Line(numeric(NumericSpec::default())?),
            Field::Thread => Segment::Thread(numeric(NumericSpec::default())?),
            Field::Msec => Segment::Msec(numeric(NumericSpec::zero_padded(3))?),
            Field::Usec => Segment::Usec(numeric(NumericSpec::zero_padded(6))?),
            Field::Nsec => Segment::Nsec(numeric(NumericSpec::zero_padded(9))?),
            Field::Time => Segment::Time(TimestampFormat::parse(spec).ok_or_else(|| {
                PatternError::InvalidTimeFormat {
                    format: spec.to_string(),
                }
            })?),
        };
        Ok(segment)
    }
}

/// A template parsed into segments, ready to be replayed against records.
///
/// # Example
///
/// ```
/// use pattern_sink_logger::pattern::CompiledPattern;
/// use pattern_sink_logger::text::GrowableBuffer;
/// use pattern_sink_logger::{LogLevel, Record};
///
/// let pattern = CompiledPattern::compile("{category:*^10}|{message}").unwrap();
/// let record = Record::new(LogLevel::Info, "ready").with_category("ab");
///
/// let mut buf: GrowableBuffer<u8, 64> = GrowableBuffer::new();
/// pattern.format(&mut buf, &record);
/// assert_eq!(&buf[..], b"****ab****|ready");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    template: Box<str>,
    literals: Box<str>,
    segments: Vec<Segment>,
}

impl CompiledPattern {
    /// Parse `template`.
    ///
    /// `{` and `}` delimit placeholders; `{{` and `}}` are literal braces. A
    /// template that yields no segment at all renders the message.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let mut literals = String::with_capacity(template.len());
        let mut segments = Vec::new();
        let mut run_start = 0;
        // Offset of the '{' that opened the placeholder being scanned.
        let mut open: Option<usize> = None;
        let mut chars = template.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match (open, c) {
                (None, '{') => {
                    if chars.next_if(|&(_, next)| next == '{').is_some() {
                        literals.push('{');
                    } else {
                        open = Some(pos);
                    }
                }
                (None, '}') => {
                    if chars.next_if(|&(_, next)| next == '}').is_none() {
                        return Err(PatternError::UnmatchedCloseBrace { position: pos });
                    }
                    literals.push('}');
                }
                (None, c) => literals.push(c),
                (Some(start), '}') => {
                    if literals.len() > run_start {
                        segments.push(Segment::Literal(run_start..literals.len()));
                    }
                    segments.push(Segment::parse_placeholder(&template[start + 1..pos], start)?);
                    run_start = literals.len();
                    open = None;
                }
                (Some(start), '{') => {
                    return Err(PatternError::UnmatchedOpenBrace { position: start })
                }
                (Some(_), _) => {}
            }
        }

        if let Some(start) = open {
            return Err(PatternError::UnmatchedOpenBrace { position: start });
        }
        if literals.len() > run_start {
            segments.push(Segment::Literal(run_start..literals.len()));
        }
        if segments.is_empty() {
            segments.push(Segment::Message(StringSpec::default()));
        }

        Ok(Self {
            template: template.into(),
            literals: literals.into_boxed_str(),
            segments,
        })
    }

    /// A pattern that renders only the message.
    pub fn message_only() -> Self {
        Self {
            template: "{message}".into(),
            literals: "".into(),
            segments: vec![Segment::Message(StringSpec::default())],
        }
    }

    /// The template this pattern was compiled from.
    #[inline]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Text of a [`Segment::Literal`] range.
    #[inline]
    pub fn literal(&self, range: &Range<usize>) -> &str {
        &self.literals[range.clone()]
    }

    pub fn uses_field(&self, field: Field) -> bool {
        self.segments.iter().any(|segment| segment.field() == Some(field))
    }
}

impl Default for CompiledPattern {
    fn default() -> Self {
        Self::compile(DEFAULT_PATTERN).unwrap_or_else(|_| Self::message_only())
    }
}
