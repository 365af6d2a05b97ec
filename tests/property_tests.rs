//! Property-based tests for pattern_sink_logger using proptest

use pattern_sink_logger::prelude::*;
use pattern_sink_logger::text::{count_codepoints, CachedString, CodeUnit, GrowableBuffer};
use proptest::prelude::*;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop::sample::select(LogLevel::ALL.to_vec())
}

fn render(template: &str, record: &Record<'_>) -> String {
    let pattern = CompiledPattern::compile(template).unwrap();
    let mut buf: GrowableBuffer<u8, 32> = GrowableBuffer::new();
    pattern.format(&mut buf, record);
    String::from_utf8(buf.as_slice().to_vec()).unwrap()
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Test that LogLevel ordering matches discriminants
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, (a as u8) <= (b as u8));
        prop_assert_eq!(a.cmp(&b), a.index().cmp(&b.index()));
    }
}

// ============================================================================
// Codepoint Tests
// ============================================================================

proptest! {
    #[test]
    fn test_codepoints_match_chars(text in any::<String>()) {
        let expected = text.chars().count();
        prop_assert_eq!(count_codepoints(&text), expected);

        let wide: Vec<u16> = text.encode_utf16().collect();
        prop_assert_eq!(u16::count_codepoints(&wide), expected);
        prop_assert_eq!(CachedString::new(text.as_str()).codepoints(), expected);
    }

    #[test]
    fn test_buffer_append_matches_concatenation(chunks in prop::collection::vec(any::<String>(), 0..12)) {
        let mut buf: GrowableBuffer<u8, 16> = GrowableBuffer::new();
        let mut expected = String::new();
        for chunk in &chunks {
            buf.append_str(chunk);
            expected.push_str(chunk);
        }
        prop_assert_eq!(buf.as_slice(), expected.as_bytes());
        prop_assert!(buf.capacity() >= buf.len());
        prop_assert_eq!(buf.codepoints(), expected.chars().count());
    }
}

// ============================================================================
// Pattern Tests
// ============================================================================

proptest! {
    /// Templates without braces render verbatim
    #[test]
    fn test_literal_templates_round_trip(template in "[^{}]+", message in ".*") {
        let record = Record::new(LogLevel::Info, &message);
        prop_assert_eq!(render(&template, &record), template);
    }

    /// Doubling every brace turns any text into a template that renders it
    #[test]
    fn test_escaped_braces_round_trip(text in ".+") {
        let template = text.replace('{', "{{").replace('}', "}}");
        let record = Record::new(LogLevel::Info, "unused");
        prop_assert_eq!(render(&template, &record), text);
    }

    /// Padded output is exactly `max(width, len)` codepoints, split by alignment
    #[test]
    fn test_padding_width(
        category in "\\PC{0,12}",
        width in 0usize..40,
        align in prop::sample::select(vec!['<', '>', '^']),
        fill in prop::sample::select(vec!['*', '-', '.', ' ', 'é', '😀', '0']),
    ) {
        let record = Record::new(LogLevel::Info, "m").with_category(category.as_str());
        let out = render(&format!("{{category:{}{}{}}}", fill, align, width), &record);

        let len = category.chars().count();
        let padding = width.saturating_sub(len);
        prop_assert_eq!(out.chars().count(), len + padding);

        let left = match align {
            '>' => padding,
            '^' => padding / 2,
            _ => 0,
        };
        let prefix: String = std::iter::repeat_n(fill, left).collect();
        let suffix: String = std::iter::repeat_n(fill, padding - left).collect();
        prop_assert_eq!(out, format!("{}{}{}", prefix, category, suffix));
    }

    /// Every level renders through the same pattern with its display name
    #[test]
    fn test_level_placeholder(level in any_level(), message in "[a-z ]{0,20}") {
        let record = Record::new(level, &message);
        prop_assert_eq!(
            render("{level}:{message}", &record),
            format!("{}:{}", level.to_str(), message)
        );
    }
}
