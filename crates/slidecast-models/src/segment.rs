//! Script segmentation.
//!
//! Splits a raw lecture script into slides. A slide boundary is a line made
//! of three or more `-` characters and nothing else (surrounding whitespace
//! is ignored):
//!
//! ```text
//! Intro text.
//!
//! ---
//!
//! Second slide.
//! ```
//!
//! Segmentation is not incremental: every call produces a fresh slide list
//! with new identifiers.

use thiserror::Error;

use crate::slide::{Slide, SlideTemplate};

/// Segments shorter than this many characters become `title-image` slides.
pub const SHORT_FORM_THRESHOLD: usize = 100;

/// Characters of script read per second of narration, for estimates.
pub const CHARS_PER_SECOND: usize = 10;

/// Shortest estimated slide duration.
pub const MIN_SLIDE_SECONDS: u32 = 3;

/// Minimum run of hyphens that forms a delimiter line.
const DELIMITER_MIN_LEN: usize = 3;

/// Result type for checked segmentation.
pub type SegmentResult<T> = Result<T, SegmentError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("Script produced no slides; add content between '---' delimiters")]
    SegmentationEmpty,
}

/// Split `script` into ordered slides.
///
/// Empty or whitespace-only segments are dropped and `order` is assigned
/// among the survivors, so it always runs 1..=N.
pub fn segment(script: &str) -> Vec<Slide> {
    split_sections(script)
        .into_iter()
        .map(|section| section.trim().to_string())
        .filter(|section| !section.is_empty())
        .enumerate()
        .map(|(index, text)| {
            let template = classify_template(&text);
            let duration = estimate_duration_seconds(&text);
            Slide::new(index as u32 + 1, text, template, duration)
        })
        .collect()
}

/// Like [`segment`], but rejects scripts that yield zero slides.
pub fn segment_checked(script: &str) -> SegmentResult<Vec<Slide>> {
    let slides = segment(script);
    if slides.is_empty() {
        return Err(SegmentError::SegmentationEmpty);
    }
    Ok(slides)
}

/// Placeholder duration derived from text length: `max(3, ceil(chars / 10))`.
///
/// Superseded by the narration duration once audio exists.
pub fn estimate_duration_seconds(text: &str) -> u32 {
    let chars = text.chars().count();
    let seconds = chars.div_ceil(CHARS_PER_SECOND) as u32;
    seconds.max(MIN_SLIDE_SECONDS)
}

/// Advisory template detection. Deterministic for identical input.
pub fn classify_template(text: &str) -> SlideTemplate {
    if looks_like_code(text) {
        SlideTemplate::Code
    } else if text.trim().chars().count() < SHORT_FORM_THRESHOLD {
        SlideTemplate::TitleImage
    } else {
        SlideTemplate::Text
    }
}

fn split_sections(script: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in script.lines() {
        if is_delimiter(line) {
            sections.push(std::mem::take(&mut current));
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    sections.push(current);

    sections
}

fn is_delimiter(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= DELIMITER_MIN_LEN && trimmed.chars().all(|c| c == '-')
}

fn looks_like_code(text: &str) -> bool {
    if text.contains("```") {
        return true;
    }

    const CALL_PATTERNS: [&str; 3] = ["print(", "console.log(", "printf("];
    if CALL_PATTERNS.iter().any(|p| text.contains(p)) {
        return true;
    }

    text.lines().any(|line| {
        let line = line.trim_start();
        has_function_keyword(line)
            || ((line.starts_with("def ") || line.starts_with("fn ")) && line.contains('('))
    })
}

fn has_function_keyword(line: &str) -> bool {
    line.match_indices("function").any(|(idx, _)| {
        let before_ok = line[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_');
        let after = line[idx + "function".len()..].chars().next();
        before_ok && matches!(after, Some(' ') | Some('(') | Some('*'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_example_script() {
        let script = "Intro text.\n\n---\n\nSecond slide with print(\"hi\").";
        let slides = segment(script);

        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].order, 1);
        assert_eq!(slides[0].text, "Intro text.");
        assert_eq!(slides[0].template, SlideTemplate::TitleImage);
        assert_eq!(slides[1].order, 2);
        assert_eq!(slides[1].template, SlideTemplate::Code);
    }

    #[test]
    fn test_n_sections_produce_contiguous_orders() {
        let script = "one\n---\ntwo\n-----\nthree\n   ---   \nfour";
        let slides = segment(script);

        let orders: Vec<u32> = slides.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_segments_close_gaps() {
        let script = "---\nfirst\n---\n   \n---\n---\nsecond\n---";
        let slides = segment(script);

        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].text, "first");
        assert_eq!(slides[1].text, "second");
        assert_eq!(slides[1].order, 2);
    }

    #[test]
    fn test_empty_and_delimiter_only_scripts() {
        assert!(segment("").is_empty());
        assert!(segment("   ---   ").is_empty());
        assert_eq!(segment_checked("   ---   "), Err(SegmentError::SegmentationEmpty));
        assert_eq!(segment_checked(""), Err(SegmentError::SegmentationEmpty));
    }

    #[test]
    fn test_inline_dashes_are_not_delimiters() {
        let slides = segment("a range 1---5 stays inline\n-- two dashes too");
        assert_eq!(slides.len(), 1);
    }

    #[test]
    fn test_duration_estimate() {
        assert_eq!(estimate_duration_seconds("short"), 3);
        assert_eq!(estimate_duration_seconds(&"a".repeat(100)), 10);
        assert_eq!(estimate_duration_seconds(&"a".repeat(101)), 11);
    }

    #[test]
    fn test_duration_counts_characters_not_bytes() {
        // 40 Hangul syllables are 120 bytes
        let text = "가".repeat(40);
        assert_eq!(estimate_duration_seconds(&text), 4);
    }

    #[test]
    fn test_long_prose_is_text_template() {
        let prose = "This paragraph explains the idea in plain words. ".repeat(4);
        assert_eq!(classify_template(&prose), SlideTemplate::Text);
    }

    #[test]
    fn test_code_detection() {
        assert_eq!(classify_template("```rust\nlet x = 1;\n```"), SlideTemplate::Code);
        assert_eq!(classify_template("function add(a, b) {}"), SlideTemplate::Code);
        assert_eq!(classify_template("def main():\n    pass"), SlideTemplate::Code);
        assert_eq!(classify_template("This is functional programming"), SlideTemplate::TitleImage);
    }

    #[test]
    fn test_segmentation_is_deterministic_apart_from_ids() {
        let script = "alpha\n---\nbeta print(1)";
        let a = segment(script);
        let b = segment(script);

        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.order, y.order);
            assert_eq!(x.text, y.text);
            assert_eq!(x.template, y.template);
            assert_eq!(x.duration_seconds, y.duration_seconds);
            assert_ne!(x.id, y.id);
        }
    }
}
