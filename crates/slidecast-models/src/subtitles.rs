//! SRT subtitle generation.
//!
//! One cue per slide, spanning that slide's window on the timeline.

use std::fmt::Write;

use crate::slide::Slide;

/// Build an SRT document for `slides` in `order`.
///
/// Slides with empty text still advance the clock but emit no cue.
pub fn build_srt(slides: &[Slide]) -> String {
    let mut ordered: Vec<&Slide> = slides.iter().collect();
    ordered.sort_by_key(|s| s.order);

    let mut out = String::new();
    let mut cue = 1;
    let mut start_ms: u64 = 0;

    for slide in ordered {
        let end_ms = start_ms + u64::from(slide.duration_seconds) * 1000;
        let text = cue_text(&slide.text);
        if !text.is_empty() {
            let _ = writeln!(out, "{cue}");
            let _ = writeln!(out, "{} --> {}", timestamp(start_ms), timestamp(end_ms));
            let _ = writeln!(out, "{text}");
            out.push('\n');
            cue += 1;
        }
        start_ms = end_ms;
    }

    out
}

/// Slide text with blank lines dropped, since a blank line ends an SRT cue.
fn cue_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `HH:MM:SS,mmm`
fn timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
