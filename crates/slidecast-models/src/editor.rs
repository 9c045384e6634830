//! In-place slide list editing.
//!
//! Every operation leaves `order` running 1..=N in list position.

use crate::slide::{Slide, SlideTemplate};

/// Characters per second used by the editor's duration estimate.
const EDITOR_CHARS_PER_SECOND: usize = 15;

/// Duration of a freshly inserted blank slide.
pub const BLANK_SLIDE_SECONDS: u32 = 3;

const MIN_EDITED_SECONDS: u32 = 3;

/// Replace a slide's text and re-estimate its duration.
///
/// Returns `false` if no slide has that id.
pub fn update_text(slides: &mut [Slide], id: &str, text: impl Into<String>) -> bool {
    let Some(slide) = slides.iter_mut().find(|s| s.id == id) else {
        return false;
    };

    let text = text.into();
    let chars = text.chars().count();
    slide.duration_seconds = (chars.div_ceil(EDITOR_CHARS_PER_SECOND) as u32).max(MIN_EDITED_SECONDS);
    slide.text = text;
    // Assets were generated from the old text
    slide.audio_url = None;
    slide.image_url = None;
    true
}

/// Remove a slide by id and close the gap.
pub fn remove(slides: &mut Vec<Slide>, id: &str) -> bool {
    let before = slides.len();
    slides.retain(|s| s.id != id);
    let removed = slides.len() != before;
    if removed {
        renumber(slides);
    }
    removed
}

/// Append an empty slide using the project's default template.
pub fn insert_blank(slides: &mut Vec<Slide>, template: SlideTemplate) -> &Slide {
    let order = slides.len() as u32 + 1;
    slides.push(Slide::new(order, String::new(), template, BLANK_SLIDE_SECONDS));
    &slides[slides.len() - 1]
}

/// Move the slide at 0-based position `from` to position `to`.
///
/// Out-of-range positions leave the list untouched and return `false`.
pub fn move_slide(slides: &mut Vec<Slide>, from: usize, to: usize) -> bool {
    if from >= slides.len() || to >= slides.len() {
        return false;
    }
    let slide = slides.remove(from);
    slides.insert(to, slide);
    renumber(slides);
    true
}

/// Reassign `order` from list position.
pub fn renumber(slides: &mut [Slide]) {
    for (index, slide) in slides.iter_mut().enumerate() {
        slide.order = index as u32 + 1;
    }
}

/// Sum of slide durations in seconds.
pub fn total_duration(slides: &[Slide]) -> u32 {
    slides.iter().map(|s| s.duration_seconds).sum()
}

/// True when `order` runs 1..=N in list position.
pub fn is_contiguous(slides: &[Slide]) -> bool {
    slides
        .iter()
        .enumerate()
        .all(|(index, slide)| slide.order == index as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;

    fn sample() -> Vec<Slide> {
        segment("one\n---\ntwo\n---\nthree")
    }

    #[test]
    fn test_update_text_reestimates_duration() {
        let mut slides = sample();
        let id = slides[1].id.clone();

        assert!(update_text(&mut slides, &id, "x".repeat(61)));
        assert_eq!(slides[1].duration_seconds, 5);

        assert!(update_text(&mut slides, &id, "short"));
        assert_eq!(slides[1].duration_seconds, 3);

        assert!(!update_text(&mut slides, "missing", "text"));
    }

    #[test]
    fn test_update_text_drops_stale_assets() {
        let mut slides = sample();
        slides[0].audio_url = Some("a.mp3".into());
        slides[0].image_url = Some("a.png".into());
        let id = slides[0].id.clone();

        update_text(&mut slides, &id, "changed");
        assert!(!slides[0].has_assets());
    }

    #[test]
    fn test_remove_renumbers() {
        let mut slides = sample();
        let id = slides[0].id.clone();

        assert!(remove(&mut slides, &id));
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].text, "two");
        assert!(is_contiguous(&slides));

        assert!(!remove(&mut slides, "missing"));
    }

    #[test]
    fn test_insert_blank_appends() {
        let mut slides = sample();
        let added = insert_blank(&mut slides, SlideTemplate::Code).clone();

        assert_eq!(added.order, 4);
        assert_eq!(added.template, SlideTemplate::Code);
        assert_eq!(added.duration_seconds, BLANK_SLIDE_SECONDS);
        assert!(added.text.is_empty());
        assert!(is_contiguous(&slides));
    }

    #[test]
    fn test_move_slide() {
        let mut slides = sample();

        assert!(move_slide(&mut slides, 2, 0));
        let texts: Vec<&str> = slides.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["three", "one", "two"]);
        assert!(is_contiguous(&slides));

        assert!(!move_slide(&mut slides, 0, 3));
    }

    #[test]
    fn test_total_duration() {
        let slides = sample();
        assert_eq!(total_duration(&slides), 9);
        assert_eq!(total_duration(&[]), 0);
    }
}
