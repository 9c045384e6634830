//! Render progress mapping.
//!
//! Progress runs 0 (entered processing) → 5 (slides loaded) → 90 (all slides
//! narrated and rendered) → 95 (video assembled) → 100 (completed). Only the
//! completion write reaches 100.

use std::sync::Mutex;

pub const PROGRESS_LOADED: u8 = 5;
pub const PROGRESS_SLIDES_DONE: u8 = 90;
pub const PROGRESS_ASSEMBLED: u8 = 95;

/// Maps slide completions onto the slide band and never reports a
/// value lower than one already reported.
#[derive(Debug)]
pub struct ProgressTracker {
    total_slides: usize,
    state: Mutex<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    completed: usize,
    reported: u8,
}

impl ProgressTracker {
    pub fn new(total_slides: usize) -> Self {
        Self {
            total_slides,
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Record one finished slide. Returns the value to report, if it rose.
    pub fn slide_done(&self) -> Option<u8> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.completed = (state.completed + 1).min(self.total_slides);
        let value = slide_band(state.completed, self.total_slides);
        raise(&mut state, value)
    }

    /// Record a fixed milestone. Returns it if it rose.
    pub fn milestone(&self, value: u8) -> Option<u8> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        raise(&mut state, value.min(99))
    }

    pub fn reported(&self) -> u8 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).reported
    }
}

fn raise(state: &mut TrackerState, value: u8) -> Option<u8> {
    if value > state.reported {
        state.reported = value;
        Some(value)
    } else {
        None
    }
}

/// Progress after `done` of `total` slides.
fn slide_band(done: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_SLIDES_DONE;
    }
    let span = (PROGRESS_SLIDES_DONE - PROGRESS_LOADED) as usize;
    PROGRESS_LOADED + (span * done / total) as u8
}
