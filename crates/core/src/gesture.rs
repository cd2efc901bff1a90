//! Swipe-to-mark gesture tracking.
//!
//! A horizontal drag past [`SWIPE_COMMIT_THRESHOLD`] commits: rightward marks
//! the card as known, leftward as failed. Anything shorter cancels.

use crate::model::StatusKind;

/// Drag distance that must be exceeded to commit a swipe.
pub const SWIPE_COMMIT_THRESHOLD: f64 = 60.0;

/// Visual offset is clamped to this magnitude while dragging.
pub const SWIPE_MAX_OFFSET: f64 = 100.0;

/// Touches starting this close to either screen edge are left to the platform.
pub const EDGE_GUTTER: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    /// The progress set this swipe commits to.
    #[must_use]
    pub fn status_kind(self) -> StatusKind {
        match self {
            SwipeDirection::Right => StatusKind::Mastered,
            SwipeDirection::Left => StatusKind::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    Commit(SwipeDirection),
    Cancel,
}

/// Tracks a single in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeTracker {
    start_x: f64,
    offset: f64,
}

impl SwipeTracker {
    /// Starts tracking a touch at `x`.
    ///
    /// Returns `None` when the touch begins inside the edge gutter.
    #[must_use]
    pub fn begin(x: f64, viewport_width: f64) -> Option<Self> {
        if x < EDGE_GUTTER || x > viewport_width - EDGE_GUTTER {
            return None;
        }
        Some(Self {
            start_x: x,
            offset: 0.0,
        })
    }

    /// Records the pointer moving to `x`; returns the clamped offset.
    pub fn drag_to(&mut self, x: f64) -> f64 {
        self.offset = (x - self.start_x).clamp(-SWIPE_MAX_OFFSET, SWIPE_MAX_OFFSET);
        self.offset
    }

    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Ends the drag.
    #[must_use]
    pub fn finish(self) -> SwipeOutcome {
        classify_swipe(self.offset)
    }
}

/// Maps a horizontal drag distance to a swipe outcome.
#[must_use]
pub fn classify_swipe(offset: f64) -> SwipeOutcome {
    if offset.abs() <= SWIPE_COMMIT_THRESHOLD || offset.is_nan() {
        SwipeOutcome::Cancel
    } else if offset > 0.0 {
        SwipeOutcome::Commit(SwipeDirection::Right)
    } else {
        SwipeOutcome::Commit(SwipeDirection::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_drag_cancels() {
        assert_eq!(classify_swipe(60.0), SwipeOutcome::Cancel);
        assert_eq!(classify_swipe(-59.9), SwipeOutcome::Cancel);
        assert_eq!(classify_swipe(0.0), SwipeOutcome::Cancel);
    }

    #[test]
    fn long_drag_commits_by_direction() {
        assert_eq!(
            classify_swipe(60.5),
            SwipeOutcome::Commit(SwipeDirection::Right)
        );
        assert_eq!(
            classify_swipe(-80.0),
            SwipeOutcome::Commit(SwipeDirection::Left)
        );
    }

    #[test]
    fn direction_maps_to_status_kind() {
        assert_eq!(SwipeDirection::Right.status_kind(), StatusKind::Mastered);
        assert_eq!(SwipeDirection::Left.status_kind(), StatusKind::Failed);
    }

    #[test]
    fn tracker_ignores_edge_touches() {
        assert!(SwipeTracker::begin(10.0, 400.0).is_none());
        assert!(SwipeTracker::begin(360.0, 400.0).is_none());
        assert!(SwipeTracker::begin(200.0, 400.0).is_some());
    }

    #[test]
    fn tracker_clamps_offset_and_commits() {
        let mut tracker = SwipeTracker::begin(200.0, 400.0).unwrap();
        assert_eq!(tracker.drag_to(450.0), SWIPE_MAX_OFFSET);
        assert_eq!(tracker.drag_to(120.0), -80.0);
        assert_eq!(
            tracker.finish(),
            SwipeOutcome::Commit(SwipeDirection::Left)
        );
    }

    #[test]
    fn tracker_without_movement_cancels() {
        let tracker = SwipeTracker::begin(200.0, 400.0).unwrap();
        assert_eq!(tracker.finish(), SwipeOutcome::Cancel);
    }
}
