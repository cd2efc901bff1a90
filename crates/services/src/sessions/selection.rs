use kioku_core::model::{CategoryFilter, StatusFilter};

/// Card-by-card study or the full list of the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Card,
    List,
}

/// Navigation direction through the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Per-subject selection state. Never persisted.
///
/// `order` holds indices into the subject's question list; only an explicit
/// shuffle changes it. `cursor` indexes the filtered working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub(super) category: CategoryFilter,
    pub(super) status: StatusFilter,
    pub(super) order: Vec<usize>,
    pub(super) cursor: usize,
    pub(super) view: ViewMode,
}

impl Selection {
    /// Default selection over `question_count` questions in dataset order.
    #[must_use]
    pub fn new(question_count: usize) -> Self {
        Self {
            category: CategoryFilter::All,
            status: StatusFilter::All,
            order: (0..question_count).collect(),
            cursor: 0,
            view: ViewMode::Card,
        }
    }

    #[must_use]
    pub fn category(&self) -> &CategoryFilter {
        &self.category
    }

    #[must_use]
    pub fn status(&self) -> StatusFilter {
        self.status
    }

    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Moves the cursor one step, wrapping at both ends of a set of `len`.
    pub(super) fn step(&mut self, direction: Direction, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = match direction {
            Direction::Next => (self.cursor + 1) % len,
            Direction::Prev => (self.cursor + len - 1) % len,
        };
    }

    /// Sends an out-of-range cursor back to the first card.
    pub(super) fn clamp_cursor(&mut self, len: usize) {
        if len > 0 && self.cursor >= len {
            self.cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let selection = Selection::new(3);
        assert_eq!(selection.category(), &CategoryFilter::All);
        assert_eq!(selection.status(), StatusFilter::All);
        assert_eq!(selection.order(), &[0, 1, 2]);
        assert_eq!(selection.cursor(), 0);
        assert_eq!(selection.view(), ViewMode::Card);
    }

    #[test]
    fn step_wraps_both_directions() {
        let mut selection = Selection::new(3);
        selection.step(Direction::Prev, 3);
        assert_eq!(selection.cursor(), 2);
        selection.step(Direction::Next, 3);
        assert_eq!(selection.cursor(), 0);
        selection.step(Direction::Next, 0);
        assert_eq!(selection.cursor(), 0);
    }

    #[test]
    fn clamp_resets_to_zero_not_nearest() {
        let mut selection = Selection::new(5);
        selection.cursor = 4;
        selection.clamp_cursor(2);
        assert_eq!(selection.cursor(), 0);

        selection.cursor = 4;
        selection.clamp_cursor(0);
        assert_eq!(selection.cursor(), 4);
    }
}
