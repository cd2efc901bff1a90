use kioku_core::model::{CardFace, Question, QuestionStatus};

/// One row of the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow<'a> {
    pub question: &'a Question,
    pub status: QuestionStatus,
}

/// Everything needed to draw the current card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView<'a> {
    pub question: &'a Question,
    pub face: CardFace<'a>,
    pub status: QuestionStatus,
    /// 1-based position within the working set.
    pub position: usize,
    pub total: usize,
}

impl CardView<'_> {
    /// `"3 / 12"` style counter.
    #[must_use]
    pub fn counter(&self) -> String {
        format!("{} / {}", self.position, self.total)
    }
}
