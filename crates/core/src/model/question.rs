use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// Marker that turns a question into a fill-in-the-blank prompt.
pub const BLANK_MARKER: &str = "（　？　）";

/// Placeholder rendered in place of a hidden blank.
pub const HIDDEN_BLANK: &str = "???";

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single question/answer pair from a subject's dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    category: String,
    question: String,
    answer: String,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        category: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Returns true if the question text contains the blank marker.
    #[must_use]
    pub fn is_fill_in_blank(&self) -> bool {
        self.question.contains(BLANK_MARKER)
    }

    /// Builds the face shown for this card.
    ///
    /// The answer is only exposed once `revealed` is true.
    #[must_use]
    pub fn face(&self, revealed: bool) -> CardFace<'_> {
        let answer = revealed.then_some(self.answer.as_str());
        if self.is_fill_in_blank() {
            CardFace::FillInBlank {
                parts: self.question.split(BLANK_MARKER).collect(),
                answer,
            }
        } else {
            CardFace::Separate {
                question: &self.question,
                answer,
            }
        }
    }
}

//
// ─── CARD FACE ─────────────────────────────────────────────────────────────────
//

/// What the learner sees for a card, before or after reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardFace<'a> {
    /// Question text split at each blank marker; the answer fills every gap.
    FillInBlank {
        parts: Vec<&'a str>,
        answer: Option<&'a str>,
    },
    /// Question shown as-is with the answer in its own panel.
    Separate {
        question: &'a str,
        answer: Option<&'a str>,
    },
}

impl CardFace<'_> {
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        match self {
            CardFace::FillInBlank { answer, .. } | CardFace::Separate { answer, .. } => {
                answer.is_some()
            }
        }
    }

    /// Renders the face as plain text.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            CardFace::FillInBlank { parts, answer } => {
                let fill = answer.map_or_else(|| HIDDEN_BLANK.to_owned(), |a| format!("[{a}]"));
                parts.join(&fill)
            }
            CardFace::Separate { question, answer } => match answer {
                Some(answer) => format!("{question}\n  -> {answer}"),
                None => format!("{question}\n  -> (tap to reveal)"),
            },
        }
    }
}
