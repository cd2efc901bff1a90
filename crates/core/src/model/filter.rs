use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::question::Question;

/// Label used for the "no category filter" choice.
pub const ALL_CATEGORIES: &str = "All";

//
// ─── CATEGORY FILTER ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryFilterError {
    #[error("category filter cannot be empty")]
    Empty,
}

impl CategoryFilter {
    /// Exact-match test against a question's category.
    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(name) => question.category() == name,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CategoryFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" => Err(CategoryFilterError::Empty),
            ALL_CATEGORIES => Ok(Self::All),
            name => Ok(Self::Category(name.to_owned())),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Category(name) => f.write_str(name),
        }
    }
}

//
// ─── STATUS FILTER ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Unseen,
    Failed,
    Learned,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatusFilterError {
    #[error("unknown status filter: {0}")]
    Unknown(String),
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Unseen,
        StatusFilter::Failed,
        StatusFilter::Learned,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Unseen => "unseen",
            StatusFilter::Failed => "failed",
            StatusFilter::Learned => "learned",
        }
    }

    /// Message shown when this filter leaves nothing to study.
    #[must_use]
    pub fn empty_state(self) -> EmptyState {
        match self {
            StatusFilter::Unseen => EmptyState::AllLearned,
            StatusFilter::Failed => EmptyState::AllReviewed,
            StatusFilter::Learned => EmptyState::NoneMastered,
            StatusFilter::All => EmptyState::NoneInCategory,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = StatusFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "unseen" => Ok(Self::Unseen),
            "failed" => Ok(Self::Failed),
            "learned" => Ok(Self::Learned),
            other => Err(StatusFilterError::Unknown(other.to_owned())),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── EMPTY STATE ───────────────────────────────────────────────────────────────
//

/// Why the working set is empty. Not an error, just a distinct screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    AllLearned,
    AllReviewed,
    NoneMastered,
    NoneInCategory,
}

impl EmptyState {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            EmptyState::AllLearned => "Complete!",
            EmptyState::AllReviewed => "Great!",
            EmptyState::NoneMastered | EmptyState::NoneInCategory => "No Questions",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            EmptyState::AllLearned => "Every question has been studied.",
            EmptyState::AllReviewed => "All review questions are cleared.",
            EmptyState::NoneMastered => "No questions have been mastered yet.",
            EmptyState::NoneInCategory => "There are no questions in this category.",
        }
    }
}
