use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a question, unique within its subject.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(u64);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Identifier of a subject (e.g. `history`).
///
/// Subject ids are embedded in storage keys, so only ASCII alphanumerics,
/// `-` and `_` are accepted.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectIdError {
    #[error("subject id cannot be empty")]
    Empty,
    #[error("subject id contains invalid character {0:?}")]
    InvalidChar(char),
}

impl SubjectId {
    /// Creates a new `SubjectId` after validating its characters.
    ///
    /// # Errors
    ///
    /// Returns `SubjectIdError` if the id is empty or contains characters
    /// that cannot appear in a storage key.
    pub fn new(id: impl Into<String>) -> Result<Self, SubjectIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SubjectIdError::Empty);
        }
        if let Some(ch) = id
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
        {
            return Err(SubjectIdError::InvalidChar(ch));
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = SubjectIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for String {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(QuestionId::new)
            .map_err(|_| ParseIdError {
                kind: "QuestionId".to_string(),
            })
    }
}

impl FromStr for SubjectId {
    type Err = SubjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_id_display() {
        let id = QuestionId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_question_id_from_str() {
        let id: QuestionId = "123".parse().unwrap();
        assert_eq!(id, QuestionId::new(123));
    }

    #[test]
    fn test_question_id_from_str_invalid() {
        let result = "not-a-number".parse::<QuestionId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_question_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&vec![QuestionId::new(2), QuestionId::new(5)]).unwrap();
        assert_eq!(json, "[2,5]");
    }

    #[test]
    fn test_subject_id_accepts_key_safe_names() {
        let id: SubjectId = "history".parse().unwrap();
        assert_eq!(id.as_str(), "history");
        assert!(SubjectId::new("world_history-2").is_ok());
    }

    #[test]
    fn test_subject_id_rejects_empty_and_separators() {
        assert_eq!(SubjectId::new(""), Err(SubjectIdError::Empty));
        assert_eq!(
            SubjectId::new("his tory"),
            Err(SubjectIdError::InvalidChar(' '))
        );
        assert_eq!(
            SubjectId::new("a/b"),
            Err(SubjectIdError::InvalidChar('/'))
        );
    }

    #[test]
    fn test_subject_id_deserialize_validates() {
        let ok: SubjectId = serde_json::from_str("\"ethics\"").unwrap();
        assert_eq!(ok.to_string(), "ethics");
        assert!(serde_json::from_str::<SubjectId>("\"\"").is_err());
    }
}
