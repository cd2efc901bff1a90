use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuestionId, SubjectId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject name cannot be empty")]
    EmptyName,

    #[error("duplicate question id {0} in subject")]
    DuplicateQuestionId(QuestionId),
}

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// A subject's question bank plus the display order of its categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    id: SubjectId,
    name: String,
    category_order: Vec<String>,
    questions: Vec<Question>,
}

/// Raw dataset shape as stored on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub category_order: Vec<String>,
    pub questions: Vec<Question>,
}

impl Subject {
    /// Creates a validated subject.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::EmptyName` for a blank name and
    /// `SubjectError::DuplicateQuestionId` if two questions share an id.
    pub fn new(
        id: SubjectId,
        name: impl Into<String>,
        category_order: Vec<String>,
        questions: Vec<Question>,
    ) -> Result<Self, SubjectError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SubjectError::EmptyName);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(SubjectError::DuplicateQuestionId(question.id()));
            }
        }

        Ok(Self {
            id,
            name,
            category_order,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &SubjectId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn category_order(&self) -> &[String] {
        &self.category_order
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }

    /// Distinct categories of this subject in display order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        list_categories(&self.questions, &self.category_order)
    }
}

impl TryFrom<SubjectRecord> for Subject {
    type Error = SubjectError;

    fn try_from(record: SubjectRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.id,
            record.name,
            record.category_order,
            record.questions,
        )
    }
}

/// Returns the distinct categories present in `questions`, sorted by their
/// position in `category_order`.
///
/// Categories missing from `category_order` come after all ordered ones and
/// keep the order in which they were first seen.
#[must_use]
pub fn list_categories<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    category_order: &[String],
) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut categories: Vec<&'a str> = questions
        .into_iter()
        .map(Question::category)
        .filter(|category| seen.insert(*category))
        .collect();

    // stable: unmatched categories compare equal and keep discovery order
    categories.sort_by_key(|category| {
        category_order
            .iter()
            .position(|ordered| ordered == category)
            .unwrap_or(usize::MAX)
    });
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: u64, category: &str) -> Question {
        Question::new(QuestionId::new(id), category, format!("Q{id}"), format!("A{id}"))
    }

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn categories_follow_display_order_then_discovery() {
        let questions = vec![q(1, "B"), q(2, "A"), q(3, "C")];
        assert_eq!(
            list_categories(&questions, &order(&["A", "B"])),
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn unordered_categories_keep_discovery_order() {
        let questions = vec![q(1, "Z"), q(2, "B"), q(3, "Y"), q(4, "Z"), q(5, "A")];
        assert_eq!(
            list_categories(&questions, &order(&["A", "B"])),
            vec!["A", "B", "Z", "Y"]
        );
    }

    #[test]
    fn ordered_categories_absent_from_questions_are_skipped() {
        let questions = vec![q(1, "B")];
        assert_eq!(list_categories(&questions, &order(&["A", "B"])), vec!["B"]);
    }

    #[test]
    fn subject_rejects_duplicate_question_ids() {
        let err = Subject::new(
            SubjectId::new("history").unwrap(),
            "History",
            Vec::new(),
            vec![q(1, "A"), q(1, "B")],
        )
        .unwrap_err();
        assert_eq!(err, SubjectError::DuplicateQuestionId(QuestionId::new(1)));
    }

    #[test]
    fn subject_rejects_blank_name() {
        let err = Subject::new(SubjectId::new("ethics").unwrap(), "  ", Vec::new(), Vec::new())
            .unwrap_err();
        assert_eq!(err, SubjectError::EmptyName);
    }

    #[test]
    fn record_deserializes_camel_case_and_ignores_presentation_fields() {
        let record: SubjectRecord = serde_json::from_str(
            r#"{
                "id": "history",
                "name": "History",
                "icon": "History",
                "color": "amber",
                "categoryOrder": ["Nara", "Heian"],
                "questions": [
                    {"id": 1, "category": "Heian", "question": "Q1", "answer": "A1"},
                    {"id": 2, "category": "Nara", "question": "Q2", "answer": "A2"}
                ]
            }"#,
        )
        .unwrap();
        let subject = Subject::try_from(record).unwrap();
        assert_eq!(subject.id().as_str(), "history");
        assert_eq!(subject.categories(), vec!["Nara", "Heian"]);
        assert!(subject.contains(QuestionId::new(2)));
        assert!(!subject.contains(QuestionId::new(3)));
    }
}
