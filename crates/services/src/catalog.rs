use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use kioku_core::model::{Subject, SubjectId, SubjectRecord};
use tracing::debug;

use crate::error::CatalogError;

/// Read-only set of subjects available for study.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    subjects: Vec<Arc<Subject>>,
}

impl Catalog {
    /// Builds a catalog from already-validated subjects, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateSubject` if two subjects share an id.
    pub fn from_subjects(subjects: Vec<Subject>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(subjects.len());
        for subject in &subjects {
            if !seen.insert(subject.id().clone()) {
                return Err(CatalogError::DuplicateSubject(subject.id().clone()));
            }
        }
        Ok(Self {
            subjects: subjects.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parses one subject from the dataset JSON format.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Decode` for malformed JSON and
    /// `CatalogError::Subject` if the subject fails validation.
    pub fn parse_subject(json: &str, origin: &str) -> Result<Subject, CatalogError> {
        let record: SubjectRecord =
            serde_json::from_str(json).map_err(|source| CatalogError::Decode {
                origin: origin.to_owned(),
                source,
            })?;
        let subject = record.id.clone();
        Subject::try_from(record).map_err(|source| CatalogError::Subject { subject, source })
    }

    /// Builds a catalog from JSON documents, one subject each.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if any document is invalid.
    pub fn from_json_strs<'a>(
        documents: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, CatalogError> {
        let subjects = documents
            .into_iter()
            .enumerate()
            .map(|(idx, json)| Self::parse_subject(json, &format!("document #{idx}")))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_subjects(subjects)
    }

    /// Loads every `*.json` file in `dir`, ordered by file name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the directory or a file cannot be read,
    /// or another `CatalogError` if a dataset is invalid.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let io_err = |source: std::io::Error| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut subjects = Vec::with_capacity(paths.len());
        for path in paths {
            let json = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            let subject = Self::parse_subject(&json, &path.display().to_string())?;
            debug!(
                subject = %subject.id(),
                questions = subject.questions().len(),
                "loaded dataset"
            );
            subjects.push(subject);
        }
        Self::from_subjects(subjects)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter().map(|subject| subject.as_ref())
    }

    #[must_use]
    pub fn get(&self, id: &SubjectId) -> Option<Arc<Subject>> {
        self.subjects.iter().find(|s| s.id() == id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &SubjectId) -> bool {
        self.subjects.iter().any(|s| s.id() == id)
    }

    /// Question count shown next to each subject in the picker.
    #[must_use]
    pub fn total_questions(&self, id: &SubjectId) -> Option<usize> {
        self.get(id).map(|s| s.questions().len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kioku_core::model::{QuestionId, SubjectError};

    const HISTORY: &str = r#"{
        "id": "history",
        "name": "History",
        "categoryOrder": ["Nara", "Heian"],
        "questions": [
            {"id": 1, "category": "Heian", "question": "Q1", "answer": "A1"},
            {"id": 2, "category": "Nara", "question": "Q2", "answer": "A2"}
        ]
    }"#;

    const ETHICS: &str = r#"{
        "id": "ethics",
        "name": "Ethics",
        "categoryOrder": [],
        "questions": [
            {"id": 1, "category": "Greek", "question": "Q", "answer": "A"}
        ]
    }"#;

    fn subject_id(id: &str) -> SubjectId {
        SubjectId::new(id).unwrap()
    }

    #[test]
    fn parses_documents_in_order() {
        let catalog = Catalog::from_json_strs([HISTORY, ETHICS]).unwrap();
        let ids: Vec<_> = catalog.subjects().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, vec!["history", "ethics"]);
        assert_eq!(catalog.total_questions(&subject_id("history")), Some(2));
        assert!(catalog.get(&subject_id("ethics")).is_some());
        assert!(!catalog.contains(&subject_id("math")));
    }

    #[test]
    fn question_ids_may_repeat_across_subjects() {
        let catalog = Catalog::from_json_strs([HISTORY, ETHICS]).unwrap();
        let ethics = catalog.get(&subject_id("ethics")).unwrap();
        assert!(ethics.contains(QuestionId::new(1)));
    }

    #[test]
    fn rejects_duplicate_subjects() {
        let err = Catalog::from_json_strs([HISTORY, HISTORY]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSubject(id) if id.as_str() == "history"));
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let json = r#"{"id": "x", "name": "X", "questions": [
            {"id": 3, "category": "c", "question": "q", "answer": "a"},
            {"id": 3, "category": "c", "question": "q", "answer": "a"}
        ]}"#;
        let err = Catalog::parse_subject(json, "inline").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Subject {
                source: SubjectError::DuplicateQuestionId(_),
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = Catalog::parse_subject("{", "inline").unwrap_err();
        assert!(matches!(err, CatalogError::Decode { origin, .. } if origin == "inline"));
    }

    #[test]
    fn load_dir_reads_json_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_history.json"), HISTORY).unwrap();
        std::fs::write(dir.path().join("a_ethics.json"), ETHICS).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = Catalog::load_dir(dir.path()).unwrap();
        let ids: Vec<_> = catalog.subjects().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, vec!["ethics", "history"]);
    }

    #[test]
    fn load_dir_missing_directory_is_io_error() {
        let err = Catalog::load_dir("/definitely/not/here").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
