mod filter;
mod ids;
mod progress;
mod question;
mod subject;

pub use filter::{
    ALL_CATEGORIES, CategoryFilter, CategoryFilterError, EmptyState, StatusFilter,
    StatusFilterError,
};
pub use ids::{ParseIdError, QuestionId, SubjectId, SubjectIdError};
pub use progress::{Progress, ProgressChange, QuestionStatus, StatusCounts, StatusKind};
pub use question::{BLANK_MARKER, CardFace, HIDDEN_BLANK, Question};
pub use subject::{Subject, SubjectError, SubjectRecord, list_categories};
