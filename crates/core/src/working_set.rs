use crate::model::{CategoryFilter, Progress, Question, StatusFilter};

/// Filters `order` down to the questions eligible for display.
///
/// The category filter is applied first, then the status filter. The result
/// keeps the relative order of `order`; an empty result is a normal state.
#[must_use]
pub fn derive_working_set<'a, I>(
    order: I,
    category: &CategoryFilter,
    status: StatusFilter,
    progress: &Progress,
) -> Vec<&'a Question>
where
    I: IntoIterator<Item = &'a Question>,
{
    order
        .into_iter()
        .filter(|q| category.matches(q))
        .filter(|q| match status {
            StatusFilter::All => true,
            StatusFilter::Unseen => progress.is_unseen(q.id()),
            StatusFilter::Failed => progress.failed().contains(&q.id()),
            StatusFilter::Learned => progress.mastered().contains(&q.id()),
        })
        .collect()
}
