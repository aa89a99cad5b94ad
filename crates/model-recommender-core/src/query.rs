//! Query composition.
//!
//! User input is rendered into the same `" | "`-delimited shape as corpus
//! entries so query and document texts embed into comparable vectors.

use crate::corpus::{join_non_empty, DELIMITER};
use crate::models::RecommendQuery;

const LABELS: [&str; 4] = ["Use case:", "Data type:", "Task type:", "Constraints:"];

/// Render a structured query into retrieval text.
///
/// The use case is always present as `"Use case: …"`, even when blank;
/// retrieval treats an all-blank composed query as no query at all. Facets
/// that are `None` or blank are omitted.
pub fn compose(
    use_case: &str,
    data_type: Option<&str>,
    task_type: Option<&str>,
    constraints: Option<&str>,
) -> String {
    let facets = [
        ("Data type", data_type),
        ("Task type", task_type),
        ("Constraints", constraints),
    ];

    let head = format!("Use case: {}", use_case.trim());
    let tail = facets.into_iter().filter_map(|(label, value)| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}: {}", label, v))
    });

    join_non_empty(std::iter::once(head).chain(tail))
}

/// Whether `text` carries no user content.
///
/// Plain whitespace is blank, and so is composed text whose segments are
/// only labels: `"Use case: "` asks for nothing.
pub fn is_blank_text(text: &str) -> bool {
    text.split(DELIMITER).all(|segment| {
        let segment = segment.trim();
        let value = LABELS
            .iter()
            .find_map(|label| segment.strip_prefix(label))
            .unwrap_or(segment);
        value.trim().is_empty()
    })
}

impl RecommendQuery {
    pub fn compose(&self) -> String {
        compose(
            &self.use_case,
            self.data_type.as_deref(),
            self.task_type.as_deref(),
            self.constraints.as_deref(),
        )
    }

    /// True when the use case has no content. Facets only refine a use
    /// case; on their own they are not a query.
    pub fn is_blank(&self) -> bool {
        self.use_case.trim().is_empty()
    }
}
