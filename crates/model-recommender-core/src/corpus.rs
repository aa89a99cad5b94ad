//! Corpus text rendering.
//!
//! The rendered text is the only signal used for semantic matching. Numeric
//! FinOps fields never appear in it, so they cannot move a record's rank.

use crate::models::CatalogRecord;

/// Separator between rendered fields, shared with [`crate::query::compose`].
pub const DELIMITER: &str = " | ";

/// Render a record into its embedding input.
///
/// Field order is fixed: id, family, task, input_type, domain, description,
/// best_for, limitations, infra_requirements, typical_users. List fields are
/// space-joined. Fields that are missing or blank are left out entirely.
pub fn render(record: &CatalogRecord) -> String {
    let fields = [
        Some(record.id.trim().to_string()),
        scalar(&record.family),
        scalar(&record.task),
        joined(&record.input_type),
        joined(&record.domain),
        scalar(&record.description),
        joined(&record.best_for),
        joined(&record.limitations),
        scalar(&record.infra_requirements),
        scalar(&record.typical_users),
    ];

    join_non_empty(fields.into_iter().flatten())
}

/// Join the non-empty parts with [`DELIMITER`].
pub(crate) fn join_non_empty<I>(parts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

fn scalar(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn joined(values: &[String]) -> Option<String> {
    let text = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
