//! Catalog merging and snapshot validation.
//!
//! The base catalog is produced by an external registry fetcher; the
//! override table is hand-maintained FinOps and descriptive data keyed by
//! record id. [`merge`] applies the overrides field by field without
//! reordering, adding, or dropping records.

use std::collections::HashSet;

use crate::models::{CatalogRecord, OverrideTable};
use crate::{Error, Result};

/// What a merge did, for reporting by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Records in the base catalog (and therefore in the output).
    pub records: usize,
    /// Base records that had an override applied.
    pub overridden: usize,
    /// Override ids with no matching base record, sorted.
    pub ignored_ids: Vec<String>,
}

/// Merge `overrides` into `base`, preserving base order.
///
/// `None` behaves exactly like an empty table. Override ids that do not
/// exist in `base` are ignored.
pub fn merge(base: Vec<CatalogRecord>, overrides: Option<&OverrideTable>) -> Vec<CatalogRecord> {
    merge_with_report(base, overrides).0
}

/// Like [`merge`], also returning a [`MergeReport`].
pub fn merge_with_report(
    base: Vec<CatalogRecord>,
    overrides: Option<&OverrideTable>,
) -> (Vec<CatalogRecord>, MergeReport) {
    let mut report = MergeReport {
        records: base.len(),
        ..MergeReport::default()
    };

    let Some(overrides) = overrides.filter(|o| !o.is_empty()) else {
        return (base, report);
    };

    let merged: Vec<CatalogRecord> = base
        .into_iter()
        .map(|mut record| {
            if let Some(patch) = overrides.get(&record.id) {
                record.apply(patch);
                report.overridden += 1;
            }
            record
        })
        .collect();

    {
        let known: HashSet<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        report.ignored_ids = overrides
            .keys()
            .filter(|id| !known.contains(id.as_str()))
            .cloned()
            .collect();
        report.ignored_ids.sort();
    }

    (merged, report)
}

/// Check the snapshot invariants: every id non-empty and unique.
pub fn validate(records: &[CatalogRecord]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        if record.id.trim().is_empty() {
            return Err(Error::Build(format!(
                "record at position {} has an empty id",
                position
            )));
        }
        if !seen.insert(record.id.as_str()) {
            return Err(Error::Build(format!("duplicate record id: {}", record.id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordPatch;
    use serde_json::json;

    fn record(id: &str, cost: f64) -> CatalogRecord {
        let mut r = CatalogRecord::new(id);
        r.description = Some(format!("{} description", id));
        r.cost_per_1k_inferences_usd = Some(cost);
        r
    }

    fn patch(value: serde_json::Value) -> RecordPatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_merge_without_overrides_is_identity() {
        let base = vec![record("a", 0.5), record("b", 1.0)];
        assert_eq!(merge(base.clone(), None), base);
        assert_eq!(merge(base.clone(), Some(&OverrideTable::new())), base);
    }

    #[test]
    fn test_merge_empty_base() {
        let mut overrides = OverrideTable::new();
        overrides.insert("a".to_string(), patch(json!({"roi_score": 1})));
        let (merged, report) = merge_with_report(Vec::new(), Some(&overrides));
        assert!(merged.is_empty());
        assert_eq!(report.ignored_ids, vec!["a"]);
    }

    #[test]
    fn test_merge_overwrites_only_present_fields() {
        let base = vec![record("a", 0.5), record("b", 1.0)];
        let mut overrides = OverrideTable::new();
        overrides.insert(
            "a".to_string(),
            patch(json!({"cost_per_1k_inferences_usd": 0.2, "latency_ms": 40})),
        );

        let merged = merge(base.clone(), Some(&overrides));

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].cost_per_1k_inferences_usd, Some(0.2));
        assert_eq!(merged[0].latency_ms, Some(40.0));
        assert_eq!(merged[0].description, base[0].description);
        assert_eq!(merged[1], base[1]);
    }

    #[test]
    fn test_merge_ignores_unknown_ids_and_keeps_order() {
        let base = vec![record("c", 1.0), record("a", 2.0), record("b", 3.0)];
        let mut overrides = OverrideTable::new();
        overrides.insert("zzz".to_string(), patch(json!({"roi_score": 9})));
        overrides.insert("b".to_string(), patch(json!({"roi_score": 3})));

        let (merged, report) = merge_with_report(base, Some(&overrides));

        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(merged[2].roi_score, Some(3.0));
        assert_eq!(report.records, 3);
        assert_eq!(report.overridden, 1);
        assert_eq!(report.ignored_ids, vec!["zzz"]);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_ids() {
        assert!(validate(&[record("a", 1.0), record("b", 1.0)]).is_ok());

        let err = validate(&[record("a", 1.0), record("a", 2.0)]).unwrap_err();
        assert!(matches!(err, Error::Build(msg) if msg.contains("duplicate")));

        let err = validate(&[record(" ", 1.0)]).unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }
}
