//! Core data models for the recommendation pipeline.
//!
//! [`CatalogRecord`] is one recommendable model. Records are created by the
//! merge step and never mutated afterwards. [`RecordPatch`] is the sparse
//! shape used by override tables, and [`QueryResult`] is what retrieval
//! hands back to the presentation layer.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Sparse override data keyed by record id.
pub type OverrideTable = HashMap<String, RecordPatch>;

/// One recommendable item in the catalog.
///
/// Numeric FinOps fields are `Option<f64>`: a missing or `null` value is
/// `None` and stays distinct from a real `0.0`. Keys the model does not know
/// about (registry download counts, tags, library names, ...) are carried in
/// [`extra`](Self::extra) so that writing a record back out loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub input_type: Vec<String>,
    #[serde(
        default,
        deserialize_with = "string_or_seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub domain: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub best_for: Vec<String>,
    #[serde(
        default,
        deserialize_with = "string_or_seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub limitations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_users: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_1k_inferences_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi_score: Option<f64>,
    /// Fields outside the known schema, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CatalogRecord {
    /// A record with only an id set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family: None,
            task: None,
            input_type: Vec::new(),
            domain: Vec::new(),
            description: None,
            best_for: Vec::new(),
            limitations: Vec::new(),
            infra_requirements: None,
            typical_users: None,
            link: None,
            cost_per_1k_inferences_usd: None,
            latency_ms: None,
            memory_mb: None,
            accuracy_score: None,
            roi_score: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Overwrite every field present in `patch`, keeping the rest.
    ///
    /// The id is never changed by a patch.
    pub fn apply(&mut self, patch: &RecordPatch) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut self.family, &patch.family);
        set(&mut self.task, &patch.task);
        set(&mut self.input_type, &patch.input_type);
        set(&mut self.domain, &patch.domain);
        set(&mut self.description, &patch.description);
        set(&mut self.best_for, &patch.best_for);
        set(&mut self.limitations, &patch.limitations);
        set(&mut self.infra_requirements, &patch.infra_requirements);
        set(&mut self.typical_users, &patch.typical_users);
        set(&mut self.link, &patch.link);
        set(
            &mut self.cost_per_1k_inferences_usd,
            &patch.cost_per_1k_inferences_usd,
        );
        set(&mut self.latency_ms, &patch.latency_ms);
        set(&mut self.memory_mb, &patch.memory_mb);
        set(&mut self.accuracy_score, &patch.accuracy_score);
        set(&mut self.roi_score, &patch.roi_score);

        for (key, value) in &patch.extra {
            if key != "id" {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

/// A partial [`CatalogRecord`] used as an override.
///
/// Every field is "replace if present". For optional scalar fields the outer
/// `Option` says whether the key was present; an explicit JSON `null` is
/// `Some(None)` and clears the base value. A `null` list clears the list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordPatch {
    #[serde(default, deserialize_with = "present")]
    pub family: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub task: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_seq")]
    pub input_type: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present_seq")]
    pub domain: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_seq")]
    pub best_for: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present_seq")]
    pub limitations: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub infra_requirements: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub typical_users: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub cost_per_1k_inferences_usd: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub latency_ms: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub memory_mb: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub accuracy_score: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub roi_score: Option<Option<f64>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Cosine similarity between the query and the record, higher is better.
    pub score: f32,
    pub record: CatalogRecord,
}

/// Structured user input, rendered by [`crate::query::compose`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendQuery {
    pub use_case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrSeq {
    Seq(Vec<String>),
    One(String),
}

impl From<StringOrSeq> for Vec<String> {
    fn from(value: StringOrSeq) -> Self {
        match value {
            StringOrSeq::Seq(items) => items,
            StringOrSeq::One(item) => vec![item],
        }
    }
}

/// Accept a list, a bare string, or `null` for a list field.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrSeq>::deserialize(deserializer)?
        .map(Vec::from)
        .unwrap_or_default())
}

/// Mark a key as present, keeping `null` as `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn present_seq<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_seq(deserializer).map(Some)
}
