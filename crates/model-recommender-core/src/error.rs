//! Error taxonomy shared by the build and query pipelines.
//!
//! None of these are retried internally; they are surfaced to whoever
//! called `build` or `search`. A blank query is not an error, it yields an
//! empty result set.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Required artifacts or settings are missing or unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The catalog cannot be turned into an index (empty catalog, empty
    /// corpus text, duplicate ids, inconsistent embeddings).
    #[error("build error: {0}")]
    Build(String),

    /// Persisted artifacts exist but are corrupt or disagree with each other.
    #[error("load error: {0}")]
    Load(String),

    /// The index produced a position with no metadata behind it.
    #[error("alignment error: index returned position {position} but metadata holds {len} records")]
    Alignment { position: i64, len: usize },

    /// The embedding capability failed or returned malformed output.
    #[error("embedding error: {0:#}")]
    Embedding(anyhow::Error),
}

impl Error {
    pub(crate) fn embedding(msg: impl Into<String>) -> Self {
        Error::Embedding(anyhow::anyhow!(msg.into()))
    }
}
