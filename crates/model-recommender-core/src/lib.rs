//! # Model Recommender Core
//!
//! Pure, I/O-free logic for Model Recommender: the catalog data model,
//! override merging, corpus text rendering, the exact inner-product
//! similarity index, corpus indexing, query composition and retrieval.
//!
//! This crate performs no filesystem, network, or runtime work of its own.
//! Embedding backends are supplied by the caller through the
//! [`indexer::Embedder`] trait; persistence of built artifacts lives in the
//! `model-recommender` app crate.
//!
//! ## Pipeline
//!
//! ```text
//! catalog + overrides ──▶ catalog::merge ──▶ corpus::render ──▶ indexer::build
//!                                                                    │
//!                                                             IndexedCorpus
//!                                                                    │
//! user query ──▶ query::compose ──────────────────────────▶ retrieval::search
//! ```

pub mod catalog;
pub mod corpus;
pub mod error;
pub mod index;
pub mod indexer;
pub mod models;
pub mod query;
pub mod retrieval;

pub use error::{Error, Result};
