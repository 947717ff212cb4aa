//! studymate-vector
//!
//! Flat inner-product vector index, index construction with fast-mode
//! fallback, and the retriever (vector search or keyword overlap).

pub mod flat;
pub mod index_build;
pub mod search;

pub use flat::{normalize_l2, FlatIpIndex};
pub use index_build::{build_index, build_vector_index, Index};
pub use search::{leading, texts, KeywordBudget, Retriever};
