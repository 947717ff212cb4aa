//! studymate-core
//!
//! Shared vocabulary for the document question-answering pipeline: error
//! taxonomy, configuration, domain types, collaborator traits and keyword
//! helpers.

pub mod config;
pub mod error;
pub mod keywords;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
