//! Domain types shared by the chunker, index, retriever and answer composer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a chunk within its document's ordered chunk sequence.
pub type ChunkPosition = usize;

/// Summary of the document currently loaded into a session.
///
/// - `fingerprint`: blake3 hex digest of the uploaded bytes
/// - `pages`/`pages_with_text`: page counts reported by extraction
/// - `chunks`: number of chunks produced for retrieval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentInfo {
    pub name: String,
    pub fingerprint: String,
    pub pages: usize,
    pub pages_with_text: usize,
    pub chunks: usize,
}

/// Indicates which path selected a retrieved chunk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Keyword,
    /// Leading chunks supplied when nothing matched.
    Leading,
}

/// A chunk chosen by the retriever. `score` is cosine similarity for
/// vector hits and the keyword count for keyword hits; higher is better.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub position: ChunkPosition,
    pub score: f32,
    pub source: SourceKind,
}

/// Outcome of a single backend invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendResponse {
    pub model_label: String,
    pub text: String,
    pub success: bool,
    pub error: Option<String>,
}

impl BackendResponse {
    pub fn ok(model_label: impl Into<String>, text: impl Into<String>) -> Self {
        Self { model_label: model_label.into(), text: text.into(), success: true, error: None }
    }

    pub fn failed(model_label: impl Into<String>, error: impl Into<String>) -> Self {
        Self { model_label: model_label.into(), text: String::new(), success: false, error: Some(error.into()) }
    }
}

/// Mark allocation of a rubric answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Marks {
    Seven,
    Fourteen,
}

impl Marks {
    pub fn value(self) -> u8 {
        match self {
            Self::Seven => 7,
            Self::Fourteen => 14,
        }
    }
}

impl TryFrom<u8> for Marks {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            7 => Ok(Self::Seven),
            14 => Ok(Self::Fourteen),
            other => Err(crate::error::Error::UnsupportedMarks(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnswerKind {
    /// Exactly one backend succeeded; its text is used verbatim.
    Single,
    /// Several backends succeeded; labeled sections under one heading.
    Combined,
    Rubric(Marks),
    /// Local 14-mark style answer built without any backend.
    Detailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedAnswer {
    pub text: String,
    pub kind: AnswerKind,
    /// Labels of the backends or generators that contributed, in invocation order.
    pub contributors: Vec<String>,
    /// Every backend response, successful or not. Empty for local generators.
    pub responses: Vec<BackendResponse>,
}

/// One question/answer exchange in a session's append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub question: String,
    pub answer: String,
    pub contributors: Vec<String>,
    pub asked_at: DateTime<Utc>,
}
