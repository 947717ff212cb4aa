use thiserror::Error;

/// Failure taxonomy shared by every stage of the question-answering pipeline.
///
/// Chunking and indexing failures reject the upload. Retrieval failures are
/// soft and never leave the retriever. Backend failures are isolated per
/// backend; only `AllBackendsFailed` ends a question.
#[derive(Debug, Error)]
pub enum Error {
    #[error("document is empty or unreadable")]
    EmptyDocument,

    #[error("no extractable text on any page")]
    NoExtractableText,

    #[error("no valid chunks remain after filtering")]
    NoValidChunks,

    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("index build failed: {0}")]
    IndexBuildFailure(String),

    #[error("retrieval failed: {0}")]
    RetrievalFailure(String),

    /// Each entry is an [`Error::Backend`], in invocation order.
    #[error("all backends failed ({})", summarize(.failures))]
    AllBackendsFailed { failures: Vec<Error> },

    #[error("question is empty")]
    EmptyQuestion,

    #[error("backend {label} failed: {detail}")]
    Backend { label: String, detail: String },

    #[error("no backends selected")]
    NoBackendsSelected,

    #[error("no document loaded")]
    NoDocument,

    #[error("unsupported mark allocation: {0} (expected 7 or 14)")]
    UnsupportedMarks(u8),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn backend(label: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Backend { label: label.into(), detail: detail.to_string() }
    }

    /// True for the errors that reject an uploaded document.
    pub fn rejects_document(&self) -> bool {
        matches!(
            self,
            Self::EmptyDocument
                | Self::NoExtractableText
                | Self::NoValidChunks
                | Self::EmbeddingFailure(_)
                | Self::IndexBuildFailure(_)
        )
    }
}

fn summarize(failures: &[Error]) -> String {
    if failures.is_empty() {
        return "no backend produced a response".to_string();
    }
    failures
        .iter()
        .map(|e| match e {
            Error::Backend { label, detail } => format!("{label}: {detail}"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
