//! studymate-text
//!
//! Document text extraction (PDF and plain text) and the sentence-aligned,
//! size-bounded chunker that feeds the index.

pub mod chunker;
pub mod extract;

pub use chunker::{ChunkedDocument, Chunker};
pub use extract::{detect_extractor, PdfExtractor, PlainTextExtractor};
