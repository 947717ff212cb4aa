//! studymate-answer
//!
//! Turns a question plus retrieved context into an answer: remote completion
//! backends composed concurrently, a local extractive backend, and the fixed
//! rubric templates that need no backend at all.

pub mod backend;
pub mod compose;
pub mod extractive;
pub mod gemini;
pub mod normalize;
pub mod openai;
pub mod registry;
pub mod rubric;

pub use backend::{Backend, Completion, CompletionRequest, PromptStyle, PromptedBackend};
pub use compose::compose;
pub use extractive::ExtractiveBackend;
pub use gemini::GeminiClient;
pub use normalize::{normalize_or_keep, QuickGrammar};
pub use openai::OpenAiClient;
pub use registry::{BackendSelection, BackendSet};
pub use rubric::{compose_detailed, compose_rubric, LocalComposer};
