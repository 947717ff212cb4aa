//! studymate-session
//!
//! The explicit session context: one loaded document (chunks + index +
//! fingerprint, always replaced together), the capabilities used to answer
//! questions about it, and the chat history.

use std::sync::Arc;

use chrono::Utc;
use studymate_answer::{compose, BackendSelection, BackendSet, LocalComposer, PromptStyle, QuickGrammar};
use studymate_core::config::Settings;
use studymate_core::traits::TextNormalizer;
use studymate_core::types::{ChatEntry, ComposedAnswer, DocumentInfo, Marks, SourceKind};
use studymate_core::{Error, Result};
use studymate_embed::EmbeddingModel;
use studymate_text::{detect_extractor, Chunker};
use studymate_vector::{build_index, texts, Index, KeywordBudget, Retriever};
use tracing::{info, warn};

pub mod stats;

pub use stats::{ChatStats, SessionStatus};

/// What a question's context is for, which fixes how much retrieval keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPlan {
    Backends,
    Rubric(Marks),
    Detailed,
}

impl ContextPlan {
    /// Vector hits requested.
    pub fn k(self) -> usize {
        match self {
            Self::Backends => 2,
            Self::Rubric(Marks::Seven) => 3,
            Self::Rubric(Marks::Fourteen) | Self::Detailed => 4,
        }
    }

    pub fn budget(self) -> KeywordBudget {
        match self {
            Self::Backends | Self::Rubric(Marks::Seven) => KeywordBudget::STANDARD,
            Self::Rubric(Marks::Fourteen) | Self::Detailed => KeywordBudget::EXTENDED,
        }
    }
}

/// A document that passed chunking and indexing.
pub struct LoadedDocument {
    pub info: DocumentInfo,
    chunks: Vec<String>,
    index: Index,
}

impl LoadedDocument {
    pub fn chunks(&self) -> &[String] { &self.chunks }

    pub fn index(&self) -> &Index { &self.index }
}

pub struct Session {
    settings: Settings,
    model: EmbeddingModel,
    retriever: Retriever,
    backends: BackendSet,
    composer: LocalComposer,
    document: Option<LoadedDocument>,
    history: Vec<ChatEntry>,
}

impl Session {
    pub fn new(settings: Settings, model: EmbeddingModel, backends: BackendSet) -> Self {
        let retriever = Retriever::new(settings.retrieval.clone());
        let composer = LocalComposer::new(settings.retrieval.keyword_min_len);
        Self { settings, model, retriever, backends, composer, document: None, history: Vec::new() }
    }

    /// Resolve the embedding model and configured backends from settings.
    /// A missing model only means fast mode; it is not an error.
    pub fn from_settings(settings: Settings, style: PromptStyle) -> anyhow::Result<Self> {
        let model = EmbeddingModel::from_settings(&settings.embedding);
        let normalizer: Arc<dyn TextNormalizer> = Arc::new(QuickGrammar::new()?);
        let backends = BackendSet::from_settings(
            &settings.backends,
            style,
            Some(normalizer),
            settings.retrieval.keyword_min_len,
        )?;
        info!(embedding = %model.describe(), backends = ?backends.labels(), "session ready");
        Ok(Self::new(settings, model, backends))
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn embedding(&self) -> &EmbeddingModel { &self.model }

    pub fn backends(&self) -> &BackendSet { &self.backends }

    pub fn document(&self) -> Option<&LoadedDocument> { self.document.as_ref() }

    /// Chunk and index `bytes`, then install the result in place of the
    /// current document. On error the current document stays loaded.
    pub fn load_document(&mut self, name: &str, bytes: &[u8]) -> Result<&DocumentInfo> {
        let extractor = detect_extractor(bytes);
        let chunked = Chunker::new(&self.settings.chunking).chunk(extractor.as_ref(), bytes).map_err(|e| {
            warn!(document = name, error = %e, "document rejected");
            e
        })?;
        let index = build_index(&chunked.chunks, &self.model, &self.settings.index).map_err(|e| {
            warn!(document = name, error = %e, "document rejected");
            e
        })?;

        let info = DocumentInfo {
            name: name.to_string(),
            fingerprint: blake3::hash(bytes).to_hex().to_string(),
            pages: chunked.pages,
            pages_with_text: chunked.pages_with_text,
            chunks: chunked.chunks.len(),
        };
        info!(
            document = name,
            pages = info.pages,
            chunks = info.chunks,
            mode = index.mode_name(),
            indexed = index.count(),
            "document loaded"
        );
        let loaded = self.document.insert(LoadedDocument { info, chunks: chunked.chunks, index });
        Ok(&loaded.info)
    }

    /// Drop the loaded document; history is kept.
    pub fn unload(&mut self) -> Option<DocumentInfo> {
        let info = self.document.take().map(|d| d.info);
        if let Some(info) = &info {
            info!(document = %info.name, "document unloaded");
        }
        info
    }

    /// Ask the selected backends. Context comes from up to two vector hits
    /// or the standard keyword budget, falling back to the leading chunks.
    pub async fn ask(&mut self, question: &str, selection: &BackendSelection) -> Result<ComposedAnswer> {
        let context = self.context(question, ContextPlan::Backends)?;
        let backends = self.backends.select(selection)?;
        let answer = compose(question, &context, &backends, self.backends.timeout()).await?;
        self.record(question, &answer);
        Ok(answer)
    }

    pub fn ask_rubric(&mut self, question: &str, marks: Marks) -> Result<ComposedAnswer> {
        let context = self.context(question, ContextPlan::Rubric(marks))?;
        let answer = self.composer.rubric(question, &context, marks)?;
        self.record(question, &answer);
        Ok(answer)
    }

    /// Like [`Session::ask_rubric`] but takes the raw mark value; only 7 and 14 are accepted.
    pub fn ask_rubric_value(&mut self, question: &str, marks: u8) -> Result<ComposedAnswer> {
        self.ask_rubric(question, Marks::try_from(marks)?)
    }

    /// Detailed 14-mark style answer with no backend call.
    pub fn ask_detailed(&mut self, question: &str) -> Result<ComposedAnswer> {
        let context = self.context(question, ContextPlan::Detailed)?;
        let answer = self.composer.detailed(question, &context)?;
        self.record(question, &answer);
        Ok(answer)
    }

    pub fn context(&self, question: &str, plan: ContextPlan) -> Result<String> {
        self.context_for(question, plan.k(), plan.budget())
    }

    /// Context text handed to answer generation. Never empty while a
    /// document with chunks is loaded.
    pub fn context_for(&self, question: &str, k: usize, budget: KeywordBudget) -> Result<String> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let doc = self.document.as_ref().ok_or(Error::NoDocument)?;
        let hits = self.retriever.search_or_leading(question, &doc.chunks, Some(&doc.index), &self.model, k, budget);
        let separator = if hits.iter().all(|h| h.source == SourceKind::Vector) { "\n" } else { " " };
        Ok(texts(&doc.chunks, &hits).join(separator))
    }

    pub fn history(&self) -> &[ChatEntry] { &self.history }

    pub fn clear_history(&mut self) {
        info!(entries = self.history.len(), "chat history cleared");
        self.history.clear();
    }

    pub fn stats(&self) -> ChatStats { ChatStats::from_history(&self.history) }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            embedding: self.model.describe(),
            embedding_available: self.model.is_available(),
            backends: self.backends.labels(),
            index_mode: self.document.as_ref().map(|d| d.index.mode_name().to_string()),
            document: self.document.as_ref().map(|d| d.info.clone()),
            questions: self.history.len(),
        }
    }

    fn record(&mut self, question: &str, answer: &ComposedAnswer) {
        self.history.push(ChatEntry {
            question: question.to_string(),
            answer: answer.text.clone(),
            contributors: answer.contributors.clone(),
            asked_at: Utc::now(),
        });
    }
}
