use std::sync::Arc;
use std::time::Duration;

use studymate_core::config::BackendSettings;
use studymate_core::traits::TextNormalizer;
use studymate_core::{Error, Result};
use tracing::{info, warn};

use crate::backend::{Backend, PromptStyle, PromptedBackend};
use crate::extractive::ExtractiveBackend;
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;

/// Which backends a question goes to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendSelection {
    #[default]
    All,
    /// Labels, matched case-insensitively.
    Only(Vec<String>),
}

impl BackendSelection {
    pub fn only<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(labels.into_iter().map(Into::into).collect())
    }
}

/// The backends available to a session, in invocation order.
#[derive(Clone)]
pub struct BackendSet {
    backends: Vec<Arc<dyn Backend>>,
    timeout: Duration,
}

impl BackendSet {
    pub fn new(timeout: Duration) -> Self { Self { backends: Vec::new(), timeout } }

    /// Remote backends whose API key is present, followed by the local
    /// extractive backend, which is always available.
    pub fn from_settings(
        settings: &BackendSettings,
        style: PromptStyle,
        normalizer: Option<Arc<dyn TextNormalizer>>,
        keyword_min_len: usize,
    ) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let mut set = Self::new(timeout);
        if let Some(client) = OpenAiClient::from_settings(&settings.openai, timeout)? {
            info!(model = client.model(), "OpenAI backend configured");
            set.push(Arc::new(prompted(client, style, normalizer.clone())));
        }
        if let Some(client) = GeminiClient::from_settings(&settings.gemini, timeout)? {
            info!(model = client.model(), "Gemini backend configured");
            set.push(Arc::new(prompted(client, style, normalizer.clone())));
        }
        set.push(Arc::new(ExtractiveBackend::new(keyword_min_len)));
        Ok(set)
    }

    pub fn push(&mut self, backend: Arc<dyn Backend>) { self.backends.push(backend); }

    pub fn with(mut self, backend: Arc<dyn Backend>) -> Self {
        self.push(backend);
        self
    }

    pub fn timeout(&self) -> Duration { self.timeout }

    pub fn len(&self) -> usize { self.backends.len() }

    pub fn is_empty(&self) -> bool { self.backends.is_empty() }

    pub fn labels(&self) -> Vec<String> { self.backends.iter().map(|b| b.label().to_string()).collect() }

    /// Backends matching `selection`, in set order. Unknown labels are skipped.
    pub fn select(&self, selection: &BackendSelection) -> Result<Vec<Arc<dyn Backend>>> {
        let chosen: Vec<Arc<dyn Backend>> = match selection {
            BackendSelection::All => self.backends.clone(),
            BackendSelection::Only(labels) => {
                for label in labels {
                    if !self.backends.iter().any(|b| b.label().eq_ignore_ascii_case(label)) {
                        warn!(%label, "selected backend is not configured");
                    }
                }
                self.backends
                    .iter()
                    .filter(|b| labels.iter().any(|l| b.label().eq_ignore_ascii_case(l)))
                    .cloned()
                    .collect()
            }
        };
        if chosen.is_empty() {
            return Err(Error::NoBackendsSelected);
        }
        Ok(chosen)
    }
}

fn prompted<C: crate::backend::Completion>(
    client: C,
    style: PromptStyle,
    normalizer: Option<Arc<dyn TextNormalizer>>,
) -> PromptedBackend<C> {
    let backend = PromptedBackend::new(client, style);
    match normalizer {
        Some(n) => backend.with_normalizer(n),
        None => backend,
    }
}
