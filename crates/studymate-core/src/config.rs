//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge compiled defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`). Provider API keys also
//! fall back to the conventional `OPENAI_API_KEY` / `GOOGLE_API_KEY` variables.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "backends.openai.api_key".into()))
            .merge(Env::raw().only(&["GOOGLE_API_KEY"]).map(|_| "backends.gemini.api_key".into()))
            .merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Wrap an already assembled figment; used by tests and embedders of the crate.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the typed settings tree.
    pub fn settings(&self) -> crate::error::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub backends: BackendSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunking.max_chars <= self.chunking.min_chars {
            return Err(Error::InvalidConfig(format!(
                "chunking.max_chars ({}) must exceed chunking.min_chars ({})",
                self.chunking.max_chars, self.chunking.min_chars
            )));
        }
        if self.index.batch_size == 0 {
            return Err(Error::InvalidConfig("index.batch_size must be positive".into()));
        }
        if self.backends.timeout_secs == 0 {
            return Err(Error::InvalidConfig("backends.timeout_secs must be positive".into()));
        }
        if self.retrieval.max_results == 0 {
            return Err(Error::InvalidConfig("retrieval.max_results must be positive".into()));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(Error::InvalidConfig(format!(
                "retrieval.similarity_threshold ({}) must lie in [-1, 1]",
                self.retrieval.similarity_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Upper bound on a chunk's length in characters.
    pub max_chars: usize,
    /// Chunks whose trimmed length is at or below this are dropped.
    pub min_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_chars: 500, min_chars: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub max_chunks: usize,
    pub min_chunk_chars: usize,
    pub batch_size: usize,
    pub force_fast_mode: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { max_chunks: 50, min_chunk_chars: 10, batch_size: 8, force_fast_mode: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub similarity_threshold: f32,
    pub max_results: usize,
    /// Query words must be strictly longer than this to count as keywords.
    pub keyword_min_len: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { similarity_threshold: 0.1, max_results: 3, keyword_min_len: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub enabled: bool,
    pub use_fake: bool,
    pub fake_dim: usize,
    pub model_dir: Option<String>,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { enabled: true, use_fake: false, fake_dim: 384, model_dir: None, max_len: 256 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub timeout_secs: u64,
    pub openai: ProviderSettings,
    pub gemini: ProviderSettings,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            openai: ProviderSettings {
                api_key: None,
                model: "gpt-3.5-turbo".into(),
                base_url: "https://api.openai.com/v1".into(),
            },
            gemini: ProviderSettings {
                api_key: None,
                model: "gemini-pro".into(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl ProviderSettings {
    /// Configured means a non-blank API key is present.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
