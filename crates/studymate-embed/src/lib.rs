//! studymate-embed
//!
//! Embedding capability for the vector index. A local candle model
//! (XLM-RoBERTa / BGE family) is used when weights are present; a
//! deterministic hashed embedder serves tests and development. When neither
//! is usable the capability is `Unavailable` and the pipeline runs in fast
//! (keyword) mode.

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{Device, Tensor, DType};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{XLMRobertaModel, Config as XLMRobertaConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use studymate_core::config::{expand_path, EmbeddingSettings};
pub use studymate_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

/// Process-wide embedding capability.
#[derive(Clone)]
pub enum EmbeddingModel {
    Model(Arc<dyn Embedder>),
    Unavailable { reason: String },
}

impl EmbeddingModel {
    /// Resolve the capability from settings. Never fails: any load problem
    /// degrades to `Unavailable`.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        if !settings.enabled {
            return Self::Unavailable { reason: "embedding disabled by configuration".into() };
        }
        match load_embedder(settings) {
            Ok(embedder) => Self::Model(embedder),
            Err(e) => {
                warn!(error = %e, "embedding model unavailable, falling back to fast mode");
                Self::Unavailable { reason: e.to_string() }
            }
        }
    }

    pub fn embedder(&self) -> Option<&dyn Embedder> {
        match self {
            Self::Model(embedder) => Some(embedder.as_ref()),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool { matches!(self, Self::Model(_)) }

    pub fn describe(&self) -> String {
        match self {
            Self::Model(embedder) => format!("{} (dim {})", embedder.id(), embedder.dim()),
            Self::Unavailable { reason } => format!("unavailable: {reason}"),
        }
    }
}

impl std::fmt::Debug for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Load the configured embedder. Respects `APP_USE_FAKE_EMBEDDINGS=1`.
pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if settings.use_fake || env_fake {
        info!(dim = settings.fake_dim, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.fake_dim)));
    }
    let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Arc::new(CandleEmbedder::load(&model_dir, settings.max_len)?))
}

pub struct CandleEmbedder { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize, pad_id: u32, id: String }

impl CandleEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?;
        let config: XLMRobertaConfig = serde_json::from_str(&raw_config)?;
        let raw: serde_json::Value = serde_json::from_str(&raw_config)?;
        let dim = raw.get("hidden_size").and_then(serde_json::Value::as_u64).ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;
        let pad_id = raw.get("pad_token_id").and_then(serde_json::Value::as_u64).unwrap_or(1) as u32;
        let weights_map = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "model".into());
        info!(dim, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len: max_len.max(1), pad_id, id: format!("candle:{name}:d{dim}") })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = Tensor::zeros((texts.len(), self.max_len), DType::I64, &self.device)?;
        let hidden_states = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden_states, &attention_mask)?;
        Ok(pooled.to_device(&Device::Cpu)?.to_vec2()?)
    }
}

impl Embedder for CandleEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let out = self.embed_chunk(texts)?;
        debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<std::collections::HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&pickle).with_context(|| format!("reading {}", pickle.display()))?;
    Ok(weights.into_iter().collect())
}

/// Deterministic embedder hashing lowercased tokens into `dim` buckets.
pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { let dim = dim.max(1); Self { dim, id: format!("fake:xxh64:d{dim}") } }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() { continue; }
            let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish();
            let idx = (h as usize) % self.dim; let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; } v
    }
}

impl Embedder for FakeEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured { let p = expand_path(dir); if p.exists() { debug!(dir = %p.display(), "using configured model dir"); return Ok(p); } warn!(dir = %p.display(), "configured model dir does not exist"); }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { debug!(dir = %p.display(), "using MODEL_DIR"); return Ok(p); } }
    for candidate in ["models/bge-m3", "../models/bge-m3"] { let p = Path::new(candidate); if p.exists() { debug!(dir = %p.display(), "using model dir"); return Ok(p.to_path_buf()); } }
    Err(anyhow!("Could not locate embedding model directory"))
}
