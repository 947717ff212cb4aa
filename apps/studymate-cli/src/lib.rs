//! Helpers shared by the `studymate` binaries.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use studymate_core::types::DocumentInfo;
use studymate_session::Session;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` (default `info`), so stdout carries
/// only answers.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Read `path` and load it into the session under its file name.
pub fn load_file(session: &mut Session, path: &Path) -> anyhow::Result<DocumentInfo> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    debug!(path = %path.display(), bytes = bytes.len(), "read document");
    let pb = spinner(format!("Processing {name}"));
    let loaded = session.load_document(&name, &bytes).map(Clone::clone);
    pb.finish_and_clear();
    Ok(loaded?)
}

pub fn describe_document(info: &DocumentInfo) -> String {
    format!(
        "{} | {} pages ({} with text) | {} chunks | blake3 {}",
        info.name,
        info.pages,
        info.pages_with_text,
        info.chunks,
        &info.fingerprint[..info.fingerprint.len().min(12)]
    )
}
