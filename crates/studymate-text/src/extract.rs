use anyhow::{anyhow, Context, Result};
use lopdf::Document;
use tracing::debug;

use studymate_core::traits::DocumentExtractor;

/// PDF text extraction backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl DocumentExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Result<String>>> {
        let doc = Document::load_mem(bytes).context("Failed to load PDF")?;
        let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        page_numbers.sort_unstable();
        debug!(pages = page_numbers.len(), "pdf loaded");
        Ok(page_numbers
            .into_iter()
            .map(|n| doc.extract_text(&[n]).map_err(|e| anyhow!("page {}: {}", n, e)))
            .collect())
    }
}

/// Plain-text "extraction": decodes UTF-8 (lossily) and treats form feeds as
/// page breaks.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Result<String>>> {
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        };
        Ok(text.split('\x0c').map(|page| Ok(page.to_string())).collect())
    }
}

/// Pick an extractor from the upload's magic bytes.
pub fn detect_extractor(bytes: &[u8]) -> Box<dyn DocumentExtractor> {
    if bytes.starts_with(b"%PDF-") {
        Box::new(PdfExtractor)
    } else {
        Box::new(PlainTextExtractor)
    }
}
