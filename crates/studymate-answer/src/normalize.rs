use regex::Regex;
use studymate_core::traits::TextNormalizer;
use tracing::warn;

/// Cheap grammar pass for questions: a standalone lowercase `i` becomes `I`,
/// runs of whitespace collapse to one space, and the result is trimmed.
/// Text shorter than five characters is left alone.
pub struct QuickGrammar {
    lone_i: Regex,
    spaces: Regex,
}

impl QuickGrammar {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { lone_i: Regex::new(r"\bi\b")?, spaces: Regex::new(r"\s+")? })
    }
}

impl TextNormalizer for QuickGrammar {
    fn correct(&self, text: &str) -> anyhow::Result<String> {
        if text.trim().chars().count() < 5 {
            return Ok(text.to_string());
        }
        let fixed = self.lone_i.replace_all(text, "I");
        let fixed = self.spaces.replace_all(&fixed, " ");
        Ok(fixed.trim().to_string())
    }
}

/// Apply an optional normalizer; any failure keeps the original text.
pub fn normalize_or_keep(normalizer: Option<&dyn TextNormalizer>, text: &str) -> String {
    let Some(normalizer) = normalizer else { return text.to_string() };
    match normalizer.correct(text) {
        Ok(corrected) => corrected,
        Err(e) => {
            warn!(error = %e, "text normalization failed, keeping original");
            text.to_string()
        }
    }
}
