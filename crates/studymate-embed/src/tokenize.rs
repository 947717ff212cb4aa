use anyhow::{Result, anyhow};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Tokenize a batch to fixed-length `[B, max_len]` id and mask tensors,
/// truncating long inputs and right-padding short ones with `pad_id`.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, pad_id: u32, device: &Device) -> Result<(Tensor, Tensor)> {
    let mut all_ids = Vec::with_capacity(texts.len() * max_len);
    let mut all_mask = Vec::with_capacity(texts.len() * max_len);
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
        if ids.len() < max_len { let pad = max_len - ids.len(); ids.extend(std::iter::repeat(pad_id).take(pad)); mask.extend(std::iter::repeat(0).take(pad)); }
        all_ids.extend(ids);
        all_mask.extend(mask);
    }
    let input_ids = Tensor::from_vec(all_ids, (texts.len(), max_len), device)?;
    let attention_mask = Tensor::from_vec(all_mask, (texts.len(), max_len), device)?;
    Ok((input_ids, attention_mask))
}
