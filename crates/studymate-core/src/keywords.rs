//! Keyword extraction and overlap scoring used by the keyword retriever and
//! the rubric sentence ranking.

/// Lowercased query words longer than `min_len` characters, with surrounding
/// punctuation stripped. Duplicates are kept so repeated words weigh more.
pub fn extract_keywords(query: &str, min_len: usize) -> Vec<String> {
    query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.chars().count() > min_len)
        .collect()
}

/// Number of keywords that occur in `text` (case-insensitive substring match).
pub fn keyword_score(text: &str, keywords: &[String]) -> usize {
    let lower = text.to_lowercase();
    keywords.iter().filter(|k| lower.contains(k.as_str())).count()
}

/// Score every item, keep those with a positive score and order them by
/// descending score. The sort is stable, so equal scores keep input order.
pub fn rank_by_keywords<'a, I>(items: I, keywords: &[String]) -> Vec<(usize, &'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(usize, &'a str, usize)> = items
        .into_iter()
        .enumerate()
        .map(|(i, text)| (i, text, keyword_score(text, keywords)))
        .filter(|(_, _, score)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.2.cmp(&a.2));
    scored
}

/// The first `n` whitespace-separated words of `text`, joined by single spaces.
pub fn leading_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Words `start..end` of `text`, joined by single spaces.
pub fn word_slice(text: &str, start: usize, end: usize) -> String {
    text.split_whitespace()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect::<Vec<_>>()
        .join(" ")
}
