use std::collections::HashMap;
use std::sync::Arc;

use studymate_core::config::{IndexSettings, RetrievalSettings};
use studymate_core::types::SourceKind;
use studymate_embed::{Embedder, EmbeddingModel, FakeEmbedder};
use studymate_vector::{build_index, texts, Index, KeywordBudget, Retriever};

/// Maps known texts onto fixed vectors; anything else lands on the last axis.
struct AxisEmbedder(HashMap<&'static str, Vec<f32>>);

impl Embedder for AxisEmbedder {
    fn id(&self) -> &str { "axis" }
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { 64 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.0.get(t.as_str()).cloned().unwrap_or_else(|| vec![0.0, 0.0, 0.0, 1.0])).collect())
    }
}

fn axis_model() -> EmbeddingModel {
    EmbeddingModel::Model(Arc::new(AxisEmbedder(HashMap::from([
        ("Mitochondria produce energy for the cell.", vec![1.0, 0.0, 0.0, 0.0]),
        ("Ribosomes assemble proteins from amino acids.", vec![0.0, 1.0, 0.0, 0.0]),
        ("The nucleus stores genetic material.", vec![0.0, 0.0, 1.0, 0.0]),
        ("Chloroplasts capture light energy.", vec![0.9, 0.0, 0.1, 0.0]),
        ("cell energy", vec![1.0, 0.0, 0.0, 0.0]),
        ("energy and genes", vec![1.0, 0.0, 1.0, 0.0]),
    ]))))
}

fn cell_chunks() -> Vec<String> {
    [
        "Mitochondria produce energy for the cell.",
        "Ribosomes assemble proteins from amino acids.",
        "The nucleus stores genetic material.",
        "Chloroplasts capture light energy.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn mammal_chunks() -> Vec<String> {
    vec!["Fish are not mammals.".into(), "Dogs are mammals.".into(), "Cats are mammals.".into()]
}

#[test]
fn vector_retrieval_orders_by_similarity_and_applies_threshold() {
    let model = axis_model();
    let chunks = cell_chunks();
    let index = build_index(&chunks, &model, &IndexSettings::default()).expect("index");
    assert!(!index.is_fast_mode());
    let retriever = Retriever::default();

    let hits = retriever.search("cell energy", &chunks, Some(&index), &model, 5, KeywordBudget::default());
    let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
    // ribosome and nucleus chunks are orthogonal to the query (score 0 <= 0.1)
    assert_eq!(positions, vec![0, 3]);
    assert!(hits.iter().all(|h| h.source == SourceKind::Vector));
    assert!(hits[0].score >= hits[1].score);

    let unrelated = retriever.retrieve("quantum chromodynamics", &chunks, Some(&index), &model, 3);
    assert!(unrelated.is_empty(), "nothing passes the similarity threshold");
}

#[test]
fn vector_retrieval_never_exceeds_min_k_and_three() {
    let model = EmbeddingModel::Model(Arc::new(FakeEmbedder::new(32)));
    let chunks: Vec<String> = (0..10).map(|i| format!("energy energy energy note {i}")).collect();
    let index = build_index(&chunks, &model, &IndexSettings::default()).expect("index");
    let retriever = Retriever::default();
    for k in 0..6 {
        let hits = retriever.search("energy energy energy", &chunks, Some(&index), &model, k, KeywordBudget::default());
        assert!(hits.len() <= k.min(3), "k={k} returned {}", hits.len());
        assert!(hits.iter().all(|h| h.position < chunks.len()));
    }
}

#[test]
fn soft_failures_return_empty() {
    let model = axis_model();
    let chunks = cell_chunks();
    let index = build_index(&chunks, &model, &IndexSettings::default()).expect("index");
    let r = Retriever::default();
    assert!(r.search("   ", &chunks, Some(&index), &model, 3, KeywordBudget::default()).is_empty());
    assert!(r.search("cell energy", &[], Some(&index), &model, 3, KeywordBudget::default()).is_empty());
    assert!(r.search("cell energy", &chunks, None, &model, 3, KeywordBudget::default()).is_empty());
    assert!(r.search("cell energy", &chunks, Some(&index), &model, 0, KeywordBudget::default()).is_empty());
}

#[test]
fn stale_positions_are_never_returned() {
    let model = axis_model();
    let index = build_index(&cell_chunks(), &model, &IndexSettings::default()).expect("index");
    // Pair the index with a shorter sequence than it was built from.
    let shorter: Vec<String> = cell_chunks().into_iter().take(2).collect();
    let hits = Retriever::default().search("energy and genes", &shorter, Some(&index), &model, 3, KeywordBudget::default());
    assert!(hits.iter().all(|h| h.position < shorter.len()));
}

#[test]
fn keyword_retrieval_ranks_by_overlap() {
    let chunks = mammal_chunks();
    let r = Retriever::default();
    let hits = r.search("Are cats mammals?", &chunks, Some(&Index::FastMode), &EmbeddingModel::Unavailable { reason: "test".into() }, 3, KeywordBudget::default());
    let found = texts(&chunks, &hits);
    assert_eq!(found[0], "Cats are mammals.");
    let cats = found.iter().position(|c| c.starts_with("Cats")).expect("cats");
    let fish = found.iter().position(|c| c.starts_with("Fish")).expect("fish");
    assert!(cats < fish);
    // equal scores keep document order
    assert_eq!(found, vec!["Cats are mammals.", "Fish are not mammals.", "Dogs are mammals."]);
    assert!(hits.iter().all(|h| h.source == SourceKind::Keyword));
    assert_eq!(hits[0].score, 2.0);
}

#[test]
fn keyword_retrieval_is_deterministic_and_budgeted() {
    let chunks: Vec<String> = (0..40).map(|i| if i % 2 == 0 { format!("Enzyme kinetics part {i}") } else { format!("Unrelated part {i}") }).collect();
    let r = Retriever::default();
    let fast = Index::FastMode;
    let none = EmbeddingModel::Unavailable { reason: "test".into() };
    let a = r.search("enzyme kinetics", &chunks, Some(&fast), &none, 4, KeywordBudget::EXTENDED);
    let b = r.search("enzyme kinetics", &chunks, Some(&fast), &none, 4, KeywordBudget::EXTENDED);
    assert_eq!(a, b);
    assert_eq!(a.len(), 4);
    assert_eq!(a.iter().map(|h| h.position).collect::<Vec<_>>(), vec![0, 2, 4, 6]);

    let scanned = r.search("and the", &chunks, Some(&fast), &none, 4, KeywordBudget::STANDARD);
    assert!(scanned.is_empty(), "short words are not keywords");

    let late = r.search("Unrelated 39", &chunks, Some(&fast), &none, 4, KeywordBudget { scan_limit: 20, top_n: 2 });
    assert_eq!(late.len(), 2);
    assert!(late.iter().all(|h| h.position < 20), "only the scanned prefix is considered");
}

#[test]
fn no_match_falls_back_to_leading_chunks() {
    let chunks = mammal_chunks();
    let r = Retriever::new(RetrievalSettings::default());
    let none = EmbeddingModel::Unavailable { reason: "test".into() };
    let hits = r.search_or_leading("photosynthesis", &chunks, Some(&Index::FastMode), &none, 3, KeywordBudget { scan_limit: 20, top_n: 2 });
    assert_eq!(hits.iter().map(|h| h.position).collect::<Vec<_>>(), vec![0, 1]);
    assert!(hits.iter().all(|h| h.source == SourceKind::Leading));
}

#[test]
fn vector_index_without_embedder_uses_keywords() {
    let model = axis_model();
    let chunks = cell_chunks();
    let index = build_index(&chunks, &model, &IndexSettings::default()).expect("index");
    let gone = EmbeddingModel::Unavailable { reason: "unloaded".into() };
    let hits = Retriever::default().search("nucleus genetic", &chunks, Some(&index), &gone, 3, KeywordBudget::default());
    assert_eq!(hits[0].position, 2);
    assert_eq!(hits[0].source, SourceKind::Keyword);
}

#[test]
fn keyword_retrieval_keeps_the_budget_regardless_of_k() {
    let chunks: Vec<String> = (0..6).map(|i| format!("Photosynthesis happens in leaf {i}.")).collect();
    let r = Retriever::default();
    let none = EmbeddingModel::Unavailable { reason: "test".into() };
    for k in [1, 2, 5] {
        let hits = r.search("explain photosynthesis", &chunks, Some(&Index::FastMode), &none, k, KeywordBudget::STANDARD);
        assert_eq!(hits.iter().map(|h| h.position).collect::<Vec<_>>(), vec![0, 1, 2], "k={k}");
    }
    let extended = r.search("explain photosynthesis", &chunks, Some(&Index::FastMode), &none, 2, KeywordBudget::EXTENDED);
    assert_eq!(extended.len(), 4);
}

/// Embeds documents fine but cannot embed anything afterwards.
struct Offline;

impl Embedder for Offline {
    fn id(&self) -> &str { "offline" }
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { 64 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model unloaded")
    }
}

#[test]
fn failed_query_embedding_degrades_to_leading_chunks() {
    let chunks = cell_chunks();
    let index = build_index(&chunks, &axis_model(), &IndexSettings::default()).expect("index");
    let offline = EmbeddingModel::Model(Arc::new(Offline));
    let r = Retriever::default();

    assert!(r.search("cell energy", &chunks, Some(&index), &offline, 4, KeywordBudget::EXTENDED).is_empty());

    // a vector-mode miss falls back to `max_results` chunks, whatever the keyword budget
    let hits = r.search_or_leading("cell energy", &chunks, Some(&index), &offline, 4, KeywordBudget::EXTENDED);
    assert_eq!(hits.iter().map(|h| h.position).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(hits.iter().all(|h| h.source == SourceKind::Leading));

    let unrelated = r.search_or_leading("quantum chromodynamics", &chunks, Some(&index), &axis_model(), 4, KeywordBudget::EXTENDED);
    assert_eq!(unrelated.len(), 3);
}
