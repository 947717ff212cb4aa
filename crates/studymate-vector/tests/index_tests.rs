use std::collections::HashMap;
use std::sync::Arc;

use studymate_core::config::IndexSettings;
use studymate_core::Error;
use studymate_embed::{Embedder, EmbeddingModel, FakeEmbedder};
use studymate_vector::{build_index, build_vector_index, normalize_l2, FlatIpIndex, Index};

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn id(&self) -> &str { "broken" }
    fn dim(&self) -> usize { 8 }
    fn max_len(&self) -> usize { 8 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { anyhow::bail!("device lost") }
}

/// Returns whatever the table says, for shape-validation tests.
struct ScriptedEmbedder(HashMap<String, Vec<f32>>);

impl Embedder for ScriptedEmbedder {
    fn id(&self) -> &str { "scripted" }
    fn dim(&self) -> usize { 0 }
    fn max_len(&self) -> usize { 0 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().filter_map(|t| self.0.get(t).cloned()).collect())
    }
}

fn fake_model() -> EmbeddingModel { EmbeddingModel::Model(Arc::new(FakeEmbedder::new(64))) }

fn chunks(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("chunk {i} describes topic number {i} in some detail")).collect()
}

#[test]
fn vector_index_counts_filtered_chunks_and_normalizes() {
    let mut input = chunks(5);
    input.insert(2, "tiny".to_string());
    let index = build_index(&input, &fake_model(), &IndexSettings::default()).expect("index");
    let Index::Vector(flat) = index else { panic!("expected vector index") };
    assert_eq!(flat.len(), 5, "the short chunk is skipped");
    assert_eq!(flat.positions(), &[0, 1, 3, 4, 5]);
    for row in 0..flat.len() {
        let v = flat.vector(row).expect("row");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "row {row} norm {norm}");
    }
}

#[test]
fn vector_index_caps_input_chunks() {
    let input = chunks(80);
    let flat = build_vector_index(&input, &FakeEmbedder::new(32), &IndexSettings::default()).expect("index");
    assert_eq!(flat.len(), 50);
    assert_eq!(*flat.positions().last().expect("rows"), 49);
}

#[test]
fn batching_does_not_change_the_result() {
    let input = chunks(11);
    let small = IndexSettings { batch_size: 3, ..IndexSettings::default() };
    let a = build_vector_index(&input, &FakeEmbedder::new(16), &small).expect("a");
    let b = build_vector_index(&input, &FakeEmbedder::new(16), &IndexSettings::default()).expect("b");
    assert_eq!(a.len(), b.len());
    for row in 0..a.len() { assert_eq!(a.vector(row), b.vector(row)); }
}

#[test]
fn fast_mode_when_forced_or_unavailable() {
    let input = chunks(3);
    let forced = IndexSettings { force_fast_mode: true, ..IndexSettings::default() };
    assert!(build_index(&input, &fake_model(), &forced).expect("forced").is_fast_mode());

    let unavailable = EmbeddingModel::Unavailable { reason: "no weights".into() };
    assert!(build_index(&input, &unavailable, &IndexSettings::default()).expect("fallback").is_fast_mode());
}

#[test]
fn failing_embedder_degrades_to_fast_mode() {
    let input = chunks(3);
    let model = EmbeddingModel::Model(Arc::new(BrokenEmbedder));
    let index = build_index(&input, &model, &IndexSettings::default()).expect("degrades");
    assert!(index.is_fast_mode());
    assert_eq!(index.count(), 0);

    let strict = build_vector_index(&input, &BrokenEmbedder, &IndexSettings::default()).unwrap_err();
    assert!(matches!(strict, Error::EmbeddingFailure(_)));
}

#[test]
fn empty_or_zero_dimension_embeddings_are_embedding_failures() {
    let input = vec!["a chunk that is long enough".to_string()];
    let none = ScriptedEmbedder(HashMap::new());
    assert!(matches!(build_vector_index(&input, &none, &IndexSettings::default()), Err(Error::EmbeddingFailure(_))));

    let zero_dim = ScriptedEmbedder(HashMap::from([(input[0].clone(), Vec::new())]));
    assert!(matches!(build_vector_index(&input, &zero_dim, &IndexSettings::default()), Err(Error::EmbeddingFailure(_))));
}

#[test]
fn no_usable_chunks() {
    let input = vec!["short".to_string(), "   ".to_string()];
    assert!(matches!(build_vector_index(&input, &FakeEmbedder::new(8), &IndexSettings::default()), Err(Error::NoValidChunks)));
    assert!(matches!(build_index(&[], &fake_model(), &IndexSettings::default()), Err(Error::NoValidChunks)));
}

#[test]
fn flat_index_orders_by_inner_product() {
    let mut index = FlatIpIndex::new(2);
    let mut a = vec![1.0, 0.0];
    let mut b = vec![1.0, 1.0];
    let mut c = vec![0.0, 1.0];
    for v in [&mut a, &mut b, &mut c] { assert!(normalize_l2(v)); }
    index.add(10, &a).expect("a");
    index.add(11, &b).expect("b");
    index.add(12, &c).expect("c");
    assert!(index.add(13, &[1.0, 0.0, 0.0]).is_err(), "dimension mismatch rejected");

    let hits = index.search(&a, 2);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0, 10);
    assert!((hits[0].1 - 1.0).abs() < 1e-6);
    assert_eq!(hits[1].0, 11);
    assert!(index.search(&[1.0], 2).is_empty());

    let mut zero = vec![0.0, 0.0];
    assert!(!normalize_l2(&mut zero));
}
