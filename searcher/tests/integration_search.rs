use search_core::persist::{save_all, IndexPaths, TextStore};
use search_core::{build, SourceDocument};
use searcher::{SearchConfig, SearchEngine, Snapshot};
use serde_json::Value;
use std::sync::Arc;
use tempfile::tempdir;

fn docs(texts: &[(&str, &str)]) -> Vec<SourceDocument> {
    texts
        .iter()
        .enumerate()
        .map(|(i, (title, text))| SourceDocument {
            title: title.to_string(),
            url: format!("https://example.org/{i}"),
            text: text.to_string(),
        })
        .collect()
}

fn build_tiny_index(dir: &std::path::Path, corpus: &[SourceDocument]) {
    let index = build(corpus);
    let texts: TextStore = corpus.iter().enumerate().map(|(i, d)| (i as u32, d.text.clone())).collect();
    save_all(&IndexPaths::new(dir), &index, &texts).unwrap();
}

fn three_docs() -> Vec<SourceDocument> {
    docs(&[
        ("Neural nets", "neural networks learn"),
        ("Deep learning", "deep neural learning"),
        ("Robotics", "robotics and control"),
    ])
}

#[test]
fn search_returns_ranked_results_with_snippets() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &three_docs());
    let engine = SearchEngine::open(dir.path(), SearchConfig::default()).unwrap();

    let resp = engine.search("neural NOT robotics", 10);
    assert!(resp.error.is_none());
    assert_eq!(resp.total_hits, 2);
    let ids: Vec<_> = resp.results.iter().map(|h| h.doc_id).collect();
    assert!(ids.contains(&0) && ids.contains(&1));
    assert!(resp.results[0].score >= resp.results[1].score);

    let resp = engine.search("\"neural networks\"", 10);
    assert_eq!(resp.results.len(), 1);
    let hit = &resp.results[0];
    assert_eq!(hit.title, "Neural nets");
    assert_eq!(hit.url, "https://example.org/0");
    assert_eq!(hit.snippet, "<em>neural</em> <em>networks</em> learn");
}

#[test]
fn syntax_errors_are_reported_not_raised() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &three_docs());
    let engine = SearchEngine::open(dir.path(), SearchConfig::default()).unwrap();

    let resp = engine.search("python AND (learning OR neural", 10);
    assert!(resp.results.is_empty());
    assert!(resp.error.as_deref().unwrap().contains("parenthesis"));

    let json: Value = serde_json::to_value(&resp).unwrap();
    assert!(json["error"].is_string());
    let ok: Value = serde_json::to_value(engine.search("neural", 10)).unwrap();
    assert!(ok.get("error").is_none());
    assert_eq!(ok["results"].as_array().unwrap().len(), 2);
}

#[test]
fn top_k_is_capped_at_one_hundred() {
    let dir = tempdir().unwrap();
    let corpus: Vec<_> = (0..150)
        .map(|i| SourceDocument { title: format!("d{i}"), url: String::new(), text: format!("neural item{i}") })
        .collect();
    build_tiny_index(dir.path(), &corpus);
    let engine = SearchEngine::open(dir.path(), SearchConfig::default()).unwrap();

    let resp = engine.search("neural", 0);
    assert!(resp.results.is_empty());
    assert_eq!(resp.total_hits, 150);
    assert_eq!(engine.search("neural", 7).results.len(), 7);
    assert_eq!(engine.search("neural", 150).results.len(), 100);
}

#[test]
fn reload_swaps_in_a_rebuilt_index() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    build_tiny_index(first.path(), &three_docs());
    build_tiny_index(second.path(), &docs(&[("Garden", "tomato gardening tips")]));
    let engine = SearchEngine::open(first.path(), SearchConfig::default()).unwrap();

    let before = engine.snapshot();
    assert!(engine.search("tomato", 10).results.is_empty());
    engine.reload(second.path()).unwrap();
    let resp = engine.search("tomato", 10);
    assert_eq!(resp.results.len(), 1);
    assert_eq!(resp.results[0].title, "Garden");
    assert_eq!(before.index().doc_count, 3);

    assert!(engine.reload(first.path().join("missing")).is_err());
    assert_eq!(engine.search("tomato", 10).results.len(), 1);
}

#[test]
fn swap_replaces_the_snapshot_for_new_queries() {
    let first = three_docs();
    let second = docs(&[("Gardening", "tomato gardening tips"), ("Neural", "neural gardening")]);
    let config = SearchConfig::default();
    let snap = |corpus: &[SourceDocument]| {
        let texts: TextStore = corpus.iter().enumerate().map(|(i, d)| (i as u32, d.text.clone())).collect();
        Snapshot::new(build(corpus), texts, config.bm25).unwrap()
    };
    let engine = SearchEngine::new(snap(&first), config.clone());

    let held = engine.snapshot();
    assert!(engine.search("tomato", 10).results.is_empty());

    let old = engine.swap(snap(&second));
    assert!(Arc::ptr_eq(&old, &held));
    assert_eq!(engine.search("tomato", 10).results.len(), 1);
    // the held snapshot is untouched
    assert_eq!(held.index().doc_count, 3);
}

#[test]
fn empty_index_is_a_startup_error() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &[]);
    assert!(SearchEngine::open(dir.path(), SearchConfig::default()).is_err());
}

#[test]
fn concurrent_searches() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &three_docs());
    let engine = Arc::new(SearchEngine::open(dir.path(), SearchConfig::default()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.search("neural AND deep", 5).results.len())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 1);
    }
}
