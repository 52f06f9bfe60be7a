use search_core::persist::{from_json, load_all, save_all, to_json, IndexPaths, TextStore, FORMAT_VERSION};
use search_core::{build, PersistError, SourceDocument};
use serde_json::Value;
use tempfile::tempdir;

fn corpus() -> Vec<SourceDocument> {
    [
        ("Neural networks", "https://example.org/nn", "Neural networks learn representations from data."),
        ("Deep learning", "https://example.org/dl", "Deep neural learning stacks many layers."),
        ("Robotics", "https://example.org/robotics", "Robotics and control theory."),
        ("Blank", "", "   "),
    ]
    .iter()
    .map(|(title, url, text)| SourceDocument { title: title.to_string(), url: url.to_string(), text: text.to_string() })
    .collect()
}

fn texts(docs: &[SourceDocument]) -> TextStore {
    docs.iter().enumerate().map(|(i, d)| (i as u32, d.text.clone())).collect()
}

#[test]
fn json_roundtrip_preserves_everything() {
    let index = build(&corpus());
    let json = to_json(&index).unwrap();
    let back = from_json(&json).unwrap();
    assert_eq!(back, index);
    assert_eq!(back.avgdl.to_bits(), index.avgdl.to_bits());
}

#[test]
fn json_matches_the_documented_schema() {
    let index = build(&corpus());
    let v: Value = serde_json::from_str(&to_json(&index).unwrap()).unwrap();
    assert_eq!(v["doc_count"], 4);
    assert!(v["avgdl"].is_f64());
    assert_eq!(v["documents"]["0"]["title"], "Neural networks");
    assert_eq!(v["documents"]["3"]["length"], 0);
    let neural = &v["terms"]["neural"];
    assert_eq!(neural["df"], 2);
    assert_eq!(neural["postings"]["0"]["tf"], 1);
    assert_eq!(neural["postings"]["0"]["positions"], serde_json::json!([0]));
    assert_eq!(neural["postings"]["1"]["positions"], serde_json::json!([1]));
}

#[test]
fn disk_roundtrip() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let docs = corpus();
    let index = build(&docs);
    let meta = save_all(&paths, &index, &texts(&docs)).unwrap();
    assert_eq!(meta.version, FORMAT_VERSION);
    assert_eq!(meta.num_docs, 4);

    let (loaded, stored, meta_back) = load_all(&paths).unwrap();
    assert_eq!(loaded, index);
    assert_eq!(stored, texts(&docs));
    assert_eq!(meta_back, meta);
}

#[test]
fn corrupt_index_is_rejected() {
    let index = build(&corpus());
    let mut v: Value = serde_json::from_str(&to_json(&index).unwrap()).unwrap();
    v["terms"]["neural"]["postings"]["0"]["positions"] = serde_json::json!([0, 0]);
    let err = from_json(&v.to_string()).unwrap_err();
    assert!(matches!(err, PersistError::Corrupt(_)));
}

#[test]
fn missing_directory_reports_path() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path().join("nope"));
    match load_all(&paths) {
        Err(PersistError::Io { path, .. }) => assert!(path.ends_with("meta.json")),
        other => panic!("unexpected: {other:?}"),
    }
}
