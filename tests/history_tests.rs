/// Persisted history tests.
///
/// Covers eviction at the 50-entry cap, survival across reopen, tolerance of
/// damaged or legacy files, and the prefix stored for long texts.
use sentiscope::api::Sentiment;
use sentiscope::history::{DEFAULT_CAPACITY, HistoryEntry, HistoryStore};

fn history_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("nested").join("history.json")
}

#[test]
fn sixty_appends_keep_newest_fifty() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::open(history_path(&dir), DEFAULT_CAPACITY);
    for n in 0..60 {
        store
            .record(&format!("text {n}"), Sentiment::Positive, 0.9)
            .unwrap();
    }

    assert_eq!(store.len(), 50);
    assert_eq!(store.entries()[0].text, "text 59");
    assert_eq!(store.entries()[49].text, "text 10");

    let reopened = HistoryStore::open(history_path(&dir), DEFAULT_CAPACITY);
    assert_eq!(reopened.entries(), store.entries());
}

#[test]
fn file_is_a_json_array_of_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = history_path(&dir);
    let mut store = HistoryStore::open(path.clone(), DEFAULT_CAPACITY);
    store.record("I hate waiting", Sentiment::Negative, 0.75).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let records = raw.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["text"], "I hate waiting");
    assert_eq!(records[0]["sentiment"], "negative");
    assert_eq!(records[0]["confidence"], 0.75);
    assert!(records[0]["timestamp"].is_string());
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn long_texts_are_stored_as_prefix() {
    let mut store = HistoryStore::in_memory(DEFAULT_CAPACITY);
    let long = "é".repeat(150);
    store.record(&long, Sentiment::Neutral, 0.5).unwrap();
    assert_eq!(store.entries()[0].text.chars().count(), 100);

    let mut short = HistoryStore::in_memory(DEFAULT_CAPACITY).with_prefix_chars(10);
    short.record("abcdefghijklmnop", Sentiment::Neutral, 0.5).unwrap();
    assert_eq!(short.entries()[0].text, "abcdefghij");
}

#[test]
fn damaged_file_starts_empty_and_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut store = HistoryStore::open(path.clone(), DEFAULT_CAPACITY);
    assert!(store.is_empty());
    store.record("fresh", Sentiment::Positive, 0.6).unwrap();

    let reopened = HistoryStore::open(path, DEFAULT_CAPACITY);
    assert_eq!(reopened.len(), 1);
}

#[test]
fn records_without_confidence_still_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(
        &path,
        r#"[{"text": "old", "sentiment": "neutral", "timestamp": "2025-01-01T00:00:00Z"}]"#,
    )
    .unwrap();

    let store = HistoryStore::open(path, DEFAULT_CAPACITY);
    assert_eq!(
        store.entries(),
        [HistoryEntry {
            text: "old".into(),
            sentiment: Sentiment::Neutral,
            confidence: 0.0,
            timestamp: "2025-01-01T00:00:00Z".into(),
        }]
    );
}

#[test]
fn oversized_file_is_trimmed_to_capacity_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    let mut big = HistoryStore::open(path.clone(), 10);
    for n in 0..10 {
        big.record(&format!("t{n}"), Sentiment::Neutral, 0.5).unwrap();
    }

    let small = HistoryStore::open(path, 3);
    let texts: Vec<&str> = small.entries().iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, ["t9", "t8", "t7"]);
}

#[test]
fn summary_reflects_stored_values() {
    let mut store = HistoryStore::in_memory(DEFAULT_CAPACITY);
    store.record("a", Sentiment::Positive, 1.0).unwrap();
    store.record("b", Sentiment::Positive, 0.5).unwrap();
    store.record("c", Sentiment::Negative, 0.0).unwrap();

    let summary = store.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.count(Sentiment::Positive), 2);
    assert!((summary.average_confidence - 0.5).abs() < 1e-9);
    assert!((summary.pct(Sentiment::Negative) - 100.0 / 3.0).abs() < 1e-9);
}
