use jpstudy_core::cache::decode_item;
use jpstudy_core::db::{open_db, open_db_in_memory};
use jpstudy_core::{CacheError, FetchError, ItemCache, ItemRecord, ItemSource, SubjectId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// In-memory catalogue that counts every fetch.
struct CountingSource {
    records: HashMap<SubjectId, ItemRecord>,
    calls: Cell<usize>,
    failing: RefCell<HashMap<SubjectId, u16>>,
}

impl CountingSource {
    fn new(records: impl IntoIterator<Item = ItemRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id, r)).collect(),
            calls: Cell::new(0),
            failing: RefCell::new(HashMap::new()),
        }
    }

    fn fail_with(&self, id: SubjectId, status: u16) {
        self.failing.borrow_mut().insert(id, status);
    }
}

impl ItemSource for CountingSource {
    fn fetch(&self, id: SubjectId) -> Result<ItemRecord, FetchError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(status) = self.failing.borrow().get(&id) {
            return Err(FetchError::Status {
                id,
                status: *status,
            });
        }
        self.records
            .get(&id)
            .cloned()
            .ok_or(FetchError::Status { id, status: 404 })
    }
}

fn board() -> ItemRecord {
    let mut record = ItemRecord::new(2467, "kanji", 29)
        .with_characters("板")
        .with_components([11, 12]);
    record.meanings = vec!["Board".to_string()];
    record.readings = vec!["ばん".to_string(), "いた".to_string()];
    record
}

#[test]
fn second_get_is_served_from_cache() {
    let conn = open_db_in_memory().unwrap();
    let source = CountingSource::new([board()]);
    let cache = ItemCache::new(&conn, &source);

    let first = cache.get(2467).unwrap();
    let second = cache.get(2467).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.characters.as_deref(), Some("板"));
    assert_eq!(first.component_ids, vec![11, 12]);
    assert_eq!(source.calls.get(), 1);
    assert!(cache.exists(2467).unwrap());
}

#[test]
fn cached_items_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let source = CountingSource::new([board()]);
        ItemCache::new(&conn, &source).get(2467).unwrap();
        assert_eq!(source.calls.get(), 1);
    }

    let conn = open_db(&path).unwrap();
    let empty = CountingSource::new([]);
    let cache = ItemCache::new(&conn, &empty);
    let record = cache.get(2467).unwrap();

    assert_eq!(record, board());
    assert_eq!(empty.calls.get(), 0);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn first_writer_wins() {
    let conn = open_db_in_memory().unwrap();
    let source = CountingSource::new([]);
    let cache = ItemCache::new(&conn, &source);

    assert!(cache.insert(&board()).unwrap());
    let mut rival = board();
    rival.level = 30;
    assert!(!cache.insert(&rival).unwrap());

    assert_eq!(cache.get(2467).unwrap().level, 29);
    assert_eq!(source.calls.get(), 0);
}

#[test]
fn fetch_failure_is_surfaced_and_not_persisted() {
    let conn = open_db_in_memory().unwrap();
    let source = CountingSource::new([board()]);
    source.fail_with(2467, 503);
    let cache = ItemCache::new(&conn, &source);

    let err = cache.get(2467).unwrap_err();
    match err {
        CacheError::Fetch(FetchError::Status { id, status }) => {
            assert_eq!(id, 2467);
            assert_eq!(status, 503);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!cache.exists(2467).unwrap());
    assert!(cache.is_empty().unwrap());
}

#[test]
fn invalid_source_record_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let source = CountingSource::new([ItemRecord::new(5, "kanji", -3)]);
    let cache = ItemCache::new(&conn, &source);

    assert!(matches!(cache.get(5), Err(CacheError::Validation(_))));
    assert!(!cache.exists(5).unwrap());
}

#[test]
fn wire_payload_decodes_into_cacheable_record() {
    let body = serde_json::json!({
        "id": 440,
        "object": "kanji",
        "data": {
            "characters": "一",
            "level": 1,
            "meanings": [{"meaning": "One", "primary": true}],
            "readings": [{"reading": "いち"}],
            "component_subject_ids": [1],
            "reading_hint": "Count it."
        }
    })
    .to_string();

    let record = decode_item(440, &body).unwrap();
    let conn = open_db_in_memory().unwrap();
    let source = CountingSource::new([]);
    let cache = ItemCache::new(&conn, &source);
    cache.insert(&record).unwrap();

    let cached = cache.cached(440).unwrap().unwrap();
    assert_eq!(cached.meanings, vec!["One".to_string()]);
    assert_eq!(cached.readings, vec!["いち".to_string()]);
    assert_eq!(cached.reading_hint.as_deref(), Some("Count it."));
}
