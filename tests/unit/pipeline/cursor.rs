use super::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!(
            "pixelmap_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
        .join("cursor.json")
}

#[test]
fn fresh_cursor_reads_zero() {
    let cursor = IncrementalCursor::new(MemoryCursorStore::new(), "k");
    assert_eq!(cursor.read().unwrap(), 0);
}

#[test]
fn advance_is_monotonic() {
    let store = MemoryCursorStore::new();
    let mut cursor = IncrementalCursor::new(store.clone(), "k");
    cursor.advance(3).unwrap();
    cursor.advance(3).unwrap();
    assert_eq!(store.set_count(), 1);
    cursor.advance(11).unwrap();
    assert_eq!(cursor.read().unwrap(), 11);

    let err = cursor.advance(10).unwrap_err();
    assert!(matches!(
        err,
        PixelmapError::CursorRegression {
            current: 11,
            requested: 10
        }
    ));
    assert_eq!(cursor.read().unwrap(), 11);
}

#[test]
fn keys_are_independent() {
    let store = MemoryCursorStore::new();
    let mut a = IncrementalCursor::new(store.clone(), "a");
    let b = IncrementalCursor::new(store, "b");
    a.advance(5).unwrap();
    assert_eq!(b.read().unwrap(), 0);
}

#[test]
fn failed_set_leaves_value_untouched() {
    let store = MemoryCursorStore::new();
    let mut cursor = IncrementalCursor::new(store.clone(), "k");
    cursor.advance(1).unwrap();
    store.fail_after(0);
    assert!(cursor.advance(2).unwrap_err().is_transient());
    assert_eq!(cursor.read().unwrap(), 1);
    store.heal();
    cursor.advance(2).unwrap();
    assert_eq!(cursor.read().unwrap(), 2);
}

#[test]
fn file_store_survives_reopen() {
    let path = temp_path("file_cursor");
    {
        let mut cursor = IncrementalCursor::new(FileCursorStore::new(&path), "renderer");
        assert_eq!(cursor.read().unwrap(), 0);
        cursor.advance(42).unwrap();
    }
    let reopened = IncrementalCursor::new(FileCursorStore::new(&path), "renderer");
    assert_eq!(reopened.read().unwrap(), 42);

    let raw: BTreeMap<String, u64> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw.get("renderer"), Some(&42));

    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[test]
fn file_store_keeps_other_keys() {
    let path = temp_path("file_cursor_keys");
    let mut store = FileCursorStore::new(&path);
    store.set("a", 1).unwrap();
    store.set("b", 2).unwrap();
    store.set("a", 3).unwrap();
    assert_eq!(store.get("a").unwrap(), 3);
    assert_eq!(store.get("b").unwrap(), 2);
    assert_eq!(store.get("c").unwrap(), 0);

    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[test]
fn corrupt_file_store_is_serde_error() {
    let path = temp_path("file_cursor_corrupt");
    ensure_parent_dir(&path).unwrap();
    std::fs::write(&path, "[1, 2").unwrap();
    let err = FileCursorStore::new(&path).get("k").unwrap_err();
    assert!(matches!(err, PixelmapError::Serde(_)));

    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}
