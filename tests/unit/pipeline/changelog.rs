use super::*;

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "pixelmap_{name}_{}_{}.jsonl",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn ev(seq: u64, tile: u32, code: &str, block: u64) -> ChangeEvent {
    ChangeEvent {
        sequence_index: seq,
        tile_id: TileId(tile),
        tile_code: TileCode::new(code),
        block_number: block,
    }
}

#[test]
fn event_json_uses_camel_case_fields() {
    let json = serde_json::to_value(ev(10, 5, "f00", 100)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "sequenceIndex": 10,
            "tileId": 5,
            "tileCode": "f00",
            "blockNumber": 100
        })
    );
}

#[test]
fn memory_log_is_shared_and_ordered() {
    let log = MemoryChangeLog::new();
    let writer = log.clone();
    writer.append(ev(1, 0, "", 1)).unwrap();
    writer.append(ev(3, 0, "", 1)).unwrap();
    assert!(writer.append(ev(3, 1, "", 2)).is_err());
    assert!(writer.append(ev(2, 1, "", 2)).is_err());

    let seqs: Vec<_> = log.list().unwrap().iter().map(|e| e.sequence_index).collect();
    assert_eq!(seqs, vec![1, 3]);
    assert_eq!(log.len(), 2);
}

#[test]
fn jsonl_log_reads_events_and_skips_blank_lines() {
    let path = temp_file("jsonl_ok");
    let body = [
        serde_json::to_string(&ev(0, 1, "abc", 7)).unwrap(),
        String::new(),
        serde_json::to_string(&ev(4, 2, "", 8)).unwrap(),
    ]
    .join("\n");
    std::fs::write(&path, body).unwrap();

    let events = JsonlChangeLog::new(&path).list().unwrap();
    assert_eq!(events, vec![ev(0, 1, "abc", 7), ev(4, 2, "", 8)]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn jsonl_log_rejects_out_of_order_and_bad_lines() {
    let path = temp_file("jsonl_bad");
    let body = [
        serde_json::to_string(&ev(5, 1, "abc", 7)).unwrap(),
        serde_json::to_string(&ev(5, 2, "abc", 7)).unwrap(),
    ]
    .join("\n");
    std::fs::write(&path, body).unwrap();
    assert!(matches!(
        JsonlChangeLog::new(&path).list(),
        Err(PixelmapError::Validation(_))
    ));

    std::fs::write(&path, "{ not json").unwrap();
    let err = JsonlChangeLog::new(&path).list().unwrap_err();
    assert!(err.to_string().contains("line 1"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_jsonl_log_is_transient_io() {
    let err = JsonlChangeLog::new(temp_file("jsonl_missing"))
        .list()
        .unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn max_sequence_index_is_rejected() {
    let log = MemoryChangeLog::new();
    assert!(matches!(
        log.append(ev(u64::MAX, 0, "abc", 1)),
        Err(PixelmapError::Validation(_))
    ));
    assert!(log.is_empty());

    let path = temp_file("jsonl_max_seq");
    std::fs::write(&path, serde_json::to_string(&ev(u64::MAX, 0, "abc", 1)).unwrap()).unwrap();
    assert!(matches!(
        JsonlChangeLog::new(&path).list(),
        Err(PixelmapError::Validation(_))
    ));
    std::fs::remove_file(&path).ok();
}
