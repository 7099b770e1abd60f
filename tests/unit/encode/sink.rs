use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "pixelmap_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn red_2x2() -> DynamicImage {
    DynamicImage::ImageRgb8(image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0])))
}

#[test]
fn fs_sink_writes_png_and_creates_directories() {
    let root = temp_dir("fs_sink_writes");
    let mut sink = FsImageSink::new(&root);
    sink.write(Path::new("5/100.png"), &red_2x2()).unwrap();

    let back = image::open(root.join("5/100.png")).unwrap().to_rgb8();
    assert_eq!(back.dimensions(), (2, 2));
    assert!(back.pixels().all(|p| p.0 == [255, 0, 0]));

    let leftovers: Vec<_> = std::fs::read_dir(root.join("5"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1, "temporary file left behind: {leftovers:?}");

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn fs_sink_overwrites_with_identical_bytes() {
    let root = temp_dir("fs_sink_overwrite");
    let mut sink = FsImageSink::new(&root);
    let rel = Path::new("fullmap/fullMap.png");

    sink.write(rel, &red_2x2()).unwrap();
    let first = std::fs::read(root.join(rel)).unwrap();
    sink.write(rel, &red_2x2()).unwrap();
    let second = std::fs::read(root.join(rel)).unwrap();
    assert_eq!(first, second);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn fs_sink_rejects_absolute_paths() {
    let root = temp_dir("fs_sink_abs");
    let mut sink = FsImageSink::new(&root);
    let abs = std::env::temp_dir().join("x.png");
    assert!(matches!(
        sink.write(&abs, &red_2x2()),
        Err(PixelmapError::Validation(_))
    ));
}

#[test]
fn fs_sink_failure_is_io() {
    let root = temp_dir("fs_sink_fail");
    std::fs::create_dir_all(&root).unwrap();
    // A regular file where a directory is expected.
    std::fs::write(root.join("blocked"), b"x").unwrap();
    let mut sink = FsImageSink::new(&root);
    let err = sink
        .write(Path::new("blocked/latest.png"), &red_2x2())
        .unwrap_err();
    assert!(err.is_transient());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn memory_sink_records_and_injects_failures() {
    let handle = MemorySink::new();
    let mut sink = handle.clone();
    sink.write(Path::new("a.png"), &red_2x2()).unwrap();
    handle.fail_after(1);
    sink.write(Path::new("b.png"), &red_2x2()).unwrap();
    assert!(sink.write(Path::new("c.png"), &red_2x2()).is_err());
    assert_eq!(handle.writes().len(), 2);
    assert!(handle.get("c.png").is_none());

    handle.heal();
    sink.write(Path::new("c.png"), &red_2x2()).unwrap();
    assert_eq!(handle.paths().len(), 3);
    assert_eq!(handle.get("a.png").unwrap().to_rgb8().dimensions(), (2, 2));
}

#[test]
fn parent_dir_sync_accepts_nested_and_bare_paths() {
    let root = temp_dir("sync_parent");
    let mut sink = FsImageSink::new(&root);
    sink.write(Path::new("fullmap/fullMap.png"), &red_2x2()).unwrap();

    sync_parent_dir(&root.join("fullmap/fullMap.png")).unwrap();
    sync_parent_dir(Path::new("fullMap.png")).unwrap();
    assert!(sync_parent_dir(&root.join("missing/fullMap.png")).is_err() || cfg!(not(unix)));

    std::fs::remove_dir_all(&root).ok();
}
