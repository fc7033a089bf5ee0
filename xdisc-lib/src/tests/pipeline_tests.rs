use super::*;
use xdisc_microsoft::fixtures::{
    GdfDir, build_dxt1_xpr, build_xbe, build_xex, sample_execution_info,
};
use xdisc_microsoft::xbe::TITLE_IMAGE_SECTION;

fn write_iso(dir: &Path, image: &[u8]) -> PathBuf {
    let path = dir.join("game.iso");
    std::fs::write(&path, image).unwrap();
    path
}

fn run_collect(request: &ExtractionRequest) -> Vec<ExtractionEvent> {
    let (tx, rx) = mpsc::channel();
    run_extraction(request, &tx);
    drop(tx);
    rx.iter().collect()
}

fn assert_single_terminal(events: &[ExtractionEvent]) {
    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "events: {events:?}");
    assert!(events.last().unwrap().is_terminal());
}

fn xbox_image() -> Vec<u8> {
    let xbe = build_xbe(
        "Pipeline Game",
        0x4D53_0001,
        0,
        &[(TITLE_IMAGE_SECTION, build_dxt1_xpr(5, 0xFFFF))],
    );
    GdfDir::new().file("default.xbe", &xbe).build()
}

#[test]
fn test_xbox_image_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let iso = write_iso(dir.path(), &xbox_image());
    let request = ExtractionRequest::new(iso, dir.path().join("work"), dir.path().join("xextool"));

    let events = run_collect(&request);
    assert_single_terminal(&events);
    match events.last() {
        Some(ExtractionEvent::Completed(metadata)) => {
            assert_eq!(metadata.platform, Platform::Xbox);
            assert_eq!(metadata.name, "Pipeline Game");
            assert_eq!(metadata.title_id, "4D530001");
            assert!(metadata.thumbnail.is_some());
        }
        other => panic!("expected Completed, got {other:?}"),
    }
    // Xbox titles never touch the working directory
    assert!(!dir.path().join("work").exists());
}

#[test]
fn test_entry_binary_lookup_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let xbe = build_xbe("Upper", 1, 0, &[]);
    let image = GdfDir::new().file("DEFAULT.XBE", &xbe).build();
    let iso = write_iso(dir.path(), &image);
    let request = ExtractionRequest::new(iso, dir.path(), dir.path().join("xextool"));

    let events = run_collect(&request);
    assert!(matches!(events.last(), Some(ExtractionEvent::Completed(_))));
}

#[test]
fn test_no_entry_binary() {
    let dir = tempfile::tempdir().unwrap();
    let image = GdfDir::new().file("readme.txt", b"hello").build();
    let iso = write_iso(dir.path(), &image);
    let request = ExtractionRequest::new(iso, dir.path(), dir.path().join("xextool"));

    let events = run_collect(&request);
    assert_single_terminal(&events);
    assert!(matches!(
        events.last(),
        Some(ExtractionEvent::Failed(ExtractionError::NoEntryBinary))
    ));
}

#[test]
fn test_dual_platform_prefers_xbox360() {
    let dir = tempfile::tempdir().unwrap();
    let xex = build_xex(Some(&sample_execution_info()));
    let xbe = build_xbe("Legacy", 1, 0, &[]);
    let image = GdfDir::new()
        .file("default.xbe", &xbe)
        .file("default.xex", &xex)
        .build();
    let iso = write_iso(dir.path(), &image);
    // No tool available, so the Xbox 360 path stops at the tool step
    let request = ExtractionRequest::new(iso, dir.path().join("work"), dir.path().join("nope"));

    let events = run_collect(&request);
    assert_single_terminal(&events);

    let dual = events
        .iter()
        .filter(|e| matches!(e, ExtractionEvent::Notice(Notice::DualPlatform)))
        .count();
    assert_eq!(dual, 1);
    assert!(matches!(
        events.last(),
        Some(ExtractionEvent::Failed(ExtractionError::ToolNotFound(_)))
    ));
    assert!(events.iter().any(
        |e| matches!(e, ExtractionEvent::Progress(m) if m == "Locating default.xex...")
    ));
}

#[test]
fn test_missing_iso_is_open_failure() {
    let dir = tempfile::tempdir().unwrap();
    let request = ExtractionRequest::new(
        dir.path().join("missing.iso"),
        dir.path(),
        dir.path().join("xextool"),
    );

    let events = run_collect(&request);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        ExtractionEvent::Failed(ExtractionError::OpenFailed(_))
    ));
}

#[test]
fn test_non_gdf_file_is_unhandled_open() {
    let dir = tempfile::tempdir().unwrap();
    let iso = write_iso(dir.path(), &vec![0u8; 64 * 2048]);
    let request = ExtractionRequest::new(iso, dir.path(), dir.path().join("xextool"));

    let events = run_collect(&request);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        ExtractionEvent::Failed(ExtractionError::OpenUnhandled(_))
    ));
}

#[test]
fn test_spawned_run_delivers_events_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let iso = write_iso(dir.path(), &xbox_image());
    let request = ExtractionRequest::new(iso, dir.path(), dir.path().join("xextool"));

    let (handle, rx) = spawn_extraction(request).unwrap();
    let events: Vec<ExtractionEvent> = rx.iter().collect();
    handle.join().unwrap();

    assert_single_terminal(&events);
    assert!(matches!(
        events.first(),
        Some(ExtractionEvent::Progress(m)) if m == "Locating default.xbe..."
    ));
    assert!(matches!(events.last(), Some(ExtractionEvent::Completed(_))));
}

#[test]
fn test_dropped_receiver_does_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    let iso = write_iso(dir.path(), &xbox_image());
    let request = ExtractionRequest::new(iso, dir.path(), dir.path().join("xextool"));

    let (handle, rx) = spawn_extraction(request).unwrap();
    drop(rx);
    assert!(handle.join().is_ok());
}

#[test]
fn test_panicking_run_ends_with_unhandled() {
    let (tx, rx) = mpsc::channel();
    run_guarded(&tx, |tx| {
        tx.send(ExtractionEvent::Progress("Locating default.xbe...".into()))
            .unwrap();
        panic!("section table overflow");
    });
    drop(tx);
    let events: Vec<ExtractionEvent> = rx.iter().collect();

    assert_eq!(events.len(), 2);
    assert_single_terminal(&events);
    match events.last() {
        Some(ExtractionEvent::Failed(ExtractionError::Unhandled(message))) => {
            assert_eq!(message, "section table overflow");
        }
        other => panic!("expected an unhandled failure, got {other:?}"),
    }
}

#[test]
fn test_completed_run_is_not_wrapped() {
    let dir = tempfile::tempdir().unwrap();
    let iso = write_iso(dir.path(), &xbox_image());
    let request = ExtractionRequest::new(iso, dir.path(), dir.path().join("xextool"));

    let (tx, rx) = mpsc::channel();
    run_guarded(&tx, |tx| run_extraction(&request, tx));
    drop(tx);
    let events: Vec<ExtractionEvent> = rx.iter().collect();

    assert_single_terminal(&events);
    assert!(matches!(events.last(), Some(ExtractionEvent::Completed(_))));
}

#[test]
fn test_panic_message() {
    let boxed: Box<dyn Any + Send> = Box::new("static message");
    assert_eq!(panic_message(&*boxed), "static message");
    let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
    assert_eq!(panic_message(&*boxed), "owned message");
    let boxed: Box<dyn Any + Send> = Box::new(42u32);
    assert_eq!(panic_message(&*boxed), "unknown panic");
}
