use std::io::Cursor;
use std::sync::mpsc;

use super::*;
use xdisc_core::ExtractionEvent;
use xdisc_microsoft::GdfImage;
use xdisc_microsoft::fixtures::{GdfDir, build_xex, sample_execution_info};

fn disc_with(files: &[(&str, &[u8])]) -> GdfImage<Cursor<Vec<u8>>> {
    let dir = files
        .iter()
        .fold(GdfDir::new(), |dir, (name, data)| dir.file(name, data));
    GdfImage::from_reader(Cursor::new(dir.build())).unwrap()
}

fn run(
    disc: &mut GdfImage<Cursor<Vec<u8>>>,
    request: &ExtractionRequest,
) -> (Result<Metadata, ExtractionError>, Vec<ExtractionEvent>) {
    let (tx, rx) = mpsc::channel();
    let result = extract_xbox360(disc, request, &Reporter::new(&tx));
    drop(tx);
    (result, rx.iter().collect())
}

fn progress_messages(events: &[ExtractionEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            ExtractionEvent::Progress(m) => Some(m.as_str()),
            _ => None,
        })
        .collect()
}

fn notices(events: &[ExtractionEvent]) -> Vec<&Notice> {
    events
        .iter()
        .filter_map(|e| match e {
            ExtractionEvent::Notice(n) => Some(n),
            _ => None,
        })
        .collect()
}

/// Write an executable shell script that prints `stdout` verbatim.
#[cfg(unix)]
fn fake_tool(dir: &std::path::Path, stdout: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let tool = dir.join("xextool");
    let script = format!("#!/bin/sh\ncat <<'XDISC_EOF'\n{stdout}\nXDISC_EOF\n");
    std::fs::write(&tool, script).unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
    tool
}

#[cfg(unix)]
fn icon_base64() -> (String, Vec<u8>) {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let icon = image::RgbaImage::from_pixel(8, 8, image::Rgba([200, 100, 50, 255]));
    let mut png = Vec::new();
    icon.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    (STANDARD.encode(&png), png)
}

#[test]
fn test_seed_metadata() {
    let metadata = seed_metadata(&sample_execution_info());
    assert_eq!(metadata.platform, Platform::Xbox360);
    assert_eq!(metadata.name, "");
    assert_eq!(metadata.title_id, "4D53082F");
    assert_eq!(metadata.media_id.as_deref(), Some("1A2B3C4D"));
    assert_eq!(metadata.platform_tag.as_deref(), Some("0"));
    assert_eq!(metadata.executable_type.as_deref(), Some("0"));
    assert_eq!(metadata.disc_number, "1");
    assert_eq!(metadata.disc_count, "2");
    assert_eq!(metadata.content_hash, None);
    assert!(metadata.thumbnail.is_none());
}

#[test]
fn test_missing_tool_is_terminal() {
    let work = tempfile::tempdir().unwrap();
    let xex = build_xex(Some(&sample_execution_info()));
    let mut disc = disc_with(&[("default.xex", xex.as_slice())]);
    let tool = work.path().join("missing-xextool");
    let request = ExtractionRequest::new("unused.iso", work.path().join("work"), &tool);

    let (result, events) = run(&mut disc, &request);
    match result {
        Err(ExtractionError::ToolNotFound(path)) => assert_eq!(path, tool),
        other => panic!("expected ToolNotFound, got {other:?}"),
    }
    assert_eq!(
        progress_messages(&events),
        [
            "Locating default.xex...",
            "Extracting default.xex...",
            "Found! Reading default.xex...",
            "Extracting resources..."
        ]
    );

    // The binary is persisted before the tool is looked up
    let persisted = std::fs::read(work.path().join("work").join(XEX_FILE_NAME)).unwrap();
    assert_eq!(persisted, xex);
}

#[test]
fn test_missing_xex_on_disc() {
    let work = tempfile::tempdir().unwrap();
    let mut disc = disc_with(&[("default.xbe", b"XBEH".as_slice())]);
    let request = ExtractionRequest::new("unused.iso", work.path(), work.path().join("xextool"));

    let (result, _) = run(&mut disc, &request);
    assert!(matches!(result, Err(ExtractionError::MissingBinary(f)) if f == "default.xex"));
}

#[test]
fn test_empty_xex() {
    let work = tempfile::tempdir().unwrap();
    let mut disc = disc_with(&[("default.xex", b"".as_slice())]);
    let request = ExtractionRequest::new("unused.iso", work.path(), work.path().join("xextool"));

    let (result, _) = run(&mut disc, &request);
    assert!(matches!(result, Err(ExtractionError::MissingBinary(_))));
}

#[test]
fn test_invalid_xex() {
    let work = tempfile::tempdir().unwrap();
    let mut disc = disc_with(&[("default.xex", b"this is not a xex header".as_slice())]);
    let request = ExtractionRequest::new("unused.iso", work.path(), work.path().join("xextool"));

    let (result, _) = run(&mut disc, &request);
    assert!(matches!(result, Err(ExtractionError::InvalidBinary(f)) if f == "Default.xex"));
}

#[cfg(unix)]
#[test]
fn test_full_extraction_with_tool() {
    let work = tempfile::tempdir().unwrap();
    let (icon, png) = icon_base64();
    let tool = fake_tool(
        work.path(),
        &format!(
            "xextool v6.3\n<XexInfo>\n<GameName>Caf&#-23; Racer</GameName>\n<GameIcon>{icon}</GameIcon>\n</XexInfo>"
        ),
    );
    let xex = build_xex(Some(&sample_execution_info()));
    let mut disc = disc_with(&[("default.xex", xex.as_slice())]);
    let request = ExtractionRequest::new("unused.iso", work.path().join("work"), tool);

    let (result, events) = run(&mut disc, &request);
    let metadata = result.unwrap();

    assert_eq!(metadata.name, "Caf\u{e9} Racer");
    assert_eq!(metadata.title_id, "4D53082F");
    assert_eq!(metadata.media_id.as_deref(), Some("1A2B3C4D"));
    assert_eq!(metadata.disc_count, "2");
    let thumbnail = metadata.thumbnail.unwrap();
    assert_eq!(thumbnail.bytes, png);
    assert_eq!(thumbnail.image.dimensions(), (8, 8));

    assert!(notices(&events).is_empty());
    assert_eq!(
        progress_messages(&events)[3..],
        [
            "Extracting resources...",
            "Parsing xextool output...",
            "Extracting name...",
            "Extracting thumbnail..."
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_unparsable_output_continues_with_placeholder() {
    let work = tempfile::tempdir().unwrap();
    let tool = fake_tool(work.path(), "xextool v6.3\nerror: unsupported file");
    let xex = build_xex(Some(&sample_execution_info()));
    let mut disc = disc_with(&[("default.xex", xex.as_slice())]);
    let request = ExtractionRequest::new("unused.iso", work.path(), tool);

    let (result, events) = run(&mut disc, &request);
    let metadata = result.unwrap();
    assert_eq!(metadata.name, NAME_PLACEHOLDER);
    assert!(metadata.thumbnail.is_none());

    let notices = notices(&events);
    assert_eq!(notices.len(), 3);
    assert!(matches!(notices[0], Notice::ToolOutputParse(_)));
    assert_eq!(notices[1], &Notice::NameLookup);
    assert!(matches!(notices[2], Notice::IconLookup(_)));
}

#[cfg(unix)]
#[test]
fn test_bad_icon_keeps_name() {
    let work = tempfile::tempdir().unwrap();
    let tool = fake_tool(
        work.path(),
        "<XexInfo><GameName>Named</GameName><GameIcon>%%%</GameIcon></XexInfo>",
    );
    let xex = build_xex(Some(&sample_execution_info()));
    let mut disc = disc_with(&[("default.xex", xex.as_slice())]);
    let request = ExtractionRequest::new("unused.iso", work.path(), tool);

    let (result, events) = run(&mut disc, &request);
    let metadata = result.unwrap();
    assert_eq!(metadata.name, "Named");
    assert!(metadata.thumbnail.is_none());
    assert!(matches!(notices(&events).as_slice(), [Notice::IconLookup(_)]));
}

#[cfg(unix)]
#[test]
fn test_missing_execution_info_fails_after_tool() {
    let work = tempfile::tempdir().unwrap();
    let tool = fake_tool(work.path(), "<XexInfo><GameName>Named</GameName></XexInfo>");
    let xex = build_xex(None);
    let mut disc = disc_with(&[("default.xex", xex.as_slice())]);
    let request = ExtractionRequest::new("unused.iso", work.path(), tool);

    let (result, events) = run(&mut disc, &request);
    assert!(matches!(result, Err(ExtractionError::MissingExecutionInfo)));
    let progress = progress_messages(&events);
    assert!(progress.contains(&"Extracting resources..."));
    assert!(!progress.contains(&"Extracting name..."));
}
