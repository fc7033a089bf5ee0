use super::*;
use crate::fixtures::GdfDir;
use std::io::Cursor;

/// Byte offset of the root directory table in a partition-at-zero image.
fn root_table_offset(image: &[u8]) -> usize {
    let descriptor = 32 * 2048;
    let sector = u32::from_le_bytes(
        image[descriptor + 0x14..descriptor + 0x18]
            .try_into()
            .unwrap(),
    );
    sector as usize * 2048
}

fn open(image: Vec<u8>) -> GdfImage<Cursor<Vec<u8>>> {
    GdfImage::from_reader(Cursor::new(image)).unwrap()
}

#[test]
fn finds_root_files_case_insensitively() {
    let image = GdfDir::new()
        .file("default.xbe", b"XBEH-payload")
        .file("Media.bin", &[7u8; 5000])
        .build();
    let mut gdf = open(image);

    assert_eq!(gdf.partition_offset(), 0);
    assert!(gdf.exists("default.xbe"));
    assert!(gdf.exists("DEFAULT.XBE"));
    assert!(!gdf.exists("default.xex"));
    assert_eq!(gdf.read_file("default.xbe").unwrap(), b"XBEH-payload");
    assert_eq!(gdf.read_file("media.bin").unwrap(), vec![7u8; 5000]);
}

#[test]
fn resolves_nested_paths() {
    let image = GdfDir::new()
        .dir("media", GdfDir::new().file("icon.png", b"png"))
        .file("default.xex", b"XEX2")
        .build();
    let mut gdf = open(image);

    assert!(gdf.exists("media/icon.png"));
    assert!(gdf.exists("\\media\\ICON.PNG"));
    assert!(!gdf.exists("default.xex/icon.png"));
    assert_eq!(gdf.read_file("media/icon.png").unwrap(), b"png");
    assert!(matches!(
        gdf.read_file("media"),
        Err(AnalysisError::InvalidFormat(_))
    ));
}

#[test]
fn missing_file_is_not_found() {
    let mut gdf = open(GdfDir::new().file("a.txt", b"a").build());
    assert!(matches!(
        gdf.read_file("default.xex"),
        Err(AnalysisError::NotFound(_))
    ));
    assert!(!gdf.exists(""));
}

#[test]
fn empty_root_has_no_entries() {
    let mut gdf = open(GdfDir::new().build());
    assert!(gdf.root_entries().unwrap().is_empty());
    assert!(!gdf.exists("default.xbe"));
}

#[test]
fn root_entries_lists_everything() {
    let mut gdf = open(
        GdfDir::new()
            .file("default.xbe", b"1")
            .file("default.xex", b"2")
            .build(),
    );
    let mut names: Vec<String> = gdf.root_entries().unwrap().into_iter().map(|e| e.name).collect();
    names.sort();
    assert_eq!(names, vec!["default.xbe", "default.xex"]);
}

#[test]
fn rejects_image_without_volume_descriptor() {
    let result = GdfImage::from_reader(Cursor::new(vec![0u8; 40 * 2048]));
    assert!(matches!(result, Err(AnalysisError::InvalidFormat(_))));
}

#[test]
fn rejects_tiny_image() {
    let result = GdfImage::from_reader(Cursor::new(b"not an iso".to_vec()));
    assert!(matches!(result, Err(AnalysisError::InvalidFormat(_))));
}

#[test]
fn cyclic_directory_table_terminates() {
    let mut image = GdfDir::new().file("a.bin", b"a").file("c.bin", b"c").build();
    // Second entry sits at byte 20; point its right child back at itself
    let second = root_table_offset(&image) + 20;
    image[second + 2..second + 4].copy_from_slice(&(20u16 / 4).to_le_bytes());
    let mut gdf = open(image);
    assert!(gdf.exists("c.bin"));
    assert!(!gdf.exists("zzz"));
}

#[test]
fn extent_past_end_is_corrupted() {
    let mut image = GdfDir::new().file("a.bin", b"abc").build();
    let entry = root_table_offset(&image);
    image[entry + 8..entry + 12].copy_from_slice(&u32::MAX.to_le_bytes());
    let mut gdf = open(image);
    assert!(matches!(
        gdf.read_file("a.bin"),
        Err(AnalysisError::CorruptedHeader(_))
    ));
}

#[test]
fn truncated_name_entry_is_skipped() {
    let mut image = GdfDir::new().file("a.bin", b"abc").build();
    let entry = root_table_offset(&image);
    image[entry + 13] = 0xFF;
    // Shrink the root table so the name overruns it
    image[32 * 2048 + 0x18..32 * 2048 + 0x1C].copy_from_slice(&20u32.to_le_bytes());
    let mut gdf = open(image);
    assert!(matches!(gdf.find("a.bin"), Ok(None)));
    assert!(!gdf.exists("a.bin"));
}

/// Directory table entry with explicit child links and name length.
fn raw_entry(left: u16, right: u16, sector: u32, name_len: u8, name: &[u8]) -> Vec<u8> {
    let mut entry = Vec::new();
    entry.extend_from_slice(&left.to_le_bytes());
    entry.extend_from_slice(&right.to_le_bytes());
    entry.extend_from_slice(&sector.to_le_bytes());
    entry.extend_from_slice(&3u32.to_le_bytes());
    entry.push(0);
    entry.push(name_len);
    entry.extend_from_slice(name);
    while entry.len() % 4 != 0 {
        entry.push(0xFF);
    }
    entry
}

#[test]
fn malformed_entry_does_not_hide_its_children() {
    // Root entry claims a 200-byte name; its right child is the real file
    let mut table = raw_entry(0, 4, 0, 200, &[]);
    assert_eq!(table.len(), 16);
    table.extend(raw_entry(0, 0, 40, 11, b"default.xbe"));

    let found = find_in_table(&table, "DEFAULT.XBE").unwrap();
    assert_eq!(found.name, "default.xbe");
    assert_eq!(found.sector, 40);

    let (entries, _) = walk_table(&table, |_| false);
    assert_eq!(entries.len(), 1);
}
