use std::io::{Cursor, Write};

use provis_archive::{EscapePolicy, Error, ExtractOptions, extract_zip};
use zip::write::SimpleFileOptions;

fn build_zip(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    let mut cursor = writer.finish().unwrap();
    cursor.set_position(0);
    cursor
}

#[test]
fn extracts_files_and_skips_metadata() {
    let archive = build_zip(&[
        ("META-INF/", b""),
        ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
        ("liblwjgl.so", b"native"),
        ("sub/", b""),
        ("sub/libopenal.so", b"openal"),
    ]);
    let dir = tempfile::Builder::new().prefix("provis-test-zip-").tempdir().unwrap();
    let options = ExtractOptions::default().exclude_prefix("META-INF/").files_only(true);

    let report = extract_zip(archive, dir.path(), &options).unwrap();

    assert_eq!(report.entry_count, 2);
    assert_eq!(report.total_bytes, 12);
    assert!(dir.path().join("liblwjgl.so").exists());
    assert!(dir.path().join("sub/libopenal.so").exists());
    assert!(!dir.path().join("META-INF").exists());
}

#[test]
fn escaping_entry_is_dropped_when_skipping() {
    let outer = tempfile::tempdir().unwrap();
    let natives = outer.path().join("a/natives");
    let archive = build_zip(&[("../../evil.txt", b"pwned"), ("ok.dll", b"fine")]);
    let options = ExtractOptions::default().on_escape(EscapePolicy::Skip);

    let report = extract_zip(archive, &natives, &options).unwrap();

    assert_eq!(report.entry_count, 1);
    assert_eq!(report.rejected.len(), 1);
    assert!(natives.join("ok.dll").exists());
    assert!(!outer.path().join("evil.txt").exists());
    assert!(!outer.path().join("a/evil.txt").exists());
}

#[test]
fn escaping_entry_is_an_error_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let archive = build_zip(&[("../evil.txt", b"pwned")]);

    let result = extract_zip(archive, &dir.path().join("natives"), &ExtractOptions::default());

    assert!(matches!(result, Err(Error::ZipSlip { .. })));
}

#[test]
fn garbage_is_reported_as_corrupted() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_zip(Cursor::new(b"not a zip".to_vec()), dir.path(), &ExtractOptions::default());
    assert!(matches!(result, Err(Error::Corrupted(_))));
}

#[test]
fn flattened_entries_land_in_the_root() {
    let outer = tempfile::tempdir().unwrap();
    let natives = outer.path().join("natives");
    let archive = build_zip(&[
        ("linux/", b""),
        ("linux/x64/org/lwjgl/liblwjgl.so", b"native"),
        ("linux/x64/../../../../evil.so", b"pwned"),
    ]);
    let options = ExtractOptions::default()
        .flatten(true)
        .on_escape(EscapePolicy::Skip);

    let report = extract_zip(archive, &natives, &options).unwrap();

    assert_eq!(report.entry_count, 1);
    assert_eq!(report.rejected.len(), 1);
    assert!(natives.join("liblwjgl.so").is_file());
    assert!(!natives.join("linux").exists());
    assert!(!natives.join("evil.so").exists());
    assert!(!outer.path().join("evil.so").exists());
}
