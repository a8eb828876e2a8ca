//! Unit tests for the archive extraction module.

use super::*;
use flate2::Compression;
use flate2::write::GzEncoder;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir creation succeeds")
}

fn utf8(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf-8 temp path")
}

enum Item<'a> {
    Dir(&'a str, u32),
    File(&'a str, u32, &'a [u8]),
    Symlink(&'a str, &'a str),
    Special(&'a str, EntryType),
}

/// Build a `.tar.gz` at `path` from `items`, finishing both layers.
fn write_tarball(path: &Path, items: &[Item<'_>]) {
    let encoder = GzEncoder::new(File::create(path).expect("create archive"), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for item in items {
        let mut header = tar::Header::new_gnu();
        match item {
            Item::Dir(name, mode) => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(*mode);
                header.set_size(0);
                builder
                    .append_data(&mut header, name, io::empty())
                    .expect("append dir");
            }
            Item::File(name, mode, data) => {
                header.set_entry_type(EntryType::Regular);
                header.set_mode(*mode);
                header.set_size(data.len() as u64);
                builder
                    .append_data(&mut header, name, *data)
                    .expect("append file");
            }
            Item::Symlink(name, target) => {
                header.set_entry_type(EntryType::Symlink);
                header.set_size(0);
                builder
                    .append_link(&mut header, name, target)
                    .expect("append symlink");
            }
            Item::Special(name, kind) => {
                header.set_entry_type(*kind);
                header.set_size(0);
                builder
                    .append_data(&mut header, name, io::empty())
                    .expect("append special entry");
            }
        }
    }
    builder
        .into_inner()
        .expect("tar finish")
        .finish()
        .expect("gzip finish");
}

#[rstest]
fn extracts_only_prefixed_entries(temp_dir: TempDir) {
    let archive = temp_dir.path().join("go.tar.gz");
    write_tarball(&archive, &[
        Item::Dir("go/bin/", 0o755),
        Item::File("go/bin/tool", 0o755, b"#!/bin/sh\n"),
        Item::File("README.md", 0o644, b"readme"),
    ]);
    let dest = temp_dir.path().join("work");

    let report = GzipExtractor::default()
        .extract(&utf8(&archive), &utf8(&dest))
        .expect("extraction succeeds");

    assert_eq!(report, ExtractionReport {
        materialized: 2,
        skipped: 1,
    });
    assert_eq!(
        std::fs::read(dest.join("go/bin/tool")).expect("tool written"),
        b"#!/bin/sh\n"
    );
    assert!(!dest.join("README.md").exists());
}

#[rstest]
fn creates_parents_for_files_without_directory_entries(temp_dir: TempDir) {
    let archive = temp_dir.path().join("go.tar.gz");
    write_tarball(&archive, &[Item::File("go/src/runtime/proc.go", 0o644, b"package runtime\n")]);
    let dest = temp_dir.path().join("work");

    GzipExtractor::default()
        .extract(&utf8(&archive), &utf8(&dest))
        .expect("extraction succeeds");

    assert!(dest.join("go/src/runtime/proc.go").is_file());
}

#[cfg(unix)]
#[rstest]
fn preserves_entry_modes(temp_dir: TempDir) {
    use std::os::unix::fs::PermissionsExt;

    let archive = temp_dir.path().join("go.tar.gz");
    write_tarball(&archive, &[
        Item::File("go/bin/go", 0o755, b"binary"),
        Item::File("go/VERSION", 0o644, b"go1.20"),
    ]);
    let dest = temp_dir.path().join("work");

    GzipExtractor::default()
        .extract(&utf8(&archive), &utf8(&dest))
        .expect("extraction succeeds");

    let mode_of = |rel: &str| {
        std::fs::metadata(dest.join(rel))
            .expect("metadata")
            .permissions()
            .mode()
            & 0o777
    };
    assert_eq!(mode_of("go/bin/go"), 0o755);
    assert_eq!(mode_of("go/VERSION"), 0o644);
}

#[rstest]
fn skips_symlinks(temp_dir: TempDir) {
    let archive = temp_dir.path().join("go.tar.gz");
    write_tarball(&archive, &[
        Item::File("go/VERSION", 0o644, b"go1.20"),
        Item::Symlink("go/latest", "VERSION"),
    ]);
    let dest = temp_dir.path().join("work");

    let report = GzipExtractor::default()
        .extract(&utf8(&archive), &utf8(&dest))
        .expect("extraction succeeds");

    assert_eq!(report.skipped, 1);
    assert!(std::fs::symlink_metadata(dest.join("go/latest")).is_err());
}

#[rstest]
#[case(EntryType::Char)]
#[case(EntryType::Block)]
#[case(EntryType::Fifo)]
fn skips_special_entries_without_a_mode(temp_dir: TempDir, #[case] kind: EntryType) {
    let archive = temp_dir.path().join("go.tar.gz");
    write_tarball(&archive, &[
        Item::Special("go/dev/null", kind),
        Item::File("go/VERSION", 0o644, b"go1.20"),
    ]);
    let dest = temp_dir.path().join("work");

    let report = GzipExtractor::default()
        .extract(&utf8(&archive), &utf8(&dest))
        .expect("special entries are skipped");

    assert_eq!(report, ExtractionReport {
        materialized: 1,
        skipped: 1,
    });
    assert!(!dest.join("go/dev/null").exists());
}

#[rstest]
fn archive_without_prefix_is_rejected(temp_dir: TempDir) {
    let archive = temp_dir.path().join("other.tar.gz");
    write_tarball(&archive, &[Item::File("README.md", 0o644, b"readme")]);
    let dest = temp_dir.path().join("work");

    let result = GzipExtractor::default().extract(&utf8(&archive), &utf8(&dest));

    assert!(
        matches!(result, Err(ExtractionError::NoMatchingEntries { ref prefix }) if prefix == "go/")
    );
}

#[rstest]
fn custom_prefix_selects_other_trees(temp_dir: TempDir) {
    let archive = temp_dir.path().join("mixed.tar.gz");
    write_tarball(&archive, &[
        Item::File("go/VERSION", 0o644, b"go1.20"),
        Item::File("gopls/VERSION", 0o644, b"v0.14"),
    ]);
    let dest = temp_dir.path().join("work");

    GzipExtractor::new("gopls/")
        .extract(&utf8(&archive), &utf8(&dest))
        .expect("extraction succeeds");

    assert!(dest.join("gopls/VERSION").exists());
    assert!(!dest.join("go").exists());
}

#[rstest]
fn corrupt_gzip_is_reported(temp_dir: TempDir) {
    let archive = temp_dir.path().join("broken.tar.gz");
    std::fs::write(&archive, b"this is not gzip data").expect("write garbage");
    let dest = temp_dir.path().join("work");

    let result = GzipExtractor::default().extract(&utf8(&archive), &utf8(&dest));

    assert!(matches!(result, Err(ExtractionError::Corrupt { .. })));
}

#[rstest]
fn missing_archive_is_an_open_error(temp_dir: TempDir) {
    let archive = temp_dir.path().join("absent.tar.gz");
    let dest = temp_dir.path().join("work");

    let result = GzipExtractor::default().extract(&utf8(&archive), &utf8(&dest));

    assert!(matches!(result, Err(ExtractionError::Open { .. })));
}

#[rstest]
fn traversal_inside_prefix_is_rejected(temp_dir: TempDir) {
    let archive = temp_dir.path().join("evil.tar.gz");
    let encoder = GzEncoder::new(File::create(&archive).expect("create"), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    // The builder refuses `..` in names, so write the raw name bytes.
    for (slot, byte) in header
        .as_old_mut()
        .name
        .iter_mut()
        .zip(b"go/../escape.txt")
    {
        *slot = *byte;
    }
    header.set_entry_type(EntryType::Regular);
    header.set_mode(0o644);
    header.set_size(4);
    header.set_cksum();
    builder.append(&header, &b"evil"[..]).expect("append raw");
    builder
        .into_inner()
        .expect("tar finish")
        .finish()
        .expect("gzip finish");
    let dest = temp_dir.path().join("work");

    let result = GzipExtractor::default().extract(&utf8(&archive), &utf8(&dest));

    assert!(matches!(result, Err(ExtractionError::PathTraversal { .. })));
    assert!(!temp_dir.path().join("escape.txt").exists());
}

#[rstest]
#[case::parent_dir("../escape.txt")]
#[case::nested_parent("go/../../escape.txt")]
fn rejects_path_traversal(#[case] bad_path: &str) {
    let result = validate_entry_path(Path::new(bad_path));
    assert!(
        matches!(result, Err(ExtractionError::PathTraversal { .. })),
        "expected PathTraversal for {bad_path}"
    );
}

#[test]
fn rejects_absolute_path() {
    let result = validate_entry_path(Path::new("/etc/passwd"));
    assert!(matches!(result, Err(ExtractionError::PathTraversal { .. })));
}

#[test]
fn accepts_normal_paths() {
    assert!(validate_entry_path(Path::new("go/bin/gofmt")).is_ok());
}

#[cfg(unix)]
#[test]
fn write_emfile_counts_as_descriptor_exhaustion() {
    let err = ExtractionError::Write {
        path: PathBuf::from("go/bin/go"),
        source: io::Error::from_raw_os_error(libc::EMFILE),
    };
    assert!(err.is_descriptor_exhaustion());
}
