//! Tests for Container
//!
//! These tests verify:
//! - Container creation and loading
//! - Insert at arbitrary positions (directory and payload order)
//! - Fetch, including partially and fully prefetched payloads
//! - Remove with truncation
//! - Reorder as a pure permutation
//! - Failed operations leave file and Catalog untouched
//! - Exact on-disk layout

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use quark::catalog::ByteIdentifier;
use quark::storage::Container;
use quark::QuarkError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_container() -> (TempDir, PathBuf, Container) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.bin");
    let container = Container::open(&path, temp_dir.path()).unwrap();
    (temp_dir, path, container)
}

fn id(name: &str) -> ByteIdentifier {
    ByteIdentifier::new(name)
}

fn insert(container: &mut Container, name: &str, data: &[u8], position: usize) {
    container
        .insert(id(name), &mut Cursor::new(data), data.len() as u64, position)
        .unwrap();
}

fn fetch(container: &mut Container, name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    container.fetch(&id(name), None, &mut out).unwrap();
    out
}

fn names(container: &Container) -> Vec<String> {
    container
        .catalog()
        .records()
        .iter()
        .map(|r| r.name.to_string())
        .collect()
}

/// Check the raw file: count byte, directory entries, then payloads in order
fn assert_layout(path: &Path, expected: &[(&str, &[u8])]) {
    let bytes = fs::read(path).unwrap();
    assert_eq!(bytes[0] as usize, expected.len());

    let mut offset = 1 + 48 * expected.len();
    for (i, (name, data)) in expected.iter().enumerate() {
        let entry = &bytes[1 + 48 * i..1 + 48 * (i + 1)];
        assert_eq!(&entry[..name.len()], name.as_bytes());
        assert!(entry[name.len()..40].iter().all(|&b| b == 0));
        let size = u64::from_le_bytes(entry[40..48].try_into().unwrap());
        assert_eq!(size, data.len() as u64);

        assert_eq!(&bytes[offset..offset + data.len()], *data);
        offset += data.len();
    }
    assert_eq!(offset, bytes.len());
}

/// Yields `remaining` bytes, then fails every read
struct FailingReader {
    remaining: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "device went away"));
        }
        let n = buf.len().min(self.remaining);
        buf[..n].fill(b'x');
        self.remaining -= n;
        Ok(n)
    }
}

/// A, B, C with staging copies in their own directory (returned)
fn setup_abc_with_staging_dir() -> (TempDir, PathBuf, PathBuf, Container) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.bin");
    let staging_dir = temp_dir.path().join("staging");
    fs::create_dir(&staging_dir).unwrap();

    let mut container = Container::open(&path, &staging_dir).unwrap();
    insert(&mut container, "A", b"aaaaaaaaaa", 0);
    insert(&mut container, "B", b"bbbbb", 1);
    insert(&mut container, "C", b"ccccccc", 2);
    (temp_dir, path, staging_dir, container)
}

/// Container with A, B, C appended in that order
fn setup_abc() -> (TempDir, PathBuf, Container) {
    let (temp, path, mut container) = setup_temp_container();
    insert(&mut container, "A", b"aaaaaaaaaa", 0);
    insert(&mut container, "B", b"bbbbb", 1);
    insert(&mut container, "C", b"ccccccc", 2);
    (temp, path, container)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_empty_container() {
    let (_temp, path, container) = setup_temp_container();

    assert!(path.exists());
    assert_eq!(fs::read(&path).unwrap(), vec![0u8]);
    assert_eq!(container.catalog().record_count(), 0);
    assert_eq!(container.file_len().unwrap(), 1);
}

#[test]
fn test_reopen_restores_catalog() {
    let (temp, path, container) = setup_abc();
    let before = container.catalog().clone();
    drop(container);

    let reopened = Container::open(&path, temp.path()).unwrap();
    assert_eq!(reopened.catalog(), &before);
}

#[test]
fn test_reopen_rejects_truncated_file() {
    let (temp, path, container) = setup_abc();
    let len = container.file_len().unwrap();
    drop(container);

    let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(len - 1).unwrap();
    drop(file);

    let result = Container::open(&path, temp.path());
    assert!(matches!(result, Err(QuarkError::Format(_))));
}

// =============================================================================
// Insert Tests
// =============================================================================

#[test]
fn test_insert_append_and_fetch() {
    let (_temp, path, mut container) = setup_temp_container();

    insert(&mut container, "hello.txt", b"hello world", 0);

    assert_eq!(fetch(&mut container, "hello.txt"), b"hello world");
    assert_layout(&path, &[("hello.txt", b"hello world")]);
}

#[test]
fn test_insert_at_front() {
    let (_temp, path, mut container) = setup_temp_container();
    insert(&mut container, "B", b"bbbb", 0);
    insert(&mut container, "C", b"cc", 1);

    insert(&mut container, "A", b"aaaaaaaaaa", 0);

    assert_eq!(names(&container), vec!["A", "B", "C"]);
    assert_layout(&path, &[("A", b"aaaaaaaaaa"), ("B", b"bbbb"), ("C", b"cc")]);
}

#[test]
fn test_insert_in_middle() {
    let (_temp, path, mut container) = setup_abc();

    insert(&mut container, "X", b"xyz", 2);

    assert_eq!(names(&container), vec!["A", "B", "X", "C"]);
    assert_layout(
        &path,
        &[
            ("A", b"aaaaaaaaaa"),
            ("B", b"bbbbb"),
            ("X", b"xyz"),
            ("C", b"ccccccc"),
        ],
    );
}

#[test]
fn test_insert_empty_payload() {
    let (_temp, path, mut container) = setup_abc();

    insert(&mut container, "empty", b"", 1);

    assert_eq!(fetch(&mut container, "empty"), b"");
    assert_eq!(fetch(&mut container, "B"), b"bbbbb");
    assert_layout(
        &path,
        &[
            ("A", b"aaaaaaaaaa"),
            ("empty", b""),
            ("B", b"bbbbb"),
            ("C", b"ccccccc"),
        ],
    );
}

#[test]
fn test_insert_collision_rejected() {
    let (_temp, path, mut container) = setup_abc();
    let before_bytes = fs::read(&path).unwrap();
    let before_catalog = container.catalog().clone();

    // Collides with the last record, not just the first
    let result = container.insert(id("C"), &mut Cursor::new(b"new"), 3, 0);

    assert!(matches!(result, Err(QuarkError::NameCollision(name)) if name == "C"));
    assert_eq!(container.catalog(), &before_catalog);
    assert_eq!(fs::read(&path).unwrap(), before_bytes);
}

#[test]
fn test_insert_invalid_position() {
    let (_temp, path, mut container) = setup_abc();
    let before_bytes = fs::read(&path).unwrap();

    let result = container.insert(id("D"), &mut Cursor::new(b"d"), 1, 4);

    assert!(matches!(
        result,
        Err(QuarkError::InvalidPosition { position: 4, count: 3 })
    ));
    assert_eq!(fs::read(&path).unwrap(), before_bytes);
}

#[test]
fn test_insert_short_source_leaves_container_untouched() {
    let (_temp, path, mut container) = setup_abc();
    let before_bytes = fs::read(&path).unwrap();
    let before_catalog = container.catalog().clone();

    // Claims 100 bytes, provides 3
    let result = container.insert(id("D"), &mut Cursor::new(b"ddd"), 100, 1);

    assert!(matches!(result, Err(QuarkError::SourceUnavailable { .. })));
    assert_eq!(container.catalog(), &before_catalog);
    assert_eq!(fs::read(&path).unwrap(), before_bytes);
}

#[test]
fn test_insert_unreadable_source_leaves_container_untouched() {
    let (_temp, path, mut container) = setup_abc();
    let before_bytes = fs::read(&path).unwrap();
    let before_catalog = container.catalog().clone();

    let mut source = FailingReader { remaining: 4 };
    let result = container.insert(id("D"), &mut source, 10, 0);

    match result {
        Err(QuarkError::SourceUnavailable { source, .. }) => {
            assert_eq!(source.kind(), io::ErrorKind::Other)
        }
        other => panic!("expected SourceUnavailable, got {:?}", other),
    }
    assert_eq!(container.catalog(), &before_catalog);
    assert_eq!(fs::read(&path).unwrap(), before_bytes);
}

#[test]
fn test_insert_truncates_long_names() {
    let (_temp, _path, mut container) = setup_temp_container();
    let long = format!("{}-tail", "n".repeat(40));

    insert(&mut container, &long, b"data", 0);

    assert_eq!(names(&container), vec!["n".repeat(40)]);
    assert_eq!(fetch(&mut container, &long), b"data");
    assert_eq!(fetch(&mut container, &"n".repeat(40)), b"data");
}

#[test]
fn test_insert_into_full_store() {
    let (_temp, _path, mut container) = setup_temp_container();
    for i in 0..255 {
        let name = format!("f{}", i);
        insert(&mut container, &name, b"", i);
    }

    let result = container.insert(id("overflow"), &mut Cursor::new(b""), 0, 0);

    assert!(matches!(result, Err(QuarkError::StoreFull)));
    assert_eq!(container.catalog().record_count(), 255);
}

#[test]
fn test_staging_files_are_cleaned_up() {
    let (temp, _path, mut container) = setup_abc();
    container.remove(&id("B")).unwrap();
    container.reorder(&[id("C"), id("A")]).unwrap();

    let entries: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("test.bin")]);
}

// =============================================================================
// Fetch Tests
// =============================================================================

#[test]
fn test_fetch_empty_store() {
    let (_temp, _path, mut container) = setup_temp_container();

    let result = container.fetch(&id("a"), None, &mut Vec::new());
    assert!(matches!(result, Err(QuarkError::EmptyStore)));
}

#[test]
fn test_fetch_not_found() {
    let (_temp, _path, mut container) = setup_abc();

    let result = container.fetch(&id("missing"), None, &mut Vec::new());
    assert!(matches!(result, Err(QuarkError::NotFound(name)) if name == "missing"));
}

#[test]
fn test_fetch_returns_bytes_written() {
    let (_temp, _path, mut container) = setup_abc();

    let mut out = Vec::new();
    let written = container.fetch(&id("B"), None, &mut out).unwrap();

    assert_eq!(written, 5);
    assert_eq!(out, b"bbbbb");
}

#[test]
fn test_fetch_with_partial_cache() {
    let (_temp, _path, mut container) = setup_temp_container();
    let payload: Vec<u8> = (0..100u8).collect();
    insert(&mut container, "data", &payload, 0);

    // 40% already buffered
    let mut out = Vec::new();
    let written = container
        .fetch(&id("data"), Some(&payload[..40]), &mut out)
        .unwrap();

    assert_eq!(written, 100);
    assert_eq!(out, payload);
}

#[test]
fn test_fetch_with_full_cache_skips_disk() {
    let (_temp, path, mut container) = setup_abc();

    // Corrupt B's payload on disk; a complete cache entry must win
    let offset = container.catalog().locate(&id("B")).unwrap().offset as usize;
    let mut bytes = fs::read(&path).unwrap();
    bytes[offset] = b'!';
    fs::write(&path, &bytes).unwrap();

    let mut out = Vec::new();
    container.fetch(&id("B"), Some(b"bbbbb"), &mut out).unwrap();
    assert_eq!(out, b"bbbbb");
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_preserves_neighbours() {
    let (_temp, path, mut container) = setup_abc();
    let before_len = container.file_len().unwrap();

    let removed = container.remove(&id("B")).unwrap();

    assert_eq!(removed.size, 5);
    assert_eq!(names(&container), vec!["A", "C"]);
    assert_eq!(container.file_len().unwrap(), before_len - 5 - 48);
    assert_eq!(fetch(&mut container, "A"), b"aaaaaaaaaa");
    assert_eq!(fetch(&mut container, "C"), b"ccccccc");
    assert_layout(&path, &[("A", b"aaaaaaaaaa"), ("C", b"ccccccc")]);
}

#[test]
fn test_remove_first_and_last() {
    let (_temp, path, mut container) = setup_abc();

    container.remove(&id("A")).unwrap();
    container.remove(&id("C")).unwrap();

    assert_layout(&path, &[("B", b"bbbbb")]);
}

#[test]
fn test_remove_only_record() {
    let (_temp, path, mut container) = setup_temp_container();
    insert(&mut container, "only", b"payload", 0);

    container.remove(&id("only")).unwrap();

    assert_eq!(fs::read(&path).unwrap(), vec![0u8]);
    assert!(container.catalog().is_empty());
}

#[test]
fn test_remove_staging_failure_leaves_container_untouched() {
    let (_temp, path, staging_dir, mut container) = setup_abc_with_staging_dir();
    let before_bytes = fs::read(&path).unwrap();
    fs::remove_dir(&staging_dir).unwrap();

    let result = container.remove(&id("B"));

    assert!(matches!(result, Err(QuarkError::Io(_))));
    assert_eq!(names(&container), vec!["A", "B", "C"]);
    assert_eq!(fs::read(&path).unwrap(), before_bytes);
    assert_eq!(fetch(&mut container, "B"), b"bbbbb");
}

#[test]
fn test_insert_staging_failure_leaves_container_untouched() {
    let (_temp, path, staging_dir, mut container) = setup_abc_with_staging_dir();
    let before_bytes = fs::read(&path).unwrap();
    fs::remove_dir(&staging_dir).unwrap();

    let result = container.insert(id("D"), &mut Cursor::new(b"ddd"), 3, 1);

    assert!(matches!(result, Err(QuarkError::Io(_))));
    assert_eq!(names(&container), vec!["A", "B", "C"]);
    assert_eq!(fs::read(&path).unwrap(), before_bytes);
}

#[test]
fn test_remove_errors() {
    let (_temp, _path, mut container) = setup_temp_container();
    assert!(matches!(container.remove(&id("x")), Err(QuarkError::EmptyStore)));

    insert(&mut container, "a", b"1", 0);
    assert!(matches!(container.remove(&id("x")), Err(QuarkError::NotFound(_))));
}

// =============================================================================
// Reorder Tests
// =============================================================================

#[test]
fn test_reorder_is_permutation() {
    let (_temp, path, mut container) = setup_abc();
    let before_len = container.file_len().unwrap();

    container.reorder(&[id("C"), id("A"), id("B")]).unwrap();

    assert_eq!(names(&container), vec!["C", "A", "B"]);
    assert_eq!(container.file_len().unwrap(), before_len);
    assert_layout(
        &path,
        &[("C", b"ccccccc"), ("A", b"aaaaaaaaaa"), ("B", b"bbbbb")],
    );
}

#[test]
fn test_reorder_unknown_record() {
    let (_temp, path, mut container) = setup_abc();
    let before_bytes = fs::read(&path).unwrap();

    let result = container.reorder(&[id("C"), id("Z"), id("B")]);

    assert!(matches!(result, Err(QuarkError::UnknownRecord(name)) if name == "Z"));
    assert_eq!(names(&container), vec!["A", "B", "C"]);
    assert_eq!(fs::read(&path).unwrap(), before_bytes);
}

#[test]
fn test_reorder_rejects_duplicates_and_missing() {
    let (_temp, _path, mut container) = setup_abc();

    let duplicate = container.reorder(&[id("A"), id("A"), id("B")]);
    assert!(matches!(duplicate, Err(QuarkError::InvalidOrder(_))));

    let missing = container.reorder(&[id("A"), id("B")]);
    assert!(matches!(missing, Err(QuarkError::InvalidOrder(_))));

    assert_eq!(names(&container), vec!["A", "B", "C"]);
}

#[test]
fn test_reorder_staging_failure_leaves_container_untouched() {
    let (_temp, path, staging_dir, mut container) = setup_abc_with_staging_dir();
    let before_bytes = fs::read(&path).unwrap();
    fs::remove_dir(&staging_dir).unwrap();

    let result = container.reorder(&[id("C"), id("A"), id("B")]);

    assert!(matches!(result, Err(QuarkError::Io(_))));
    assert_eq!(names(&container), vec!["A", "B", "C"]);
    assert_eq!(fs::read(&path).unwrap(), before_bytes);
    assert_eq!(fetch(&mut container, "A"), b"aaaaaaaaaa");
}

#[test]
fn test_reorder_survives_reopen() {
    let (temp, path, mut container) = setup_abc();
    container.reorder(&[id("B"), id("C"), id("A")]).unwrap();
    drop(container);

    let mut reopened = Container::open(&path, temp.path()).unwrap();
    assert_eq!(names(&reopened), vec!["B", "C", "A"]);
    assert_eq!(fetch(&mut reopened, "A"), b"aaaaaaaaaa");
}

// =============================================================================
// Payload Reads (prefetch path)
// =============================================================================

#[test]
fn test_read_payload_bounds() {
    let (_temp, _path, mut container) = setup_abc();
    let location = container.catalog().locate(&id("A")).unwrap();

    let mut out = Vec::new();
    assert_eq!(container.read_payload(&location, 2, 3, &mut out).unwrap(), 3);
    assert_eq!(out, b"aaa");

    // Never reads past the record
    let mut out = Vec::new();
    assert_eq!(container.read_payload(&location, 8, 100, &mut out).unwrap(), 2);
    assert_eq!(container.read_payload(&location, 10, 100, &mut out).unwrap(), 0);
}
