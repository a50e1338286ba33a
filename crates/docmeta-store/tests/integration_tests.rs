//! Integration tests for docmeta-store
//!
//! These tests run every backend through the same object and prompt cycles.

use docmeta_domain::ObjectStore;
use docmeta_store::{FsStore, MemoryStore, PromptStore, SqliteStore, StoreError};
use tempfile::TempDir;

fn exercise<S: ObjectStore<Error = StoreError>>(store: &mut S) {
    store.put("raw/2024/q1.txt", b"first quarter").unwrap();
    store.put("raw/2024/q2.txt", b"second quarter").unwrap();
    store.put("batches/2024/q1_batches.json", b"[]").unwrap();

    assert_eq!(store.get("raw/2024/q2.txt").unwrap(), b"second quarter");
    assert_eq!(
        store.list("raw/").unwrap(),
        vec!["raw/2024/q1.txt".to_string(), "raw/2024/q2.txt".to_string()]
    );
    assert_eq!(store.list("").unwrap().len(), 3);

    store.put("raw/2024/q1.txt", b"revised").unwrap();
    assert_eq!(store.get("raw/2024/q1.txt").unwrap(), b"revised");

    assert!(matches!(store.get("raw/2023/q4.txt"), Err(StoreError::NotFound(_))));
    assert!(matches!(store.put("../escape.txt", b"x"), Err(StoreError::InvalidPath(_))));
}

#[test]
fn test_memory_store_cycle() {
    exercise(&mut MemoryStore::new());
}

#[test]
fn test_fs_store_cycle() {
    let dir = TempDir::new().unwrap();
    let mut store = FsStore::new(dir.path()).unwrap();
    exercise(&mut store);

    // Objects are plain files under the root
    let on_disk = std::fs::read(dir.path().join("raw").join("2024").join("q1.txt")).unwrap();
    assert_eq!(on_disk, b"revised");
}

#[test]
fn test_fs_store_creates_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("nested").join("bucket");
    let store = FsStore::new(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(store.root(), root.as_path());
    assert!(store.list("").unwrap().is_empty());
}

#[test]
fn test_sqlite_store_cycle() {
    exercise(&mut SqliteStore::new(":memory:").unwrap());
}

#[test]
fn test_sqlite_store_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("objects.db");

    {
        let mut store = SqliteStore::new(&db).unwrap();
        store.put("mix/reports_mix.json", b"{}").unwrap();
    }

    let store = SqliteStore::new(&db).unwrap();
    assert_eq!(store.get("mix/reports_mix.json").unwrap(), b"{}");
}

#[test]
fn test_prompt_store_on_disk() {
    let dir = TempDir::new().unwrap();
    let mut prompts = PromptStore::new(FsStore::new(dir.path()).unwrap());

    prompts.upload_prompt("financial", 1, "Extract the following document.").unwrap();
    prompts.upload_prompt("financial", 2, "Extract the following document, v2.").unwrap();

    assert!(dir.path().join("prompts/financial/v2.txt").is_file());
    assert_eq!(prompts.versions("financial").unwrap(), vec![1, 2]);
    assert_eq!(
        prompts.get_prompt("financial", None).unwrap(),
        "Extract the following document, v2."
    );
    assert_eq!(
        prompts.get_prompt("financial", Some(1)).unwrap(),
        "Extract the following document."
    );
}

#[test]
fn test_prompt_store_rejects_non_utf8() {
    let mut store = MemoryStore::new();
    store.put("prompts/binary/v1.txt", &[0xff, 0xfe, 0x00]).unwrap();
    let prompts = PromptStore::new(store);

    assert!(matches!(
        prompts.get_prompt("binary", None),
        Err(StoreError::InvalidData(_))
    ));
}
