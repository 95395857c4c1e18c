//! Property tests for the cached store's size and round-trip invariants.

use camino::Utf8PathBuf;
use prdforge_store::{CacheOptions, CachedFileStore, DEFAULT_FILE_MODE};
use proptest::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

fn temp_root() -> (TempDir, Utf8PathBuf) {
    let td = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).expect("utf-8 temp dir");
    (td, root)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Entry count never exceeds capacity after any sequence of writes and reads.
    #[test]
    fn prop_entries_never_exceed_capacity(
        capacity in 1usize..6,
        ops in prop::collection::vec((0usize..12, any::<bool>()), 1..40),
    ) {
        let (_td, root) = temp_root();
        let store = CachedFileStore::new(CacheOptions {
            max_entries: capacity,
            ttl: Duration::from_secs(60),
            max_entry_bytes: 1024,
        });

        for (key, is_write) in ops {
            let path = root.join(format!("f{key}.json"));
            if is_write || !path.exists() {
                store.write(&path, key.to_string().as_bytes(), DEFAULT_FILE_MODE).unwrap();
            } else {
                store.read(&path).unwrap();
            }
            prop_assert!(store.len() <= capacity);
        }
    }

    /// Write followed by read returns exactly the written bytes.
    #[test]
    fn prop_write_read_round_trip(
        payload in prop::collection::vec(any::<u8>(), 0..2048),
        max_entry_bytes in 1usize..2048,
    ) {
        let (_td, root) = temp_root();
        let store = CachedFileStore::new(CacheOptions {
            max_entries: 4,
            ttl: Duration::from_secs(60),
            max_entry_bytes,
        });
        let path = root.join("outputs/blob.bin");

        store.write(&path, &payload, DEFAULT_FILE_MODE).unwrap();
        prop_assert_eq!(store.read(&path).unwrap(), payload.clone());
        prop_assert_eq!(store.contains(&path), payload.len() < max_entry_bytes);
    }
}

/// Test concurrent readers and writers against a small cache
#[test]
fn test_concurrent_access_keeps_capacity() {
    let (_td, root) = temp_root();
    let store = CachedFileStore::new(CacheOptions {
        max_entries: 3,
        ttl: Duration::from_secs(60),
        max_entry_bytes: 1024,
    });

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let store = &store;
            let root = &root;
            scope.spawn(move || {
                for i in 0..50 {
                    let path = root.join(format!("w{worker}_{}.json", i % 5));
                    store
                        .write(&path, format!("{worker}:{i}").as_bytes(), DEFAULT_FILE_MODE)
                        .unwrap();
                    assert_eq!(store.read(&path).unwrap(), format!("{worker}:{i}").into_bytes());
                    assert!(store.len() <= 3);
                }
            });
        }
    });

    assert!(store.len() <= 3);
    assert_eq!(store.stats().writes, 200);
}
