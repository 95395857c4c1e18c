use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

use prdforge_utils::logging::log_sweep_complete;

use crate::cache::StoreInner;

/// What the periodic sweep cleans and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPolicy {
    /// Time between sweeps.
    pub interval: Duration,
    /// Directory scanned for stale artifacts (not recursive).
    pub directory: Utf8PathBuf,
    /// Files older than this (by modification time) are deleted.
    pub retention: Duration,
    /// Only files with this extension (without the dot) are deleted.
    pub extension: String,
}

impl SweepPolicy {
    /// Five-minute sweeps deleting `.md` files older than 30 days in `directory`.
    #[must_use]
    pub fn new(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            directory: directory.into(),
            retention: Duration::from_secs(30 * 24 * 60 * 60),
            extension: "md".to_string(),
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_entries: usize,
    pub deleted_files: Vec<Utf8PathBuf>,
}

pub(crate) fn run_sweep(inner: &StoreInner, policy: &SweepPolicy) -> SweepReport {
    let started = Instant::now();
    let expired_entries = inner.expire_entries(Instant::now());
    let deleted_files = purge_stale_artifacts(inner, policy, SystemTime::now());
    log_sweep_complete(
        expired_entries,
        deleted_files.len(),
        started.elapsed().as_millis(),
    );
    SweepReport {
        expired_entries,
        deleted_files,
    }
}

/// Delete matching files last modified before `now - retention`.
///
/// Runs under the cache write lock; each deleted path is also dropped from
/// the cache. Individual failures are logged and skipped.
fn purge_stale_artifacts(
    inner: &StoreInner,
    policy: &SweepPolicy,
    now: SystemTime,
) -> Vec<Utf8PathBuf> {
    let Some(cutoff) = now.checked_sub(policy.retention) else {
        return Vec::new();
    };

    let listing = match std::fs::read_dir(&policy.directory) {
        Ok(listing) => listing,
        Err(e) => {
            debug!(dir = %policy.directory, error = %e, "Retention sweep skipped");
            return Vec::new();
        }
    };

    inner.with_entries_locked(|forget| {
        let mut deleted = Vec::new();
        for dirent in listing.flatten() {
            let Ok(path) = Utf8PathBuf::from_path_buf(dirent.path()) else {
                continue;
            };
            match is_stale(&path, &dirent, &policy.extension, cutoff) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    debug!(path = %path, error = %e, "Could not stat artifact");
                    continue;
                }
            }
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    forget(&path);
                    deleted.push(path);
                }
                Err(e) => debug!(path = %path, error = %e, "Could not delete stale artifact"),
            }
        }
        deleted
    })
}

fn is_stale(
    path: &Utf8Path,
    dirent: &std::fs::DirEntry,
    extension: &str,
    cutoff: SystemTime,
) -> io::Result<bool> {
    if path.extension() != Some(extension) {
        return Ok(false);
    }
    let metadata = dirent.metadata()?;
    if !metadata.is_file() {
        return Ok(false);
    }
    Ok(metadata.modified()? < cutoff)
}

/// Handle to the background sweep thread.
///
/// The thread blocks on a channel with the sweep interval as timeout, so a
/// stop signal (or dropping the sender) ends it immediately.
#[derive(Debug)]
pub(crate) struct Sweeper {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    pub(crate) fn spawn(inner: Arc<StoreInner>, policy: SweepPolicy) -> io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = policy.interval;

        let handle = thread::Builder::new()
            .name("prdforge-sweep".to_string())
            .spawn(move || {
                debug!(interval_ms = %interval.as_millis(), dir = %policy.directory, "Sweeper started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            run_sweep(&inner, &policy);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Sweeper stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub(crate) fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Sweeper thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheOptions, CachedFileStore, DEFAULT_FILE_MODE};
    use std::fs::File;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        (td, root)
    }

    fn age(path: &Utf8Path, by: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn test_sweep_deletes_only_old_matching_files() {
        let (_td, root) = temp_root();
        let store = CachedFileStore::new(CacheOptions::default());
        let old_md = root.join("p_phase1_2020-01-01_00-00-00.md");
        let new_md = root.join("p_phase2_2020-01-01_00-00-00.md");
        let old_json = root.join("p.json");

        for path in [&old_md, &new_md, &old_json] {
            store.write(path, b"x", DEFAULT_FILE_MODE).unwrap();
        }
        age(&old_md, 31 * DAY);
        age(&old_json, 31 * DAY);
        age(&new_md, 29 * DAY);

        let report = store.sweep_now(&SweepPolicy::new(root.clone()));

        assert_eq!(report.deleted_files, vec![old_md.clone()]);
        assert!(!old_md.exists());
        assert!(new_md.exists());
        assert!(old_json.exists());
        assert!(!store.contains(&old_md), "deleted files leave the cache");
        assert!(store.contains(&new_md));
    }

    #[test]
    fn test_sweep_on_missing_directory_is_noop() {
        let (_td, root) = temp_root();
        let store = CachedFileStore::new(CacheOptions::default());

        let report = store.sweep_now(&SweepPolicy::new(root.join("nope")));
        assert_eq!(report, SweepReport::default());
    }

    #[test]
    fn test_background_sweeper_expires_entries() {
        let (_td, root) = temp_root();
        let options = CacheOptions {
            ttl: Duration::from_millis(10),
            ..CacheOptions::default()
        };
        let policy = SweepPolicy {
            interval: Duration::from_millis(20),
            ..SweepPolicy::new(root.clone())
        };
        let store = CachedFileStore::with_sweeper(options, policy).unwrap();
        store.write(&root.join("a.json"), b"1", DEFAULT_FILE_MODE).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while store.len() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(store.len(), 0);
        store.stop();
    }

    #[test]
    fn test_stop_is_prompt_and_idempotent() {
        let (_td, root) = temp_root();
        let policy = SweepPolicy {
            interval: Duration::from_secs(3600),
            ..SweepPolicy::new(root)
        };
        let store = CachedFileStore::with_sweeper(CacheOptions::default(), policy).unwrap();
        assert!(store.is_sweeping());

        let started = Instant::now();
        store.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!store.is_sweeping());

        store.stop();
    }
}
