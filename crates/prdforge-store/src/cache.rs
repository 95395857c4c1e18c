use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use prdforge_utils::atomic_write::write_file_atomic;
use prdforge_utils::error::StoreError;

use crate::stats::CacheStats;
use crate::sweep::{SweepPolicy, SweepReport, Sweeper};

/// Permission bits applied to files written without an explicit mode.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Sizing and expiry for the in-memory layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum number of cached paths. Zero disables caching.
    pub max_entries: usize,
    /// Lifetime of an entry after its last read-through or write.
    pub ttl: Duration,
    /// Payloads of this many bytes or more are never cached.
    pub max_entry_bytes: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl: Duration::from_secs(15 * 60),
            max_entry_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    bytes: Vec<u8>,
    expires_at: Instant,
    /// Insertion order; breaks ties between identical expiry instants.
    seq: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    invalidations: AtomicU64,
    writes: AtomicU64,
}

/// State shared between the store handle and its sweeper thread.
#[derive(Debug)]
pub(crate) struct StoreInner {
    options: CacheOptions,
    entries: RwLock<HashMap<Utf8PathBuf, CacheEntry>>,
    next_seq: AtomicU64,
    /// Bumped on every write, invalidation or purge of a path.
    generation: AtomicU64,
    /// Generation of the latest mutation per path. Only touched while the
    /// `entries` write lock is held.
    mutated_at: Mutex<HashMap<Utf8PathBuf, u64>>,
    counters: Counters,
}

impl StoreInner {
    fn new(options: CacheOptions) -> Self {
        Self {
            options,
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            mutated_at: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    fn lookup(&self, path: &Utf8Path, now: Instant) -> Option<Vec<u8>> {
        let entries = self.entries.read();
        entries
            .get(path)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.bytes.clone())
    }

    /// Generation to hand to [`StoreInner::read_through`] before reading disk.
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Caller must hold the `entries` write lock.
    fn mark_mutated(&self, path: &Utf8Path) {
        let stamp = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.mutated_at.lock().insert(path.to_path_buf(), stamp);
    }

    /// Cache bytes just read from disk, unless `path` was written,
    /// invalidated or purged after `seen` was taken.
    fn read_through(&self, path: &Utf8Path, bytes: Vec<u8>, seen: u64) -> bool {
        let mut entries = self.entries.write();
        let stale = self
            .mutated_at
            .lock()
            .get(path)
            .is_some_and(|stamp| *stamp > seen);
        if stale {
            trace!(path = %path, "Skipping read-through of a superseded read");
            return false;
        }
        self.place(&mut entries, path, bytes);
        true
    }

    /// Record a write of `path`: cache `bytes`, or drop any older copy
    /// when `bytes` is `None`. Returns whether an older copy was dropped.
    fn write_through(&self, path: &Utf8Path, bytes: Option<Vec<u8>>) -> bool {
        let mut entries = self.entries.write();
        self.mark_mutated(path);
        match bytes {
            Some(bytes) => {
                self.place(&mut entries, path, bytes);
                false
            }
            None => entries.remove(path).is_some(),
        }
    }

    /// Insert or refresh `path`. A new path at capacity first evicts the
    /// entry with the earliest expiry.
    fn place(
        &self,
        entries: &mut HashMap<Utf8PathBuf, CacheEntry>,
        path: &Utf8Path,
        bytes: Vec<u8>,
    ) {
        if self.options.max_entries == 0 {
            return;
        }
        let entry = CacheEntry {
            bytes,
            expires_at: Instant::now() + self.options.ttl,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };

        if !entries.contains_key(path) {
            while entries.len() >= self.options.max_entries {
                if !Self::evict_earliest(entries) {
                    break;
                }
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        entries.insert(path.to_path_buf(), entry);
    }

    fn evict_earliest(entries: &mut HashMap<Utf8PathBuf, CacheEntry>) -> bool {
        let victim = entries
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at, entry.seq))
            .map(|(path, _)| path.clone());

        match victim {
            Some(path) => {
                trace!(path = %path, "Evicting cache entry");
                entries.remove(&path);
                true
            }
            None => false,
        }
    }

    fn remove(&self, path: &Utf8Path) -> bool {
        let mut entries = self.entries.write();
        self.mark_mutated(path);
        entries.remove(path).is_some()
    }

    /// Drop every entry whose TTL elapsed before `now`.
    pub(crate) fn expire_entries(&self, now: Instant) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let expired = before - entries.len();
        self.counters
            .expirations
            .fetch_add(expired as u64, Ordering::Relaxed);
        expired
    }

    /// Hold the write lock while `f` runs; used by retention purges so
    /// deletions and cache invalidations happen as one step.
    pub(crate) fn with_entries_locked<R>(
        &self,
        f: impl FnOnce(&mut dyn FnMut(&Utf8Path)) -> R,
    ) -> R {
        let mut entries = self.entries.write();
        let mut forget = |path: &Utf8Path| {
            self.mark_mutated(path);
            entries.remove(path);
        };
        f(&mut forget)
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().len(),
            capacity: self.options.max_entries,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }
}

/// Bounded, time-expiring read-through / write-through cache over files.
///
/// The store is `Sync`; share it behind an `Arc` or a reference. Dropping it
/// stops the background sweeper.
#[derive(Debug)]
pub struct CachedFileStore {
    inner: Arc<StoreInner>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl CachedFileStore {
    /// Create a store without a background sweeper.
    #[must_use]
    pub fn new(options: CacheOptions) -> Self {
        Self {
            inner: Arc::new(StoreInner::new(options)),
            sweeper: Mutex::new(None),
        }
    }

    /// Create a store and start its background sweeper.
    ///
    /// # Errors
    ///
    /// Fails if the sweeper thread cannot be spawned.
    pub fn with_sweeper(options: CacheOptions, policy: SweepPolicy) -> Result<Self, StoreError> {
        let store = Self::new(options);
        store.start_sweeper(policy)?;
        Ok(store)
    }

    #[must_use]
    pub fn options(&self) -> CacheOptions {
        self.inner.options
    }

    /// Return the bytes of `path`, from memory if a live entry exists.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the file does not exist, [`StoreError::Io`]
    /// for any other read failure.
    pub fn read(&self, path: &Utf8Path) -> Result<Vec<u8>, StoreError> {
        if let Some(bytes) = self.inner.lookup(path, Instant::now()) {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            trace!(path = %path, "Cache hit");
            return Ok(bytes);
        }
        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);

        let seen = self.inner.generation();
        let bytes = std::fs::read(path).map_err(|e| StoreError::from_io(path.as_str(), e))?;
        if bytes.len() < self.inner.options.max_entry_bytes {
            self.inner.read_through(path, bytes.clone(), seen);
        }
        Ok(bytes)
    }

    /// Convenience wrapper decoding the file as UTF-8 (lossily).
    ///
    /// # Errors
    ///
    /// Same as [`CachedFileStore::read`].
    pub fn read_to_string(&self, path: &Utf8Path) -> Result<String, StoreError> {
        let bytes = self.read(path)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Write `bytes` to `path` with permission bits `mode`, then refresh the
    /// cached copy. On failure the cache is left untouched.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] carrying the underlying write failure.
    pub fn write(&self, path: &Utf8Path, bytes: &[u8], mode: u32) -> Result<(), StoreError> {
        write_file_atomic(path, bytes, Some(mode)).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })?;
        self.inner.counters.writes.fetch_add(1, Ordering::Relaxed);

        if bytes.len() < self.inner.options.max_entry_bytes {
            self.inner.write_through(path, Some(bytes.to_vec()));
        } else if self.inner.write_through(path, None) {
            // Oversized payloads must not leave an older, smaller copy behind.
            debug!(path = %path, bytes = bytes.len(), "Dropped cache entry for oversized write");
        }
        Ok(())
    }

    /// Forget the cached copy of `path` so the next read hits disk.
    pub fn invalidate(&self, path: &Utf8Path) {
        if self.inner.remove(path) {
            self.inner
                .counters
                .invalidations
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Whether a live (unexpired) entry exists for `path`.
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.inner.lookup(path, Instant::now()).is_some()
    }

    /// Number of entries currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries now. Returns how many were removed.
    pub fn expire_entries(&self) -> usize {
        self.inner.expire_entries(Instant::now())
    }

    /// Run one sweep synchronously on the calling thread.
    pub fn sweep_now(&self, policy: &SweepPolicy) -> SweepReport {
        crate::sweep::run_sweep(&self.inner, policy)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    /// Start (or restart) the background sweeper with `policy`.
    ///
    /// # Errors
    ///
    /// Fails if the thread cannot be spawned.
    pub fn start_sweeper(&self, policy: SweepPolicy) -> Result<(), StoreError> {
        let mut slot = self.sweeper.lock();
        if let Some(mut running) = slot.take() {
            running.stop();
        }
        let sweeper = Sweeper::spawn(Arc::clone(&self.inner), policy).map_err(|source| {
            StoreError::Io {
                path: "<sweeper>".to_string(),
                source,
            }
        })?;
        *slot = Some(sweeper);
        Ok(())
    }

    #[must_use]
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Signal the sweeper to exit and wait for it. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(mut sweeper) = self.sweeper.lock().take() {
            sweeper.stop();
        }
    }
}

impl Drop for CachedFileStore {
    fn drop(&mut self) {
        self.stop();
    }
}
