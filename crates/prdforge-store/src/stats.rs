use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use prdforge_utils::error::StoreError;

/// Statistics for cache performance tracking
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub invalidations: u64,
    pub writes: u64,
}

impl CacheStats {
    /// Calculate cache hit ratio
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Usage summary of an outputs directory.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Number of `.json` project files.
    pub total_projects: usize,
    pub total_files: usize,
    pub disk_usage_bytes: u64,
    pub oldest_file: Option<DateTime<Utc>>,
    pub newest_file: Option<DateTime<Utc>>,
    /// Keyed by extension with its dot (`.md`), or `no_extension`.
    pub files_by_type: BTreeMap<String, usize>,
}

/// Summarize the regular files directly inside `dir`.
///
/// # Errors
///
/// Fails only if `dir` itself cannot be listed; unreadable entries are skipped.
pub fn storage_stats(dir: &Utf8Path) -> Result<StorageStats, StoreError> {
    let listing = std::fs::read_dir(dir).map_err(|e| StoreError::from_io(dir.as_str(), e))?;
    let mut stats = StorageStats::default();

    for dirent in listing.flatten() {
        let Ok(metadata) = dirent.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        stats.total_files += 1;
        stats.disk_usage_bytes += metadata.len();

        let name = dirent.file_name();
        let ext = Utf8Path::new(&name.to_string_lossy().into_owned())
            .extension()
            .map_or_else(|| "no_extension".to_string(), |e| format!(".{e}"));
        if ext == ".json" {
            stats.total_projects += 1;
        }
        *stats.files_by_type.entry(ext).or_default() += 1;

        if let Ok(modified) = metadata.modified() {
            let modified = DateTime::<Utc>::from(modified);
            stats.oldest_file = Some(stats.oldest_file.map_or(modified, |o| o.min(modified)));
            stats.newest_file = Some(stats.newest_file.map_or(modified, |n| n.max(modified)));
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_hit_ratio() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }

    #[test]
    fn test_storage_stats_counts_by_type() {
        let td = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::write(dir.join("a.json"), b"{}").unwrap();
        std::fs::write(dir.join("a_phase1_x.md"), b"hello").unwrap();
        std::fs::write(dir.join("README"), b"r").unwrap();
        std::fs::create_dir(dir.join("sub")).unwrap();

        let stats = storage_stats(&dir).unwrap();

        assert_eq!(stats.total_projects, 1);
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.disk_usage_bytes, 8);
        assert_eq!(stats.files_by_type.get(".md"), Some(&1));
        assert_eq!(stats.files_by_type.get("no_extension"), Some(&1));
        assert!(stats.oldest_file.is_some() && stats.oldest_file <= stats.newest_file);
    }

    #[test]
    fn test_storage_stats_missing_dir() {
        let td = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(td.path().join("missing")).unwrap();
        assert!(storage_stats(&dir).unwrap_err().is_not_found());
    }
}
