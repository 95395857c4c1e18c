use parking_lot::RwLock;
use std::collections::HashMap;

use prdforge_utils::error::WorkflowError;

use crate::model::Project;

/// In-memory map from project id to project, populated lazily from disk.
///
/// A single lock covers lookup and insertion. A miss upgrades to the write
/// lock and re-checks before loading, so two callers racing on the same id
/// load it once.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    projects: RwLock<HashMap<String, Project>>,
}

impl ProjectIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the indexed project, or load it with `load` and index it.
    ///
    /// `load` runs with the write lock held and returns `Ok(None)` when the
    /// project does not exist.
    pub fn get_or_load<F>(&self, id: &str, load: F) -> Result<Option<Project>, WorkflowError>
    where
        F: FnOnce(&str) -> Result<Option<Project>, WorkflowError>,
    {
        if let Some(project) = self.projects.read().get(id) {
            return Ok(Some(project.clone()));
        }

        let mut projects = self.projects.write();
        if let Some(project) = projects.get(id) {
            return Ok(Some(project.clone()));
        }
        match load(id)? {
            Some(project) => {
                projects.insert(id.to_string(), project.clone());
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// Index every id in `ids` that is not indexed yet, skipping ids for
    /// which `load` yields nothing. Returns how many were added.
    pub fn load_missing<I, F>(&self, ids: I, mut load: F) -> usize
    where
        I: IntoIterator<Item = String>,
        F: FnMut(&str) -> Option<Project>,
    {
        let mut projects = self.projects.write();
        let mut added = 0;
        for id in ids {
            if projects.contains_key(&id) {
                continue;
            }
            if let Some(project) = load(&id) {
                projects.insert(id, project);
                added += 1;
            }
        }
        added
    }

    /// Insert or replace.
    pub fn insert(&self, project: Project) {
        self.projects.write().insert(project.id.clone(), project);
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.projects.read().contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of every indexed project, in no particular order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Project> {
        self.projects.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateProjectRequest;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn project(id: &str) -> Project {
        Project::new(id.to_string(), CreateProjectRequest::new(id, "d"), Utc::now())
    }

    #[test]
    fn test_get_or_load_caches_result() {
        let index = ProjectIndex::new();
        let loads = AtomicUsize::new(0);
        let loader = |id: &str| {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, WorkflowError>(Some(project(id)))
        };

        assert!(index.get_or_load("a", loader).unwrap().is_some());
        assert!(index.get_or_load("a", loader).unwrap().is_some());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(index.contains("a"));
    }

    #[test]
    fn test_missing_project_is_not_indexed() {
        let index = ProjectIndex::new();
        assert!(index.get_or_load("x", |_| Ok(None)).unwrap().is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_errors_propagate() {
        let index = ProjectIndex::new();
        let err = index
            .get_or_load("bad", |id| {
                Err(WorkflowError::CorruptProject {
                    id: id.to_string(),
                    reason: "truncated".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, WorkflowError::CorruptProject { .. }));
    }

    #[test]
    fn test_concurrent_misses_load_once() {
        let index = ProjectIndex::new();
        let loads = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    index
                        .get_or_load("shared", |id| {
                            loads.fetch_add(1, Ordering::SeqCst);
                            Ok(Some(project(id)))
                        })
                        .unwrap()
                });
            }
        });
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_missing_skips_known_and_absent() {
        let index = ProjectIndex::new();
        index.insert(project("a"));
        let added = index.load_missing(
            ["a", "b", "c"].map(String::from),
            |id| (id != "c").then(|| project(id)),
        );
        assert_eq!(added, 1);
        assert_eq!(index.len(), 2);
    }
}
