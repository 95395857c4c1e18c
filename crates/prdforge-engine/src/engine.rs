use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use prdforge_config::Config;
use prdforge_store::{
    CacheOptions, CacheStats, CachedFileStore, DEFAULT_FILE_MODE, StorageStats, SweepPolicy,
    storage_stats,
};
use prdforge_utils::error::{StoreError, WorkflowError};
use prdforge_utils::logging::{log_phase_submitted, log_project_created, project_span};
use prdforge_utils::paths::Layout;
use prdforge_utils::types::PhaseId;

use crate::document::{file_stamp, render_final_document, render_phase_snapshot};
use crate::index::ProjectIndex;
use crate::locks::ProjectLocks;
use crate::model::{CreateProjectRequest, Project};
use crate::prompts::PromptLibrary;

static PROJECT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid regex"));

/// Owns the project index, the cached store and the prompt library.
///
/// All methods take `&self`; share the engine across threads behind an
/// `Arc`. Submissions to one project are serialized, submissions to
/// different projects run concurrently.
#[derive(Debug)]
pub struct WorkflowEngine {
    layout: Layout,
    store: Arc<CachedFileStore>,
    prompts: PromptLibrary,
    index: ProjectIndex,
    locks: ProjectLocks,
}

impl WorkflowEngine {
    /// Prepare the home directory layout and start the store (and its
    /// sweeper, when enabled).
    ///
    /// # Errors
    ///
    /// [`WorkflowError::Io`] if a directory cannot be created or written, or
    /// the sweeper thread cannot be spawned.
    pub fn open(config: &Config) -> Result<Self, WorkflowError> {
        let layout = config.layout();
        layout
            .prepare()
            .map_err(|e| StoreError::from_io(layout.root().as_str(), e))?;

        let store = Arc::new(CachedFileStore::new(CacheOptions {
            max_entries: config.cache.max_entries,
            ttl: config.cache_ttl(),
            max_entry_bytes: config.cache.max_entry_bytes,
        }));
        if config.sweep.enabled {
            store.start_sweeper(SweepPolicy {
                interval: config.sweep_interval(),
                directory: layout.outputs_dir(),
                retention: config.retention(),
                extension: config.sweep.extension.clone(),
            })?;
        }

        info!(home = %layout.root(), sweeping = config.sweep.enabled, "Workflow engine ready");
        Ok(Self {
            prompts: PromptLibrary::new(Arc::clone(&store), layout.clone()),
            layout,
            store,
            index: ProjectIndex::new(),
            locks: ProjectLocks::new(),
        })
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[must_use]
    pub fn store(&self) -> &CachedFileStore {
        &self.store
    }

    #[must_use]
    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    /// Create a project in phase 1 with its draft prompt filled in.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::Io`] if the project file cannot be written.
    pub fn create_project(&self, request: CreateProjectRequest) -> Result<Project, WorkflowError> {
        let id = Uuid::new_v4().to_string();
        let mut project = Project::new(id, request, Utc::now());
        project.phase_mut(PhaseId::Draft).prompt = self.prompts.render(&project, PhaseId::Draft)?;

        self.persist_project(&project)?;
        self.index.insert(project.clone());
        log_project_created(&project.id, &project.title);
        Ok(project)
    }

    /// Record `content` as the output of phase `phase_number` and advance.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NotFound`] for unknown or malformed ids
    /// - [`WorkflowError::InvalidPhase`] for numbers outside 1 to 3, or when an
    ///   earlier phase has no content yet
    /// - [`WorkflowError::EmptyContent`] for blank content
    /// - [`WorkflowError::Io`] if persisting fails; the project file and the
    ///   index then both keep the previous state
    pub fn submit_phase(
        &self,
        project_id: &str,
        phase_number: u32,
        content: &str,
    ) -> Result<Project, WorkflowError> {
        let span = project_span(project_id, phase_number);
        let _enter = span.enter();

        self.find(project_id)?;
        let phase = PhaseId::from_number(phase_number).ok_or_else(|| {
            WorkflowError::InvalidPhase {
                phase: phase_number,
                reason: "phase must be 1, 2 or 3".to_string(),
            }
        })?;
        if content.trim().is_empty() {
            return Err(WorkflowError::EmptyContent {
                phase: phase_number,
            });
        }

        let lock = self.locks.lock_for(project_id);
        let _guard = lock.lock();
        let mut project = self.find(project_id)?;

        if let Some(missing) = project.missing_predecessors(phase).first() {
            return Err(WorkflowError::InvalidPhase {
                phase: phase_number,
                reason: format!("phase {} has no content yet", missing.number()),
            });
        }

        let now = Utc::now();
        let record = project.phase_mut(phase);
        record.content = content.to_string();
        record.completed_at = Some(now);
        project.updated_at = now;

        if let Some(next) = phase.next() {
            project.phase_mut(next).prompt = self.prompts.render(&project, next)?;
        }
        let reached = phase.next().unwrap_or(phase).number();
        project.current_phase = project.current_phase.max(reached);

        // Artifacts first, project JSON last: a failure anywhere leaves the
        // project file and the index at the previous state.
        let stamp = file_stamp(now);
        self.store.write(
            &self
                .layout
                .phase_snapshot_file(&project.id, phase.number(), &stamp),
            render_phase_snapshot(&project, phase, now).as_bytes(),
            DEFAULT_FILE_MODE,
        )?;
        if phase == PhaseId::Synthesis {
            let document = render_final_document(&project, now)?;
            self.store.write(
                &self.layout.final_document_file(&project.id, &stamp),
                document.as_bytes(),
                DEFAULT_FILE_MODE,
            )?;
            info!(project_id = %project.id, "Final document written");
        }
        self.persist_project(&project)?;

        self.index.insert(project.clone());
        log_phase_submitted(&project.id, phase.number(), content.len());
        Ok(project)
    }

    /// Fill empty prompts whose prerequisite phases have content. Never
    /// touches a non-empty prompt. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Propagates template resolution failures.
    pub fn ensure_prompts_populated(&self, project: &mut Project) -> Result<bool, WorkflowError> {
        let pending = backfill_candidates(project);
        for phase in &pending {
            project.phase_mut(*phase).prompt = self.prompts.render(project, *phase)?;
            debug!(project_id = %project.id, phase = phase.number(), "Backfilled prompt");
        }
        Ok(!pending.is_empty())
    }

    /// Look up a project, loading it from disk on first access. Missing
    /// prompts are backfilled and persisted.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::NotFound`] if no such project exists,
    /// [`WorkflowError::CorruptProject`] if its file cannot be parsed.
    pub fn get_project(&self, project_id: &str) -> Result<Project, WorkflowError> {
        let project = self.find(project_id)?;
        if backfill_candidates(&project).is_empty() {
            return Ok(project);
        }

        let lock = self.locks.lock_for(project_id);
        let _guard = lock.lock();
        let mut project = self.find(project_id)?;
        if self.ensure_prompts_populated(&mut project)? {
            self.persist_project(&project)?;
            self.index.insert(project.clone());
        }
        Ok(project)
    }

    /// Every known project, newest first. Project files on disk that are not
    /// indexed yet are loaded; unreadable ones are skipped with a warning.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::Io`] if the outputs directory exists but cannot be
    /// listed.
    pub fn list_projects(&self) -> Result<Vec<Project>, WorkflowError> {
        let outputs = self.layout.outputs_dir();
        let ids: Vec<String> = match std::fs::read_dir(&outputs) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter_map(|entry| {
                    let name = entry.file_name().into_string().ok()?;
                    let id = name.strip_suffix(".json")?;
                    is_valid_project_id(id).then(|| id.to_string())
                })
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::from_io(outputs.as_str(), e).into()),
        };

        let added = self.index.load_missing(ids, |id| match self.load_from_disk(id) {
            Ok(project) => project,
            Err(e) => {
                warn!(project_id = %id, error = %e, "Skipping unreadable project file");
                None
            }
        });
        if added > 0 {
            debug!(added, "Indexed projects found on disk");
        }

        let mut projects = self.index.snapshot();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }

    /// Render the final document for a completed project without writing it.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::NotReady`] until phase 3 has content.
    pub fn final_document(&self, project_id: &str) -> Result<String, WorkflowError> {
        let project = self.find(project_id)?;
        render_final_document(&project, Utc::now())
    }

    /// Effective text of a prompt template.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownTemplate`] for unknown names.
    pub fn prompt_template(&self, name: &str) -> Result<String, WorkflowError> {
        self.prompts.get(name)
    }

    /// Overwrite a prompt template file.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownTemplate`] for unknown names,
    /// [`WorkflowError::Io`] if the write fails.
    pub fn update_prompt_template(&self, name: &str, text: &str) -> Result<(), WorkflowError> {
        self.prompts.update(name, text)
    }

    /// File statistics for the outputs directory.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::Io`] if the directory cannot be scanned.
    pub fn storage_stats(&self) -> Result<StorageStats, WorkflowError> {
        Ok(storage_stats(&self.layout.outputs_dir())?)
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Stop the background sweeper. Safe to call more than once.
    pub fn shutdown(&self) {
        self.store.stop();
        info!("Workflow engine stopped");
    }

    fn find(&self, project_id: &str) -> Result<Project, WorkflowError> {
        let not_found = || WorkflowError::NotFound {
            id: project_id.to_string(),
        };
        if !is_valid_project_id(project_id) {
            return Err(not_found());
        }
        self.index
            .get_or_load(project_id, |id| self.load_from_disk(id))?
            .ok_or_else(not_found)
    }

    fn load_from_disk(&self, project_id: &str) -> Result<Option<Project>, WorkflowError> {
        let path = self.layout.project_file(project_id);
        let bytes = match self.store.read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let project: Project =
            serde_json::from_slice(&bytes).map_err(|e| WorkflowError::CorruptProject {
                id: project_id.to_string(),
                reason: e.to_string(),
            })?;
        debug!(project_id, "Loaded project from disk");
        Ok(Some(project))
    }

    fn persist_project(&self, project: &Project) -> Result<(), WorkflowError> {
        let json =
            serde_json::to_vec_pretty(project).map_err(|e| WorkflowError::CorruptProject {
                id: project.id.clone(),
                reason: e.to_string(),
            })?;
        self.store.write(
            &self.layout.project_file(&project.id),
            &json,
            DEFAULT_FILE_MODE,
        )?;
        Ok(())
    }
}

fn is_valid_project_id(id: &str) -> bool {
    PROJECT_ID_RE.is_match(id)
}

fn backfill_candidates(project: &Project) -> Vec<PhaseId> {
    PhaseId::ALL
        .into_iter()
        .filter(|phase| {
            project.phase(*phase).prompt.is_empty() && project.missing_predecessors(*phase).is_empty()
        })
        .collect()
}
