use std::sync::Arc;
use tracing::{debug, warn};

use prdforge_prompt_template::{PromptTemplate, unknown_placeholders};
use prdforge_store::{CachedFileStore, DEFAULT_FILE_MODE};
use prdforge_utils::error::WorkflowError;
use prdforge_utils::paths::Layout;
use prdforge_utils::types::PhaseId;

use crate::generator::augment_for_same_generator;
use crate::model::Project;

/// Editable prompt templates stored under `prompts/`, read through the cache.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    store: Arc<CachedFileStore>,
    layout: Layout,
}

impl PromptLibrary {
    #[must_use]
    pub fn new(store: Arc<CachedFileStore>, layout: Layout) -> Self {
        Self { store, layout }
    }

    /// Effective text of `template`: the current file, the legacy file, then
    /// the compiled-in default. Blank files count as absent.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::TemplateMissing`] if no source yields any text.
    pub fn load(&self, template: PromptTemplate) -> Result<String, WorkflowError> {
        for name in template.lookup_names() {
            let path = self.layout.prompt_file(name);
            match self.store.read_to_string(&path) {
                Ok(text) if !text.trim().is_empty() => {
                    let unknown = unknown_placeholders(&text);
                    if !unknown.is_empty() {
                        warn!(
                            template = name,
                            placeholders = ?unknown,
                            "Prompt template contains unrecognized placeholders"
                        );
                    }
                    return Ok(text);
                }
                Ok(_) => debug!(path = %path, "Ignoring blank prompt template"),
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(path = %path, error = %e, "Failed to read prompt template"),
            }
        }

        debug!(template = %template, "Using built-in prompt template");
        let text = template.default_text();
        if text.trim().is_empty() {
            return Err(WorkflowError::TemplateMissing {
                name: template.legacy_name().to_string(),
            });
        }
        Ok(text.to_string())
    }

    /// Effective text for a template named by its legacy or current name.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownTemplate`] for names that are not templates.
    pub fn get(&self, name: &str) -> Result<String, WorkflowError> {
        let template = PromptTemplate::parse(name)?;
        self.load(template)
    }

    /// Overwrite the template file for `name` (always under its current name,
    /// which takes precedence over the legacy file on lookup).
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownTemplate`] for unknown names,
    /// [`WorkflowError::Io`] if the write fails.
    pub fn update(&self, name: &str, text: &str) -> Result<(), WorkflowError> {
        let template = PromptTemplate::parse(name)?;
        let path = self.layout.prompt_file(template.file_name());
        self.store.write(&path, text.as_bytes(), DEFAULT_FILE_MODE)?;
        debug!(template = %template, path = %path, "Prompt template updated");
        Ok(())
    }

    /// Build the prompt shown to the operator for `phase` of `project`.
    ///
    /// The review prompt gets the adversarial persona when the draft and the
    /// review generators are the same.
    ///
    /// # Errors
    ///
    /// Propagates [`PromptLibrary::load`] failures.
    pub fn render(&self, project: &Project, phase: PhaseId) -> Result<String, WorkflowError> {
        let template = PromptTemplate::for_phase(phase);
        let text = self.load(template)?;
        let draft = &project.phase(PhaseId::Draft).content;

        Ok(match phase {
            PhaseId::Draft => PromptTemplate::render_draft(
                &text,
                &project.title,
                &project.description,
                project.context_str(),
            ),
            PhaseId::Review => {
                let prompt = PromptTemplate::render_review(&text, draft);
                if project.same_generator() {
                    augment_for_same_generator(&prompt)
                } else {
                    prompt
                }
            }
            PhaseId::Synthesis => PromptTemplate::render_synthesis(
                &text,
                draft,
                &project.phase(PhaseId::Review).content,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateProjectRequest, GeneratorIdentity};
    use camino::Utf8PathBuf;
    use chrono::Utc;
    use prdforge_store::CacheOptions;
    use tempfile::TempDir;

    fn library() -> (TempDir, PromptLibrary) {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let layout = Layout::new(root);
        layout.prepare().unwrap();
        let store = Arc::new(CachedFileStore::new(CacheOptions::default()));
        (dir, PromptLibrary::new(store, layout))
    }

    fn project() -> Project {
        Project::new(
            "p".to_string(),
            CreateProjectRequest::new("Widget", "Lost widgets").with_context("Retail"),
            Utc::now(),
        )
    }

    #[test]
    fn test_defaults_when_no_files() {
        let (_dir, lib) = library();
        for template in PromptTemplate::ALL {
            assert_eq!(lib.load(template).unwrap(), template.default_text());
        }
    }

    #[test]
    fn test_legacy_file_then_current_file() {
        let (_dir, lib) = library();
        std::fs::write(lib.layout.prompt_file("gemini_review"), "legacy {phase1Output}").unwrap();
        assert_eq!(lib.get("gemini_review").unwrap(), "legacy {phase1Output}");

        lib.update("gemini_review", "current {phase1Output}").unwrap();
        assert_eq!(lib.get("phase2-gemini-review").unwrap(), "current {phase1Output}");
        assert!(lib.layout.prompt_file("phase2-gemini-review").exists());
    }

    #[test]
    fn test_unknown_name() {
        let (_dir, lib) = library();
        let err = lib.get("nope").unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownTemplate { ref name } if name == "nope"));
        assert!(lib.update("nope", "x").is_err());
    }

    #[test]
    fn test_render_draft_positional_and_named() {
        let (_dir, lib) = library();
        lib.update("claude_initial", "T=%s P=%s C=%s").unwrap();
        assert_eq!(
            lib.render(&project(), PhaseId::Draft).unwrap(),
            "T=Widget P=Lost widgets C=Retail"
        );

        lib.update("claude_initial", "{title}|{{PROBLEMS}}|{context}").unwrap();
        assert_eq!(
            lib.render(&project(), PhaseId::Draft).unwrap(),
            "Widget|Lost widgets|Retail"
        );
    }

    #[test]
    fn test_review_augmented_only_for_same_generator() {
        let (_dir, lib) = library();
        let mut p = project();
        p.phase_mut(PhaseId::Draft).content = "C1".into();

        let plain = lib.render(&p, PhaseId::Review).unwrap();
        assert!(plain.contains("C1"));
        assert!(!plain.contains("ADVERSARIAL REVIEWER ROLE"));

        let same = GeneratorIdentity::new("anthropic", "m");
        p.phase1_llm = Some(same.clone());
        p.phase2_llm = Some(same);
        let augmented = lib.render(&p, PhaseId::Review).unwrap();
        assert!(augmented.contains("ADVERSARIAL REVIEWER ROLE"));
        assert!(augmented.contains("C1"));
    }
}
