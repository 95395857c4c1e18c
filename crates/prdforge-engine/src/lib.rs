//! Phase workflow engine for prdforge
//!
//! A project moves through three phases: an initial draft, an adversarial
//! review of that draft, and a synthesis of both. Callers paste generated
//! text back through [`WorkflowEngine::submit_phase`]; the engine validates
//! the transition, builds the prompt for the next phase and persists the
//! project JSON plus a timestamped snapshot.
//!
//! # Module Organization
//!
//! - `model.rs`: `Project`, `Phase`, generator identities and derived state
//! - `engine.rs`: the [`WorkflowEngine`] facade
//! - `index.rs`: synchronized in-memory project index with lazy disk load
//! - `locks.rs`: per-project mutexes serializing read-mutate-persist
//! - `prompts.rs`: template lookup over the cached store
//! - `generator.rs`: same-generator detection and prompt augmentation
//! - `document.rs`: snapshot and final-document rendering
//!
//! # Example
//!
//! ```rust,no_run
//! use prdforge_config::Config;
//! use prdforge_engine::{CreateProjectRequest, WorkflowEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::builder().home("/tmp/prdforge").build()?;
//!     let engine = WorkflowEngine::open(&config)?;
//!
//!     let project = engine.create_project(CreateProjectRequest::new(
//!         "Widget",
//!         "Users cannot find widgets",
//!     ))?;
//!     let project = engine.submit_phase(&project.id, 1, "Draft text")?;
//!     assert_eq!(project.current_phase, 2);
//!
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

mod document;
mod engine;
mod generator;
mod index;
mod locks;
mod model;
mod prompts;

pub use document::{file_stamp, render_final_document, render_phase_snapshot};
pub use engine::WorkflowEngine;
pub use generator::{
    PERSONA_BLOCK, RESET_CONTEXT_SENTENCES, augment_for_same_generator, detect_same_generator,
};
pub use index::ProjectIndex;
pub use model::{CreateProjectRequest, GeneratorIdentity, Phase, Project, ProjectState};
pub use prompts::PromptLibrary;
