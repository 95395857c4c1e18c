//! prdforge - three-phase document workflow with a file-backed cached store
//!
//! A project starts from a title, a problem statement and optional context.
//! It then moves through three phases:
//!
//! 1. **Draft**: a generator writes the first version from a filled-in prompt
//! 2. **Review**: a second generator challenges the draft
//! 3. **Synthesis**: the draft and the review are merged into the final document
//!
//! The operator pastes each generated text back; prdforge validates the
//! transition, prepares the next prompt and persists everything under a home
//! directory:
//!
//! ```text
//! <home>/
//!   inputs/
//!   outputs/<id>.json
//!   outputs/<id>_phase<N>_<YYYY-MM-DD_HH-MM-SS>.md
//!   outputs/<id>_FINAL_<YYYY-MM-DD_HH-MM-SS>.md
//!   prompts/<template>.txt
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use prdforge::{Config, CreateProjectRequest, WorkflowEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::discover()?;
//!     prdforge::init_logging(&config)?;
//!
//!     let engine = WorkflowEngine::open(&config)?;
//!     let project = engine.create_project(CreateProjectRequest::new(
//!         "Widget finder",
//!         "Customers cannot locate widgets in the catalogue",
//!     ))?;
//!     println!("{}", project.phases[0].prompt);
//!
//!     engine.submit_phase(&project.id, 1, "...draft pasted back...")?;
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Stable Public API
//!
//! - [`WorkflowEngine`], [`Project`], [`Phase`], [`CreateProjectRequest`]
//! - [`Config`] and [`ConfigBuilder`]
//! - [`CachedFileStore`] with [`CacheOptions`] and [`SweepPolicy`]
//! - [`WorkflowError`], [`ErrorKind`] and [`ForgeError`]
//! - [`PhaseId`]
//!
//! Member crates remain reachable through their own names but are not
//! covered by semver guarantees.

// ============================================================================
// Stable Public API - covered by semver guarantees for 1.x
// ============================================================================

/// Workflow engine and its data model.
pub use prdforge_engine::{
    CreateProjectRequest, GeneratorIdentity, Phase, Project, ProjectState, WorkflowEngine,
};

/// Same-generator detection and review prompt augmentation.
pub use prdforge_engine::{augment_for_same_generator, detect_same_generator};

/// Phase identifiers: Draft, Review, Synthesis.
pub use prdforge_utils::types::PhaseId;

/// Configuration with discovery (`.prdforge/config.toml`) and a builder.
pub use prdforge_config::{Config, ConfigBuilder};

/// File-backed cache usable on its own.
pub use prdforge_store::{
    CacheOptions, CacheStats, CachedFileStore, StorageStats, SweepPolicy, SweepReport,
};

/// Error types. `WorkflowError::kind()` yields the [`ErrorKind`] transports
/// dispatch on; [`ForgeError::display_for_user`] renders operator-facing text.
pub use prdforge_utils::error::{ErrorKind, ForgeError, UserFriendlyError, WorkflowError};

/// Prompt templates and placeholder substitution.
pub use prdforge_prompt_template::{Placeholder, PromptTemplate, substitute};

/// Install the global tracing subscriber described by `config.logging`.
///
/// `RUST_LOG` overrides the level derived from `verbose`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &Config) -> anyhow::Result<()> {
    prdforge_utils::logging::init_tracing(config.logging.verbose, config.logging.format)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
    tracing::debug!(source = ?config.source, "Logging initialized");
    Ok(())
}
