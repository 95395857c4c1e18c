use std::fmt;
use std::io;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `ForgeError` aggregates the error types of every prdforge layer. Each layer
/// returns its own enum (`StoreError`, `WorkflowError`, ...) so callers can
/// match precisely; `ForgeError` exists for code that drives several layers
/// at once and wants a single type plus [`display_for_user()`](Self::display_for_user).
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Configuration` | Configuration file or value errors |
/// | `FileSystem` | Disk reads, writes and directory preparation |
/// | `Workflow` | Illegal phase transitions and missing projects |
/// | `Template` | Prompt template lookup errors |
///
/// # Example
///
/// ```rust
/// use prdforge_utils::error::{ForgeError, WorkflowError};
///
/// let err = ForgeError::from(WorkflowError::EmptyContent { phase: 2 });
/// let message = err.display_for_user();
/// assert!(message.contains("Suggestions:"));
/// ```
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    FileSystem,
    Workflow,
    Template,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::FileSystem => write!(f, "File System"),
            Self::Workflow => write!(f, "Workflow"),
            Self::Template => write!(f, "Template"),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [paths], [cache], [sweep] and [logging] sections."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific range requirements."
            )),
            Self::NotFound { .. } => Some(
                "prdforge searches for .prdforge/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Remove unknown keys or sections from the file".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "cache.max_entries" => {
                    vec!["Use a positive entry count such as 100".to_string()]
                }
                "cache.ttl_secs" | "sweep.interval_secs" => {
                    vec!["Use a positive number of seconds".to_string()]
                }
                "sweep.retention_days" => {
                    vec!["Use a retention window of at least one day".to_string()]
                }
                _ => vec![
                    "Remove the option to use the default value".to_string(),
                    "Check the documentation for valid values for this option".to_string(),
                ],
            },
            Self::NotFound { .. } => vec![
                "Create .prdforge/config.toml in your project root".to_string(),
                "Rely on built-in defaults by omitting the explicit path".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

// ============================================================================
// Store
// ============================================================================

/// Errors raised by the file-backed cached store.
///
/// The store never retries; a disk failure is reported as-is.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Classify an `io::Error` for `path`, promoting `NotFound` to its own variant.
    #[must_use]
    pub fn from_io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl UserFriendlyError for StoreError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { path } => format!("File does not exist: {path}"),
            Self::Io { path, source } => format!("Could not access {path}: {source}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some("Projects, snapshots and prompt templates live under the prdforge home directory.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => vec![
                "Check that PRDFORGE_HOME points at the expected directory".to_string(),
            ],
            Self::Io { .. } => vec![
                "Check file permissions and available disk space".to_string(),
                "Ensure the outputs/ and prompts/ directories are writable".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Prompt template errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown prompt template '{name}'")]
    UnknownName { name: String },
}

impl UserFriendlyError for TemplateError {
    fn user_message(&self) -> String {
        match self {
            Self::UnknownName { name } => format!("'{name}' is not a prompt template"),
        }
    }

    fn context(&self) -> Option<String> {
        Some("Prompt templates are stored as prompts/<name>.txt under the prdforge home.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        vec![
            "Use one of: claude_initial, gemini_review, claude_compare".to_string(),
            "The phase1-claude-initial, phase2-gemini-review and phase3-claude-synthesis names are also accepted".to_string(),
        ]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Template
    }
}

// ============================================================================
// Workflow
// ============================================================================

/// Coarse classification of a [`WorkflowError`] for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidPhase,
    EmptyContent,
    Io,
    TemplateMissing,
    NotReady,
    InvalidInput,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidPhase => "invalid_phase",
            Self::EmptyContent => "empty_content",
            Self::Io => "io_error",
            Self::TemplateMissing => "template_missing",
            Self::NotReady => "not_ready",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the phase workflow engine.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Project {id} not found")]
    NotFound { id: String },

    #[error("Invalid phase {phase}: {reason}")]
    InvalidPhase { phase: u32, reason: String },

    #[error("Content for phase {phase} is empty")]
    EmptyContent { phase: u32 },

    #[error(transparent)]
    Io(#[from] StoreError),

    #[error("No template available for '{name}'")]
    TemplateMissing { name: String },

    #[error("Final document for project {id} is not ready")]
    NotReady { id: String },

    #[error("Unknown prompt template '{name}'")]
    UnknownTemplate { name: String },

    #[error("Project {id} could not be (de)serialized: {reason}")]
    CorruptProject { id: String, reason: String },
}

impl WorkflowError {
    /// Map this error onto the kind a transport layer dispatches on.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidPhase { .. } => ErrorKind::InvalidPhase,
            Self::EmptyContent { .. } => ErrorKind::EmptyContent,
            Self::Io(_) | Self::CorruptProject { .. } => ErrorKind::Io,
            Self::TemplateMissing { .. } => ErrorKind::TemplateMissing,
            Self::NotReady { .. } => ErrorKind::NotReady,
            Self::UnknownTemplate { .. } => ErrorKind::InvalidInput,
        }
    }
}

impl From<TemplateError> for WorkflowError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::UnknownName { name } => Self::UnknownTemplate { name },
        }
    }
}

impl UserFriendlyError for WorkflowError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { id } => format!("No project with id '{id}' exists"),
            Self::InvalidPhase { phase, reason } => {
                format!("Phase {phase} cannot be submitted: {reason}")
            }
            Self::EmptyContent { phase } => {
                format!("Phase {phase} content must not be blank")
            }
            Self::Io(store) => store.user_message(),
            Self::TemplateMissing { name } => format!("Prompt template '{name}' is missing"),
            Self::NotReady { id } => {
                format!("Project '{id}' has no synthesis content yet")
            }
            Self::UnknownTemplate { name } => format!("'{name}' is not a prompt template"),
            Self::CorruptProject { id, reason } => {
                format!("Project file for '{id}' is unreadable: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidPhase { .. } => Some(
                "Phases are numbered 1 to 3 and must be completed in order.".to_string(),
            ),
            Self::NotReady { .. } => Some(
                "The final document is assembled only after phase 3 content is submitted."
                    .to_string(),
            ),
            Self::Io(store) => store.context(),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => vec![
                "List projects to find a valid id".to_string(),
                "Check that outputs/<id>.json exists".to_string(),
            ],
            Self::InvalidPhase { .. } => vec![
                "Submit the earlier phases first".to_string(),
            ],
            Self::EmptyContent { .. } => vec![
                "Paste the generated text before submitting".to_string(),
            ],
            Self::Io(store) => store.suggestions(),
            Self::CorruptProject { .. } => vec![
                "Restore the project JSON from a backup or fix it by hand".to_string(),
            ],
            Self::UnknownTemplate { .. } => vec![
                "Use one of: claude_initial, gemini_review, claude_compare".to_string(),
            ],
            Self::TemplateMissing { .. } | Self::NotReady { .. } => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) | Self::CorruptProject { .. } => ErrorCategory::FileSystem,
            Self::TemplateMissing { .. } | Self::UnknownTemplate { .. } => ErrorCategory::Template,
            _ => ErrorCategory::Workflow,
        }
    }
}

// ============================================================================
// ForgeError
// ============================================================================

impl UserFriendlyError for ForgeError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Store(e) => e.user_message(),
            Self::Workflow(e) => e.user_message(),
            Self::Template(e) => e.user_message(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Store(e) => e.context(),
            Self::Workflow(e) => e.context(),
            Self::Template(e) => e.context(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Store(e) => e.suggestions(),
            Self::Workflow(e) => e.suggestions(),
            Self::Template(e) => e.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Store(e) => e.category(),
            Self::Workflow(e) => e.category(),
            Self::Template(e) => e.category(),
        }
    }
}

impl ForgeError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }
}
