//! Prompt templates for the three prdforge phases
//!
//! Each phase has one editable template, stored as `prompts/<name>.txt`.
//! Files are looked up under their current name first and their legacy name
//! second; when neither exists the compiled-in default is used, so resolving
//! a phase template never fails.

mod defaults;
mod placeholder;

pub use placeholder::{Placeholder, fill_positional, substitute, unknown_placeholders};

use prdforge_utils::error::TemplateError;
use prdforge_utils::types::PhaseId;

/// The editable template for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptTemplate {
    /// Builds the draft prompt from title, problems and context.
    Draft,
    /// Asks a reviewer to challenge the draft.
    Review,
    /// Asks for a synthesis of the draft and the review.
    Synthesis,
}

impl PromptTemplate {
    pub const ALL: [PromptTemplate; 3] = [Self::Draft, Self::Review, Self::Synthesis];

    /// Template used to build the prompt *for* `phase`.
    #[must_use]
    pub const fn for_phase(phase: PhaseId) -> Self {
        match phase {
            PhaseId::Draft => Self::Draft,
            PhaseId::Review => Self::Review,
            PhaseId::Synthesis => Self::Synthesis,
        }
    }

    #[must_use]
    pub const fn phase(self) -> PhaseId {
        match self {
            Self::Draft => PhaseId::Draft,
            Self::Review => PhaseId::Review,
            Self::Synthesis => PhaseId::Synthesis,
        }
    }

    /// Current file stem, e.g. `phase2-gemini-review`.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Draft => "phase1-claude-initial",
            Self::Review => "phase2-gemini-review",
            Self::Synthesis => "phase3-claude-synthesis",
        }
    }

    /// Legacy file stem, also the public name used by prompt editors.
    #[must_use]
    pub const fn legacy_name(self) -> &'static str {
        match self {
            Self::Draft => "claude_initial",
            Self::Review => "gemini_review",
            Self::Synthesis => "claude_compare",
        }
    }

    /// File stems to try, in order, before falling back to the default.
    #[must_use]
    pub const fn lookup_names(self) -> [&'static str; 2] {
        [self.file_name(), self.legacy_name()]
    }

    /// Compiled-in default text.
    #[must_use]
    pub const fn default_text(self) -> &'static str {
        match self {
            Self::Draft => defaults::DRAFT,
            Self::Review => defaults::REVIEW,
            Self::Synthesis => defaults::SYNTHESIS,
        }
    }

    /// Parse either the legacy or the current template name.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownName`] for anything else.
    pub fn parse(s: &str) -> Result<Self, TemplateError> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.legacy_name() == trimmed || t.file_name() == trimmed)
            .ok_or_else(|| TemplateError::UnknownName {
                name: s.to_string(),
            })
    }

    /// Render the draft prompt.
    ///
    /// Templates using `%s` slots are filled positionally with title,
    /// problems and context; all others use named placeholders.
    #[must_use]
    pub fn render_draft(template: &str, title: &str, problems: &str, context: &str) -> String {
        if template.contains("%s") {
            fill_positional(template, &[title, problems, context])
        } else {
            substitute(
                template,
                &[
                    (Placeholder::Title, title),
                    (Placeholder::Problems, problems),
                    (Placeholder::Context, context),
                ],
            )
        }
    }

    /// Render the review prompt from the draft content.
    #[must_use]
    pub fn render_review(template: &str, draft: &str) -> String {
        substitute(template, &[(Placeholder::DraftOutput, draft)])
    }

    /// Render the synthesis prompt from the draft and review content.
    #[must_use]
    pub fn render_synthesis(template: &str, draft: &str, review: &str) -> String {
        substitute(
            template,
            &[
                (Placeholder::DraftOutput, draft),
                (Placeholder::ReviewOutput, review),
            ],
        )
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.legacy_name())
    }
}
