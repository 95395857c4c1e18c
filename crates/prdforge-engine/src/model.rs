use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use prdforge_utils::types::PhaseId;

/// Identity of the generator (model deployment) that produced a phase.
///
/// Every field is optional free text; an empty string means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorIdentity {
    pub provider: String,
    pub model: String,
    pub url: String,
    pub endpoint: String,
}

impl GeneratorIdentity {
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// One stage of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, deserialize_with = "deserialize_completed_at")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Phase {
    /// Empty phase named for its stage.
    #[must_use]
    pub fn empty(id: PhaseId) -> Self {
        Self {
            number: id.number(),
            name: id.default_name().to_string(),
            content: String::new(),
            prompt: String::new(),
            completed_at: None,
        }
    }

    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

// Older project files carry `0001-01-01T00:00:00Z` for "never completed".
fn deserialize_completed_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(value.filter(|ts| ts.year() > 1))
}

/// A document moving through draft, review and synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Extra material supplied at creation, kept for prompt backfill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Highest phase the project has reached (1 to 3).
    #[serde(rename = "phase")]
    pub current_phase: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub phases: [Phase; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase1_llm: Option<GeneratorIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase2_llm: Option<GeneratorIdentity>,
}

impl Project {
    /// Fresh project in phase 1 with three empty phases.
    #[must_use]
    pub fn new(id: String, request: CreateProjectRequest, now: DateTime<Utc>) -> Self {
        let context = Some(request.context).filter(|c| !c.is_empty());
        Self {
            id,
            title: request.title,
            description: request.description,
            context,
            current_phase: PhaseId::Draft.number(),
            created_at: now,
            updated_at: now,
            phases: PhaseId::ALL.map(Phase::empty),
            phase1_llm: request.phase1_llm,
            phase2_llm: request.phase2_llm,
        }
    }

    #[must_use]
    pub fn phase(&self, id: PhaseId) -> &Phase {
        &self.phases[id.index()]
    }

    pub fn phase_mut(&mut self, id: PhaseId) -> &mut Phase {
        &mut self.phases[id.index()]
    }

    #[must_use]
    pub fn context_str(&self) -> &str {
        self.context.as_deref().unwrap_or_default()
    }

    /// Derived workflow state.
    #[must_use]
    pub fn state(&self) -> ProjectState {
        match PhaseId::ALL.into_iter().find(|id| !self.phase(*id).has_content()) {
            Some(PhaseId::Draft) => ProjectState::AwaitingPhase1,
            Some(PhaseId::Review) => ProjectState::AwaitingPhase2,
            Some(PhaseId::Synthesis) => ProjectState::AwaitingPhase3,
            None => ProjectState::Complete,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase(PhaseId::Synthesis).has_content()
    }

    /// Phases before `id` that still have no content.
    #[must_use]
    pub fn missing_predecessors(&self, id: PhaseId) -> Vec<PhaseId> {
        id.predecessors()
            .iter()
            .copied()
            .filter(|p| !self.phase(*p).has_content())
            .collect()
    }

    /// Whether the draft and review were produced by the same generator.
    #[must_use]
    pub fn same_generator(&self) -> bool {
        crate::generator::detect_same_generator(
            self.phase1_llm.as_ref(),
            self.phase2_llm.as_ref(),
        )
    }
}

/// Where a project stands in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectState {
    AwaitingPhase1,
    AwaitingPhase2,
    AwaitingPhase3,
    Complete,
}

/// Input to [`crate::WorkflowEngine::create_project`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateProjectRequest {
    pub title: String,
    /// Problem statement. Accepts `problems` for older clients.
    #[serde(alias = "problems")]
    pub description: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase1_llm: Option<GeneratorIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_llm: Option<GeneratorIdentity>,
}

impl CreateProjectRequest {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    #[must_use]
    pub fn with_generators(
        mut self,
        phase1: Option<GeneratorIdentity>,
        phase2: Option<GeneratorIdentity>,
    ) -> Self {
        self.phase1_llm = phase1;
        self.phase2_llm = phase2;
        self
    }
}
