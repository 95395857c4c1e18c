use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one of the three workflow phases.
///
/// Phases run strictly in order: a draft, an adversarial review of that
/// draft, then a synthesis of both. All ordinal and index arithmetic lives
/// here so callers never compute `n - 1` themselves.
///
/// ```rust
/// use prdforge_utils::types::PhaseId;
///
/// let phase = PhaseId::from_number(2).unwrap();
/// assert_eq!(phase, PhaseId::Review);
/// assert_eq!(phase.index(), 1);
/// assert_eq!(phase.next(), Some(PhaseId::Synthesis));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseId {
    /// Initial draft written from the title, problems and context.
    Draft,
    /// Adversarial review of the draft.
    Review,
    /// Synthesis of the draft and the review into the final document.
    Synthesis,
}

impl PhaseId {
    pub const ALL: [PhaseId; 3] = [Self::Draft, Self::Review, Self::Synthesis];

    /// 1-based phase number as persisted and shown to operators.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::Draft => 1,
            Self::Review => 2,
            Self::Synthesis => 3,
        }
    }

    /// 0-based position in a project's phase array.
    #[must_use]
    pub const fn index(self) -> usize {
        self.number() as usize - 1
    }

    #[must_use]
    pub const fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::Draft),
            2 => Some(Self::Review),
            3 => Some(Self::Synthesis),
            _ => None,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Review),
            Self::Review => Some(Self::Synthesis),
            Self::Synthesis => None,
        }
    }

    /// Phases whose content must exist before this phase may be submitted.
    #[must_use]
    pub const fn predecessors(self) -> &'static [PhaseId] {
        match self {
            Self::Draft => &[],
            Self::Review => &[Self::Draft],
            Self::Synthesis => &[Self::Draft, Self::Review],
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Synthesis => "synthesis",
        }
    }

    /// Human label given to the phase when a project is created.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Draft => "Initial Draft",
            Self::Review => "Adversarial Review",
            Self::Synthesis => "Final Synthesis",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase {} ({})", self.number(), self.as_str())
    }
}
