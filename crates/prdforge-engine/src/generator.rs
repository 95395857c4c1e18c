//! Same-generator detection for the review phase
//!
//! When the draft and the review come from the same model deployment the
//! review tends to agree with itself. The review prompt then gets a persona
//! block asking for a deliberately adversarial reading.

use tracing::{debug, warn};

use crate::model::GeneratorIdentity;

/// Reset-context sentences recognized in review templates, tried in order.
pub const RESET_CONTEXT_SENTENCES: [&str; 2] = [
    "Forget all previous sessions and context.",
    "Forget our previous sessions-- start fresh with me.",
];

/// Persona block inserted into the review prompt for same-generator projects.
pub const PERSONA_BLOCK: &str = "
## ADVERSARIAL REVIEWER ROLE (INDEPENDENT-MODEL SIMULATION)

You are now operating as an independent analytical reviewer with no stake in the draft below. Drop the conversational style you used to write it and take on a rigorous, constructively adversarial stance:

**REVIEWER PROFILE**:
- Analytical and precision-focused
- Skeptical of every claim that lacks support
- Quick to name hidden assumptions
- Systematic about gaps and contradictions
- Professional, but thorough to the point of discomfort

**YOUR MISSION**:
Read the document as if you are required to find every weakness, inconsistency, unsupported assumption, ambiguous phrase or contradiction it contains.

**HOW TO REVIEW**:
1. **Skeptical Precision**: treat each requirement as unproven until justified
2. **Evidence Demands**: question assertions with no supporting data
3. **Assumption Challenges**: surface and probe what the author took for granted
4. **Logic Gaps**: point out incomplete reasoning and missing steps
5. **Clarity Demands**: flag wording a reader could misinterpret

**DELIVERY**:
Reference specific sections. Ask the follow-up questions a demanding stakeholder would ask. Propose concrete alternatives where the draft is weak.

**CRITICAL**: This is not a \"review and polish\" task. It is a \"challenge and reconstruct\" task. Offer a genuinely different perspective that creates productive tension with the draft.

---

";

/// Whether two generator identities describe the same deployment.
///
/// Both must be present, and then any one of these must hold: provider and
/// model are all non-empty and pairwise equal; urls are non-empty and equal;
/// endpoints are non-empty and equal.
#[must_use]
pub fn detect_same_generator(
    first: Option<&GeneratorIdentity>,
    second: Option<&GeneratorIdentity>,
) -> bool {
    let (Some(a), Some(b)) = (first, second) else {
        return false;
    };

    let both_set = |x: &str, y: &str| !x.is_empty() && !y.is_empty();

    if both_set(&a.provider, &b.provider)
        && both_set(&a.model, &b.model)
        && a.provider == b.provider
        && a.model == b.model
    {
        return true;
    }
    if both_set(&a.url, &b.url) && a.url == b.url {
        return true;
    }
    both_set(&a.endpoint, &b.endpoint) && a.endpoint == b.endpoint
}

/// Insert [`PERSONA_BLOCK`] right after the first reset-context sentence
/// found in `prompt`, or prepend it when none is present.
#[must_use]
pub fn augment_for_same_generator(prompt: &str) -> String {
    for sentence in RESET_CONTEXT_SENTENCES {
        if let Some((before, after)) = prompt.split_once(sentence) {
            debug!(sentence, "Inserting adversarial persona after reset sentence");
            let mut out =
                String::with_capacity(prompt.len() + PERSONA_BLOCK.len() + 2);
            out.push_str(before);
            out.push_str(sentence);
            out.push_str("\n\n");
            out.push_str(PERSONA_BLOCK);
            out.push_str(after);
            return out;
        }
    }

    warn!("Review template has no recognized reset-context sentence; prepending persona block");
    format!("{PERSONA_BLOCK}{prompt}")
}
