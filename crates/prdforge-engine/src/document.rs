use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use prdforge_utils::error::WorkflowError;
use prdforge_utils::types::PhaseId;

use crate::model::Project;

const FILE_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const GENERATED_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";
const COMPLETED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Timestamp used in artifact file names, e.g. `2025-01-31_14-05-09`.
#[must_use]
pub fn file_stamp(at: DateTime<Utc>) -> String {
    at.format(FILE_STAMP_FORMAT).to_string()
}

/// Markdown snapshot of one phase's content.
#[must_use]
pub fn render_phase_snapshot(project: &Project, phase: PhaseId, at: DateTime<Utc>) -> String {
    let record = project.phase(phase);
    let mut out = String::with_capacity(record.content.len() + 256);

    let _ = write!(out, "# {}\n\n", project.title);
    let _ = writeln!(out, "**Phase {}: {}**", phase.number(), record.name);
    let _ = write!(out, "*Generated: {}*\n\n", at.format(GENERATED_FORMAT));
    out.push_str("---\n\n");
    out.push_str(&record.content);
    if !record.content.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn anchor(heading: &str) -> String {
    let mut slug = String::with_capacity(heading.len());
    for ch in heading.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if ch == ' ' || ch == '-' {
            slug.push('-');
        }
    }
    slug
}

/// Assemble the final document: synthesis first, then a revision history of
/// completed phases, then the full draft and review for reference.
///
/// # Errors
///
/// [`WorkflowError::NotReady`] if the synthesis phase has no content.
pub fn render_final_document(project: &Project, at: DateTime<Utc>) -> Result<String, WorkflowError> {
    let synthesis = project.phase(PhaseId::Synthesis);
    if !synthesis.has_content() {
        return Err(WorkflowError::NotReady {
            id: project.id.clone(),
        });
    }

    let draft = project.phase(PhaseId::Draft);
    let review = project.phase(PhaseId::Review);
    let draft_heading = format!("Phase 1: {}", draft.name);
    let review_heading = format!("Phase 2: {}", review.name);

    let mut out = String::with_capacity(
        synthesis.content.len() + draft.content.len() + review.content.len() + 1024,
    );

    let _ = write!(out, "# {}\n\n", project.title);
    let _ = write!(out, "*Final Document Generated: {}*\n\n", at.format(GENERATED_FORMAT));

    out.push_str("## Table of Contents\n\n");
    out.push_str("1. [Final Document](#final-document)\n");
    out.push_str("2. [Revision History](#revision-history)\n");
    let _ = writeln!(out, "3. [{draft_heading}](#{})", anchor(&draft_heading));
    let _ = write!(out, "4. [{review_heading}](#{})\n\n", anchor(&review_heading));
    out.push_str("---\n\n");

    out.push_str("## Final Document\n\n");
    out.push_str(&synthesis.content);
    out.push_str("\n\n---\n\n");

    out.push_str("## Revision History\n\n");
    out.push_str("| Phase | Completed | Description |\n");
    out.push_str("|-------|-----------|-------------|\n");
    for phase in project.phases.iter().filter(|p| p.has_content()) {
        let completed = phase
            .completed_at
            .map(|ts| ts.format(COMPLETED_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "| Phase {} | {} | {} |", phase.number, completed, phase.name);
    }
    out.push_str("\n---\n\n");

    if draft.has_content() {
        let _ = write!(out, "## {draft_heading}\n\n");
        out.push_str(&draft.content);
        out.push_str("\n\n---\n\n");
    }
    if review.has_content() {
        let _ = write!(out, "## {review_heading}\n\n");
        out.push_str(&review.content);
        out.push_str("\n\n");
    }

    Ok(out)
}
