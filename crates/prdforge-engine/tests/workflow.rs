//! End-to-end tests for the three-phase workflow

use anyhow::Result;
use camino::Utf8PathBuf;
use prdforge_config::Config;
use prdforge_engine::{
    CreateProjectRequest, GeneratorIdentity, PERSONA_BLOCK, ProjectState, WorkflowEngine,
};
use prdforge_utils::error::{ErrorKind, WorkflowError};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to open an engine over a fresh home directory
fn open_engine() -> Result<(TempDir, WorkflowEngine)> {
    let temp_dir = TempDir::new()?;
    let engine = open_at(&temp_dir)?;
    Ok((temp_dir, engine))
}

fn open_at(temp_dir: &TempDir) -> Result<WorkflowEngine> {
    let home = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
        .map_err(|p| anyhow::anyhow!("non UTF-8 temp dir: {}", p.display()))?;
    let config = Config::builder().home(home).sweep_enabled(false).build()?;
    Ok(WorkflowEngine::open(&config)?)
}

fn outputs_matching(engine: &WorkflowEngine, needle: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(engine.layout().outputs_dir())? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name.contains(needle) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Test creation yields three phases with a populated draft prompt
#[test]
fn test_create_project() -> Result<()> {
    let (_dir, engine) = open_engine()?;
    let project = engine.create_project(
        CreateProjectRequest::new("Widget", "Users cannot find widgets").with_context("B2B only"),
    )?;

    assert_eq!(project.current_phase, 1);
    assert_eq!(project.phases.len(), 3);
    assert_eq!(project.state(), ProjectState::AwaitingPhase1);
    let prompt = &project.phases[0].prompt;
    assert!(prompt.contains("Widget"));
    assert!(prompt.contains("Users cannot find widgets"));
    assert!(prompt.contains("B2B only"));
    assert!(project.phases[1].prompt.is_empty());

    let json_path = engine.layout().project_file(&project.id);
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path)?)?;
    assert_eq!(json["phase"], 1);
    assert!(fs::read_to_string(&json_path)?.contains("\n  \"id\""));
    Ok(())
}

/// Test the Widget scenario through all three phases
#[test]
fn test_widget_scenario() -> Result<()> {
    let (_dir, engine) = open_engine()?;
    let project = engine.create_project(CreateProjectRequest::new("Widget", "Lost widgets"))?;
    let id = project.id.clone();

    let after1 = engine.submit_phase(&id, 1, "C1")?;
    assert_eq!(after1.current_phase, 2);
    assert!(after1.phases[1].prompt.contains("C1"));
    assert!(!after1.phases[1].prompt.contains("{phase1Output}"));

    let after2 = engine.submit_phase(&id, 2, "C2")?;
    assert_eq!(after2.current_phase, 3);
    assert!(after2.phases[2].prompt.contains("C1"));
    assert!(after2.phases[2].prompt.contains("C2"));

    let after3 = engine.submit_phase(&id, 3, "C3")?;
    assert_eq!(after3.current_phase, 3);
    assert_eq!(after3.state(), ProjectState::Complete);
    assert!(after3.phases.iter().all(|p| p.completed_at.is_some()));

    let finals = outputs_matching(&engine, &format!("{id}_FINAL_"))?;
    assert_eq!(finals.len(), 1);
    let document = fs::read_to_string(engine.layout().outputs_dir().join(&finals[0]))?;
    let history_rows = document
        .lines()
        .filter(|l| l.starts_with("| Phase "))
        .count();
    assert_eq!(history_rows, 3);
    assert!(document.find("C3").unwrap() < document.find("C1").unwrap());

    for n in 1..=3 {
        assert_eq!(outputs_matching(&engine, &format!("{id}_phase{n}_"))?.len(), 1);
    }

    // Resubmitting the synthesis is an idempotent overwrite.
    let again = engine.submit_phase(&id, 3, "C3 revised")?;
    assert_eq!(again.current_phase, 3);
    assert_eq!(again.phases[2].content, "C3 revised");
    assert!(engine.final_document(&id)?.contains("C3 revised"));
    Ok(())
}

/// Test the persona block appears only for the same generator
#[test]
fn test_same_generator_review_prompt() -> Result<()> {
    let (_dir, engine) = open_engine()?;
    let same = GeneratorIdentity::new("anthropic", "model-a");

    let twin = engine.create_project(
        CreateProjectRequest::new("Twin", "d").with_generators(Some(same.clone()), Some(same.clone())),
    )?;
    let twin = engine.submit_phase(&twin.id, 1, "C1")?;
    let review = &twin.phases[1].prompt;
    assert!(review.contains(PERSONA_BLOCK));
    assert!(review.starts_with("Forget our previous sessions-- start fresh with me.\n\n"));
    assert!(review.contains("C1"));

    let mixed = engine.create_project(CreateProjectRequest::new("Mixed", "d").with_generators(
        Some(same),
        Some(GeneratorIdentity::new("google", "model-b")),
    ))?;
    let mixed = engine.submit_phase(&mixed.id, 1, "C1")?;
    assert!(!mixed.phases[1].prompt.contains("ADVERSARIAL REVIEWER ROLE"));
    Ok(())
}

/// Test rejected submissions leave the project untouched
#[test]
fn test_invalid_submissions() -> Result<()> {
    let (_dir, engine) = open_engine()?;
    let project = engine.create_project(CreateProjectRequest::new("T", "D"))?;
    let id = project.id.as_str();

    let err = engine.submit_phase(id, 0, "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPhase);
    let err = engine.submit_phase(id, 4, "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPhase);

    let err = engine.submit_phase(id, 2, "review before draft").unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidPhase { phase: 2, .. }));

    let err = engine.submit_phase(id, 1, "  \n\t").unwrap_err();
    assert!(matches!(err, WorkflowError::EmptyContent { phase: 1 }));

    let err = engine
        .submit_phase("00000000-0000-4000-8000-000000000000", 1, "x")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let unchanged = engine.get_project(id)?;
    assert_eq!(unchanged, project);
    assert!(outputs_matching(&engine, "_phase")?.is_empty());
    Ok(())
}

/// Test final document is not ready before the synthesis
#[test]
fn test_final_document_not_ready() -> Result<()> {
    let (_dir, engine) = open_engine()?;
    let project = engine.create_project(CreateProjectRequest::new("T", "D"))?;
    engine.submit_phase(&project.id, 1, "C1")?;
    let err = engine.final_document(&project.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotReady);
    Ok(())
}

/// Test prompt backfill is idempotent and persisted
#[test]
fn test_backfill_is_idempotent() -> Result<()> {
    let (dir, engine) = open_engine()?;
    let project = engine.create_project(CreateProjectRequest::new("T", "D"))?;
    let project = engine.submit_phase(&project.id, 1, "C1")?;
    engine.shutdown();
    drop(engine);

    // Simulate an older file with blank prompts.
    let path = project_path(&dir, &project.id);
    let mut json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    json["phases"][0]["prompt"] = "".into();
    json["phases"][1]["prompt"] = "".into();
    fs::write(&path, serde_json::to_string_pretty(&json)?)?;

    let engine = open_at(&dir)?;
    let mut loaded = engine.get_project(&project.id)?;
    assert!(!loaded.phases[0].prompt.is_empty());
    assert!(loaded.phases[1].prompt.contains("C1"));
    assert!(loaded.phases[2].prompt.is_empty());

    let before = loaded.clone();
    assert!(!engine.ensure_prompts_populated(&mut loaded)?);
    assert_eq!(loaded, before);

    let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert!(on_disk["phases"][1]["prompt"].as_str().unwrap().contains("C1"));
    Ok(())
}

fn project_path(dir: &TempDir, id: &str) -> std::path::PathBuf {
    dir.path().join("outputs").join(format!("{id}.json"))
}

/// Test listing merges disk projects and sorts newest first
#[test]
fn test_list_projects_newest_first() -> Result<()> {
    let (dir, engine) = open_engine()?;
    let first = engine.create_project(CreateProjectRequest::new("First", "d"))?;
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = engine.create_project(CreateProjectRequest::new("Second", "d"))?;
    drop(engine);

    let engine = open_at(&dir)?;
    std::thread::sleep(std::time::Duration::from_millis(5));
    let third = engine.create_project(CreateProjectRequest::new("Third", "d"))?;
    fs::write(dir.path().join("outputs").join("junk.json"), b"[]")?;

    let ids: Vec<String> = engine.list_projects()?.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
    Ok(())
}

/// Test projects survive a restart and continue from disk
#[test]
fn test_reload_after_restart() -> Result<()> {
    let (dir, engine) = open_engine()?;
    let project = engine.create_project(CreateProjectRequest::new("T", "D"))?;
    engine.submit_phase(&project.id, 1, "C1")?;
    drop(engine);

    let engine = open_at(&dir)?;
    let reloaded = engine.get_project(&project.id)?;
    assert_eq!(reloaded.current_phase, 2);
    assert_eq!(reloaded.phases[0].content, "C1");

    let after = engine.submit_phase(&project.id, 2, "C2")?;
    assert_eq!(after.current_phase, 3);
    Ok(())
}

/// Test template files override defaults, legacy names included
#[test]
fn test_prompt_file_overrides() -> Result<()> {
    let (_dir, engine) = open_engine()?;
    fs::write(
        engine.layout().prompt_file("gemini_review"),
        "Critique [PASTE CLAUDE'S ORIGINAL PRD HERE] and again {{PHASE1_OUTPUT}}",
    )?;
    engine.update_prompt_template("claude_initial", "Title=%s; Problems=%s")?;

    let project = engine.create_project(CreateProjectRequest::new("Widget", "Lost"))?;
    assert_eq!(project.phases[0].prompt, "Title=Widget; Problems=Lost");

    let project = engine.submit_phase(&project.id, 1, "C1")?;
    assert_eq!(project.phases[1].prompt, "Critique C1 and again C1");

    assert_eq!(
        engine.prompt_template("phase1-claude-initial")?,
        "Title=%s; Problems=%s"
    );
    let err = engine.prompt_template("missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    Ok(())
}

/// Test concurrent submissions to one project serialize cleanly
#[test]
fn test_concurrent_submissions() -> Result<()> {
    let (_dir, engine) = open_engine()?;
    let engine = Arc::new(engine);
    let project = engine.create_project(CreateProjectRequest::new("T", "D"))?;

    std::thread::scope(|s| {
        for i in 0..8 {
            let engine = Arc::clone(&engine);
            let id = project.id.clone();
            s.spawn(move || engine.submit_phase(&id, 1, &format!("draft {i}")).unwrap());
        }
    });

    let project = engine.get_project(&project.id)?;
    assert!(project.phases[0].content.starts_with("draft "));
    assert!(project.phases[1].prompt.contains(&project.phases[0].content));

    let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(
        engine.layout().project_file(&project.id),
    )?)?;
    assert_eq!(on_disk["phases"][0]["content"], project.phases[0].content);
    Ok(())
}

/// Test storage and cache statistics reflect activity
#[test]
fn test_stats() -> Result<()> {
    let (_dir, engine) = open_engine()?;
    let project = engine.create_project(CreateProjectRequest::new("T", "D"))?;
    engine.submit_phase(&project.id, 1, "C1")?;
    engine.get_project(&project.id)?;

    let storage = engine.storage_stats()?;
    assert_eq!(storage.total_projects, 1);
    assert_eq!(storage.total_files, 2);
    assert_eq!(storage.files_by_type.get(".md"), Some(&1));

    let cache = engine.cache_stats();
    assert!(cache.writes >= 3);
    assert!(cache.entries <= cache.capacity);
    Ok(())
}
