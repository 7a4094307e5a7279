//! End-to-end generation runs against a scripted provider and a real output directory.

use crate::integration::test_utils::{ScriptedProvider, Workspace, SURVEY_TASKS};
use std::sync::Arc;
use subspec::error::ApiError;
use subspec::generation::{Orchestrator, RetryPolicy, RunOptions};
use subspec::provider::{CompletionOptions, ModelProviderClient};
use subspec::store::TaskStore;
use subspec::task::{load_spec_text, TaskList};

fn orchestrator(ws: &Workspace, provider: Arc<ScriptedProvider>, tasks: &TaskList) -> Orchestrator {
    let store = TaskStore::open(ws.root().join("output"), "md", tasks.names()).unwrap();
    let spec = load_spec_text(&ws.root().join("input/context")).unwrap();
    let client: Arc<dyn ModelProviderClient> = provider;
    Orchestrator::new(client, store, spec)
}

fn load(ws: &Workspace) -> TaskList {
    TaskList::load(&ws.root().join("input/subspecs.json")).unwrap()
}

#[tokio::test]
async fn test_full_run_writes_every_output_in_dependency_order() {
    let ws = Workspace::new(SURVEY_TASKS);
    let tasks = load(&ws);
    let provider = ScriptedProvider::echo();

    let report = orchestrator(&ws, provider.clone(), &tasks)
        .run(tasks.tasks(), RunOptions::default())
        .await;

    assert!(report.is_clean());
    assert_eq!(provider.requested(), vec!["db", "api", "auth", "dashboard"]);
    for name in ["db", "api", "auth", "dashboard"] {
        assert_eq!(
            std::fs::read_to_string(ws.output(name)).unwrap(),
            format!("{} prompt", name)
        );
    }

    let dashboard = provider.user_message("dashboard").unwrap();
    assert!(dashboard.starts_with("<context>A survey platform"));
    assert!(dashboard.contains("Requirements: Admin dashboard"));
    assert!(dashboard.ends_with("Dependencies: api: api prompt, auth: auth prompt"));

    for options in provider.options() {
        assert_eq!(options.temperature, Some(0.0));
        assert_eq!(options.max_tokens, Some(4096));
    }
}

#[tokio::test]
async fn test_second_run_resumes_from_files() {
    let ws = Workspace::new(SURVEY_TASKS);
    let tasks = load(&ws);

    // First run: "auth" keeps failing, so "dashboard" is left blocked.
    let flaky = ScriptedProvider::new(|task, _| match task {
        "auth" => Err(ApiError::ProviderRateLimit("slow down".into())),
        other => Ok(format!("{} prompt", other)),
    });
    let first = orchestrator(&ws, flaky.clone(), &tasks)
        .run(tasks.tasks(), RunOptions::default())
        .await;
    assert_eq!(first.succeeded, vec!["db", "api"]);
    assert_eq!(first.failed[0].name, "auth");
    assert_eq!(first.blocked[0].name, "dashboard");
    assert_eq!(first.blocked[0].waiting_on, vec!["auth"]);
    assert!(!ws.output("auth").exists());
    assert!(!ws.output("dashboard").exists());

    // Second run only generates what is missing.
    let healthy = ScriptedProvider::echo();
    let second = orchestrator(&ws, healthy.clone(), &tasks)
        .run(tasks.tasks(), RunOptions::default())
        .await;
    assert_eq!(second.already_satisfied, vec!["api", "db"]);
    assert_eq!(healthy.requested(), vec!["auth", "dashboard"]);
    assert!(second.is_clean());

    // Third run has nothing left to do.
    let idle = ScriptedProvider::echo();
    let third = orchestrator(&ws, idle.clone(), &tasks)
        .run(tasks.tasks(), RunOptions::default())
        .await;
    assert!(idle.requested().is_empty());
    assert_eq!(third.already_satisfied.len(), 4);
    assert_eq!(third.generation_calls, 0);
}

#[tokio::test]
async fn test_retry_ceiling_and_recovery() {
    let ws = Workspace::new(r#"[{"name": "db"}, {"name": "cache"}]"#);
    let tasks = load(&ws);
    let provider = ScriptedProvider::new(|task, attempt| match (task, attempt) {
        ("db", n) if n < 3 => Err(ApiError::ProviderRequestFailed("connection reset".into())),
        ("cache", _) => Err(ApiError::ProviderRequestFailed("always down".into())),
        (other, _) => Ok(format!("{} prompt", other)),
    });

    let report = orchestrator(&ws, provider.clone(), &tasks)
        .with_retry(RetryPolicy::new(3))
        .run(tasks.tasks(), RunOptions::default())
        .await;

    assert_eq!(report.succeeded, vec!["db"]);
    assert_eq!(report.failed[0].name, "cache");
    assert_eq!(report.failed[0].attempts, 3);
    assert_eq!(report.generation_calls, 6);
    assert!(!ws.output("cache").exists());
}

#[tokio::test]
async fn test_selection_with_dependency_outside_selection() {
    let ws = Workspace::new(SURVEY_TASKS);
    let tasks = load(&ws);
    std::fs::create_dir_all(ws.root().join("output")).unwrap();
    std::fs::write(ws.output("db"), "db from an earlier run").unwrap();

    let selected = tasks.select(&["api".to_string(), "dashboard".to_string()]).unwrap();
    let provider = ScriptedProvider::echo();
    let report = orchestrator(&ws, provider.clone(), &tasks)
        .run(&selected, RunOptions::default())
        .await;

    assert_eq!(report.succeeded, vec!["api"]);
    assert_eq!(report.blocked[0].name, "dashboard");
    assert_eq!(report.blocked[0].waiting_on, vec!["auth"]);
    assert!(provider
        .user_message("api")
        .unwrap()
        .contains("db: db from an earlier run"));
}

#[tokio::test]
async fn test_custom_completion_options_reach_provider() {
    let ws = Workspace::new(r#"[{"name": "db"}]"#);
    let tasks = load(&ws);
    let provider = ScriptedProvider::echo();

    orchestrator(&ws, provider.clone(), &tasks)
        .with_options(CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(1024),
        })
        .run(tasks.tasks(), RunOptions::default())
        .await;

    assert_eq!(provider.options()[0].max_tokens, Some(1024));
}
