//! Binary-level tests for commands that never reach the network.

use crate::integration::test_utils::{Workspace, ENV_MUTEX, SURVEY_TASKS, UNSET_KEY_ENV};
use std::process::{Command, Output};

fn subspec(ws: &Workspace, args: &[&str]) -> Output {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    Command::new(env!("CARGO_BIN_EXE_subspec"))
        .arg("--workspace")
        .arg(ws.root())
        .arg("--quiet")
        .args(args)
        .env_remove(UNSET_KEY_ENV)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run subspec binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_plan_json_lists_dependency_order() {
    let ws = Workspace::new(SURVEY_TASKS);
    let output = subspec(&ws, &["plan", "--format", "json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        value["order"],
        serde_json::json!(["db", "api", "auth", "dashboard"])
    );
    assert!(!ws.output("db").exists(), "plan must not generate anything");
}

#[test]
fn test_status_after_partial_output() {
    let ws = Workspace::new(SURVEY_TASKS);
    std::fs::create_dir_all(ws.root().join("output")).unwrap();
    std::fs::write(ws.output("db"), "db prompt").unwrap();

    let output = subspec(&ws, &["status", "--format", "json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let states: Vec<(String, String)> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|s| {
            (
                s["name"].as_str().unwrap().to_string(),
                s["state"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        states,
        vec![
            ("dashboard".to_string(), "waiting".to_string()),
            ("api".to_string(), "ready".to_string()),
            ("auth".to_string(), "ready".to_string()),
            ("db".to_string(), "done".to_string()),
        ]
    );
}

#[test]
fn test_validate_exit_status() {
    let ok = Workspace::new(SURVEY_TASKS);
    let output = subspec(&ok, &["validate"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Validation passed"));

    let cyclic = Workspace::new(
        r#"[{"name": "a", "dependencies": ["b"]}, {"name": "b", "dependencies": ["a"]}]"#,
    );
    let output = subspec(&cyclic, &["validate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("can never be generated"));
}

#[test]
fn test_run_without_credential_exits_nonzero() {
    let ws = Workspace::new(SURVEY_TASKS);
    let output = subspec(&ws, &["run"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(UNSET_KEY_ENV));
    assert!(!ws.output("db").exists());
}

#[test]
fn test_missing_task_list_exits_nonzero() {
    let ws = Workspace::new(SURVEY_TASKS);
    std::fs::remove_file(ws.root().join("input/subspecs.json")).unwrap();
    let output = subspec(&ws, &["plan"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("subspecs.json"));
}
