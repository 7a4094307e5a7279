//! Shared test utilities for integration tests
//!
//! A scripted provider standing in for the HTTP clients, workspace fixtures, and a
//! mutex for tests that touch process environment variables.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use subspec::error::ApiError;
use subspec::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, MessageRole, ModelProviderClient,
    TokenUsage,
};
use tempfile::TempDir;

/// Serializes environment variable changes across all integration tests
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

type Script = dyn Fn(&str, u32) -> Result<String, ApiError> + Send + Sync;

/// Provider answering from a closure of (task name, attempt number for that task).
pub struct ScriptedProvider {
    script: Box<Script>,
    requests: Mutex<Vec<(String, Vec<ChatMessage>, CompletionOptions)>>,
}

impl ScriptedProvider {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&str, u32) -> Result<String, ApiError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answers every request with `"<task> prompt"`.
    pub fn echo() -> Arc<Self> {
        Self::new(|task, _| Ok(format!("{} prompt", task)))
    }

    /// Task names in request order, retries included.
    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(task, _, _)| task.clone())
            .collect()
    }

    /// User message of the first request for `task`.
    pub fn user_message(&self, task: &str) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _, _)| name == task)
            .and_then(|(_, messages, _)| {
                messages
                    .iter()
                    .find(|m| m.role == MessageRole::User)
                    .map(|m| m.content.clone())
            })
    }

    pub fn options(&self) -> Vec<CompletionOptions> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, options)| options.clone())
            .collect()
    }
}

/// Task name a request is for, read from the user message.
pub fn requested_task(messages: &[ChatMessage]) -> String {
    let marker = "following subspec: ";
    messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .find_map(|m| {
            let start = m.content.find(marker)? + marker.len();
            m.content[start..].lines().next().map(str::to_string)
        })
        .unwrap_or_default()
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let task = requested_task(&messages);
        let attempt = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((task.clone(), messages, options));
            requests.iter().filter(|(name, _, _)| *name == task).count() as u32
        };
        let content = (self.script)(&task, attempt)?;
        Ok(CompletionResponse {
            content,
            model: "scripted".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("end_turn".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Workspace with `input/subspecs.json`, `input/context` and a `subspec.toml` whose
/// credential variable is never set.
pub struct Workspace {
    pub dir: TempDir,
}

pub const UNSET_KEY_ENV: &str = "SUBSPEC_INTEGRATION_KEY_NEVER_SET";

impl Workspace {
    pub fn new(tasks_json: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("input")).unwrap();
        std::fs::write(dir.path().join("input/subspecs.json"), tasks_json).unwrap();
        std::fs::write(
            dir.path().join("input/context"),
            "A survey platform with auth, a database and an API.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("subspec.toml"),
            format!(
                "[provider]\napi_key_env = \"{}\"\n\n[logging]\nenabled = false\n",
                UNSET_KEY_ENV
            ),
        )
        .unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("subspec.toml")
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.root().join("output").join(format!("{}.md", name))
    }
}

pub const SURVEY_TASKS: &str = r#"[
    {"name": "dashboard", "requirements": "Admin dashboard", "dependencies": ["api", "auth"]},
    {"name": "api", "requirements": "Survey endpoints", "dependencies": ["db"]},
    {"name": "auth", "requirements": "Login and sessions", "dependencies": ["db"]},
    {"name": "db", "requirements": "Schema and migrations", "dependencies": []}
]"#;
