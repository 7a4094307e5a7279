//! Generation orchestrator
//!
//! Drives one run over a task list: skips tasks whose output is already stored, then
//! repeatedly generates the first task whose dependencies are settled, until the list is
//! empty or no remaining task can make progress.

use crate::generation::prompt::PromptBuilder;
use crate::generation::report::{FailedTask, RunReport};
use crate::generation::retry::{AttemptOutcome, RetryPolicy, TaskOutcome};
use crate::generation::schedule::{blocked_report, dependency_settled, next_eligible};
use crate::provider::{CompletionOptions, ModelProviderClient};
use crate::store::TaskStore;
use crate::task::Task;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Regenerate tasks whose output is already stored
    pub force: bool,
}

/// Owns everything a run needs: the client, the store and the request shape.
pub struct Orchestrator {
    client: Arc<dyn ModelProviderClient>,
    store: TaskStore,
    spec_text: String,
    prompt: PromptBuilder,
    options: CompletionOptions,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn ModelProviderClient>, store: TaskStore, spec_text: String) -> Self {
        Self {
            client,
            store,
            spec_text,
            prompt: PromptBuilder::default(),
            options: CompletionOptions::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn into_store(self) -> TaskStore {
        self.store
    }

    /// Process `tasks` until every one is stored, failed or blocked.
    pub async fn run(&mut self, tasks: &[Task], run_options: RunOptions) -> RunReport {
        let mut report = RunReport::default();
        let mut remaining: Vec<&Task> = Vec::with_capacity(tasks.len());

        for task in tasks {
            if !run_options.force && self.store.contains(&task.name) {
                debug!(task = %task.name, "Output already stored; skipping");
                report.already_satisfied.push(task.name.clone());
            } else {
                remaining.push(task);
            }
        }

        info!(
            provider = %self.client.provider_name(),
            model = %self.client.model_name(),
            total = tasks.len(),
            pending = remaining.len(),
            force = run_options.force,
            "Starting generation run"
        );

        // A failed task never settles its dependents, even if older output is stored.
        let mut failed: HashSet<String> = HashSet::new();

        while !remaining.is_empty() {
            let store = &self.store;
            let is_stored = |name: &str| store.contains(name) && !failed.contains(name);
            let eligible = next_eligible(&remaining, |dep| {
                dependency_settled(dep, &remaining, is_stored)
            });

            let Some(index) = eligible else {
                report.blocked = blocked_report(&remaining, |dep| {
                    dependency_settled(dep, &remaining, is_stored)
                });
                report.deadlocked = true;
                error!(
                    remaining = remaining.len(),
                    "Unable to proceed. Circular dependency or missing subspecs."
                );
                break;
            };

            let task = remaining.remove(index);
            if !self.process(task, &mut report).await {
                failed.insert(task.name.clone());
            }
        }

        info!(
            already_satisfied = report.already_satisfied.len(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            blocked = report.blocked.len(),
            generation_calls = report.generation_calls,
            "Generation run finished"
        );
        for blocked in &report.blocked {
            warn!(
                task = %blocked.name,
                waiting_on = ?blocked.waiting_on,
                "Subspec was not processed"
            );
        }

        report
    }

    /// Generate and persist one task. Returns false when the task ends up failed.
    async fn process(&mut self, task: &Task, report: &mut RunReport) -> bool {
        info!(task = %task.name, "Generating subspec");
        let messages = self.prompt.build_messages(&self.spec_text, task, &self.store);

        let client = self.client.as_ref();
        let options = &self.options;
        let outcome = self
            .retry
            .run(&task.name, |attempt| {
                debug!(task = %task.name, attempt, "Sending generation request");
                let messages = messages.clone();
                let options = options.clone();
                async move { AttemptOutcome::from_result(client.complete(messages, options).await) }
            })
            .await;
        report.generation_calls += outcome.attempts();

        match outcome {
            TaskOutcome::Generated { text, attempts } => match self.store.put(&task.name, &text) {
                Ok(path) => {
                    info!(
                        task = %task.name,
                        attempts,
                        path = %path.display(),
                        "Subspec generated"
                    );
                    report.succeeded.push(task.name.clone());
                    true
                }
                Err(err) => {
                    error!(task = %task.name, error = %err, "Failed to persist subspec");
                    report.failed.push(FailedTask {
                        name: task.name.clone(),
                        error: err.to_string(),
                        attempts,
                    });
                    false
                }
            },
            TaskOutcome::Failed { error, attempts } => {
                error!(task = %task.name, attempts, error = %error, "Failed to generate subspec");
                report.failed.push(FailedTask {
                    name: task.name.clone(),
                    error: error.to_string(),
                    attempts,
                });
                false
            }
        }
    }
}
