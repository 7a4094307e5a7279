//! Scheduling invariants over random task graphs, cycles and missing names included.

use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use subspec::error::ApiError;
use subspec::generation::{plan, Orchestrator, RunOptions};
use subspec::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, TokenUsage,
};
use subspec::store::TaskStore;
use subspec::task::Task;
use tempfile::TempDir;

/// Up to 10 tasks `t0..tN`; each dependency index may point anywhere (self and forward
/// edges make cycles) and indices past the end name tasks that do not exist.
fn task_graph() -> impl Strategy<Value = Vec<Task>> {
    (1usize..10).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(0usize..n + 2, 0..4), n).prop_map(
            |deps| {
                deps.into_iter()
                    .enumerate()
                    .map(|(i, deps)| {
                        Task::new(
                            format!("t{}", i),
                            "",
                            deps.into_iter().map(|d| format!("t{}", d)),
                        )
                    })
                    .collect()
            },
        )
    })
}

/// Same shape, but every dependency points to an earlier task.
fn acyclic_graph() -> impl Strategy<Value = Vec<Task>> {
    (1usize..10).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..4), n)
            .prop_map(|deps| {
                deps.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        let deps: Vec<String> = if i == 0 {
                            Vec::new()
                        } else {
                            picks
                                .iter()
                                .map(|p| format!("t{}", p.index(i)))
                                .collect()
                        };
                        Task::new(format!("t{}", i), "", deps)
                    })
                    .collect()
            })
    })
}

fn stored_subset() -> impl Strategy<Value = HashSet<String>> {
    prop::collection::hash_set((0usize..12).prop_map(|i| format!("t{}", i)), 0..4)
}

#[test]
fn test_plan_never_schedules_before_dependencies() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(task_graph(), stored_subset()), |(tasks, existing)| {
            let schedule = plan(&tasks, &existing, false);
            let mut available = existing.clone();

            for name in &schedule.order {
                let task = tasks.iter().find(|t| &t.name == name).unwrap();
                for dep in &task.dependencies {
                    prop_assert!(
                        available.contains(dep),
                        "{} scheduled before its dependency {}",
                        name,
                        dep
                    );
                }
                available.insert(name.clone());
            }

            // Every task ends up in exactly one bucket
            let accounted = schedule.order.len()
                + schedule.already_satisfied.len()
                + schedule.blocked.len();
            prop_assert_eq!(accounted, tasks.len());

            // A blocked task really is waiting on something that never became available
            for blocked in &schedule.blocked {
                prop_assert!(!blocked.waiting_on.is_empty());
                for dep in &blocked.waiting_on {
                    prop_assert!(!available.contains(dep));
                }
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_acyclic_graphs_never_block() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&acyclic_graph(), |tasks| {
            let schedule = plan(&tasks, &HashSet::new(), false);
            prop_assert!(schedule.blocked.is_empty());
            prop_assert_eq!(schedule.order.len(), tasks.len());
            Ok(())
        })
        .unwrap();
}

struct RecordingProvider {
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl ModelProviderClient for RecordingProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let marker = "following subspec: ";
        let user = &messages[1].content;
        let start = user.find(marker).map(|i| i + marker.len()).unwrap_or(0);
        let name = user[start..].lines().next().unwrap_or_default().to_string();
        self.requested.lock().unwrap().push(name.clone());
        Ok(CompletionResponse {
            content: format!("{} prompt", name),
            model: "recording".to_string(),
            usage: TokenUsage::default(),
            finish_reason: None,
        })
    }

    fn provider_name(&self) -> &str {
        "recording"
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

#[test]
fn test_run_follows_plan_and_terminates() {
    let mut runner = proptest::test_runner::TestRunner::new(proptest::test_runner::Config {
        cases: 48,
        ..Default::default()
    });
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    runner
        .run(&task_graph(), |tasks| {
            let dir = TempDir::new().unwrap();
            let store =
                TaskStore::open(dir.path(), "md", tasks.iter().map(|t| t.name.as_str())).unwrap();
            let provider = Arc::new(RecordingProvider {
                requested: Mutex::new(Vec::new()),
            });
            let client: Arc<dyn ModelProviderClient> = provider.clone();
            let mut orchestrator = Orchestrator::new(client, store, String::new());

            let report = rt.block_on(orchestrator.run(&tasks, RunOptions::default()));
            let expected = plan(&tasks, &HashSet::new(), false);

            prop_assert_eq!(provider.requested.lock().unwrap().clone(), expected.order.clone());
            prop_assert_eq!(report.succeeded, expected.order);
            prop_assert_eq!(report.blocked, expected.blocked);
            prop_assert_eq!(report.generation_calls as usize, report_calls(&provider));
            Ok(())
        })
        .unwrap();
}

fn report_calls(provider: &RecordingProvider) -> usize {
    provider.requested.lock().unwrap().len()
}
