//! Run report: what a generation run did with each task.

use serde::{Deserialize, Serialize};

/// A task whose attempts were exhausted or hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTask {
    pub name: String,
    pub error: String,
    pub attempts: u32,
}

/// A task that never ran because a dependency was never satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedTask {
    pub name: String,
    pub waiting_on: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Tasks skipped because their output was already stored
    pub already_satisfied: Vec<String>,
    /// Tasks generated and persisted during this run, in completion order
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedTask>,
    pub blocked: Vec<BlockedTask>,
    /// Total requests sent to the provider, retries included
    pub generation_calls: u32,
    /// The run stopped with tasks left that could never become eligible
    pub deadlocked: bool,
}

impl RunReport {
    /// Every task is stored and nothing failed or was left waiting.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty()
    }

    pub fn total_tasks(&self) -> usize {
        self.already_satisfied.len() + self.succeeded.len() + self.failed.len() + self.blocked.len()
    }
}
