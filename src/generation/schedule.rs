//! Dependency scheduling: the in-order re-scan used by both the run and the dry-run plan.
//!
//! Each step picks the first remaining task whose dependencies are all satisfied, then the
//! scan restarts from the front. Quadratic in task count, which is fine for task lists of
//! this size.
//!
//! A dependency is satisfied when its output is stored and no entry of that name is still
//! waiting to be (re)generated in the current run.

use crate::generation::report::BlockedTask;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;

/// Index of the first task in `remaining` whose dependencies all pass `is_satisfied`.
pub fn next_eligible<T: Borrow<Task>>(
    remaining: &[T],
    is_satisfied: impl Fn(&str) -> bool,
) -> Option<usize> {
    remaining
        .iter()
        .position(|task| task.borrow().dependencies_satisfied(&is_satisfied))
}

/// Describe tasks that can never run because some dependency never became satisfied.
pub fn blocked_report<T: Borrow<Task>>(
    remaining: &[T],
    is_satisfied: impl Fn(&str) -> bool,
) -> Vec<BlockedTask> {
    remaining
        .iter()
        .map(|task| {
            let task = task.borrow();
            BlockedTask {
                name: task.name.clone(),
                waiting_on: task.unsatisfied_dependencies(&is_satisfied),
            }
        })
        .collect()
}

/// True when `dep` is stored and not still pending in `remaining`.
pub fn dependency_settled<T: Borrow<Task>>(
    dep: &str,
    remaining: &[T],
    is_stored: impl Fn(&str) -> bool,
) -> bool {
    is_stored(dep) && !remaining.iter().any(|task| task.borrow().name == dep)
}

/// Dry-run schedule: the order a run would attempt tasks in if every attempt succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSchedule {
    pub already_satisfied: Vec<String>,
    pub order: Vec<String>,
    pub blocked: Vec<BlockedTask>,
}

/// Simulate a run over `tasks` with `existing` outputs already stored.
///
/// With `force`, stored tasks are scheduled again instead of being skipped.
pub fn plan(tasks: &[Task], existing: &HashSet<String>, force: bool) -> PlannedSchedule {
    let mut stored: HashSet<String> = existing.clone();
    let mut schedule = PlannedSchedule::default();
    let mut remaining: Vec<&Task> = Vec::new();

    for task in tasks {
        if !force && existing.contains(&task.name) {
            schedule.already_satisfied.push(task.name.clone());
        } else {
            remaining.push(task);
        }
    }

    while !remaining.is_empty() {
        let eligible = next_eligible(&remaining, |dep| {
            dependency_settled(dep, &remaining, |name| stored.contains(name))
        });
        match eligible {
            Some(index) => {
                let task = remaining.remove(index);
                stored.insert(task.name.clone());
                schedule.order.push(task.name.clone());
            }
            None => {
                schedule.blocked = blocked_report(&remaining, |dep| {
                    dependency_settled(dep, &remaining, |name| stored.contains(name))
                });
                break;
            }
        }
    }

    schedule
}

/// Where a task stands against the current store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Output is stored
    Done,
    /// Every dependency is stored
    Ready,
    /// Some dependency is not stored yet
    Waiting,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TaskState::Done => "done",
            TaskState::Ready => "ready",
            TaskState::Waiting => "waiting",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub name: String,
    pub state: TaskState,
    /// Dependencies without stored output
    pub waiting_on: Vec<String>,
    /// Dependencies that name no task in the list
    pub unknown: Vec<String>,
}

/// Classify every task as done, ready or waiting.
pub fn task_states(tasks: &[Task], is_stored: impl Fn(&str) -> bool) -> Vec<TaskStatus> {
    let known: HashSet<&str> = tasks.iter().map(|task| task.name.as_str()).collect();
    tasks
        .iter()
        .map(|task| {
            let waiting_on = task.unsatisfied_dependencies(&is_stored);
            let state = if is_stored(&task.name) {
                TaskState::Done
            } else if waiting_on.is_empty() {
                TaskState::Ready
            } else {
                TaskState::Waiting
            };
            TaskStatus {
                name: task.name.clone(),
                state,
                waiting_on,
                unknown: task
                    .dependencies
                    .iter()
                    .filter(|dep| !known.contains(dep.as_str()))
                    .cloned()
                    .collect(),
            }
        })
        .collect()
}
