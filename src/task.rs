//! Task descriptors and task list loading.
//!
//! A task (a "subspec") is a named unit of work with free-form requirements and an ordered
//! list of dependency names. The list is static input: loaded once, never mutated by a run.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One subspec to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        requirements: impl Into<String>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            requirements: requirements.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        }
    }

    /// True when every dependency name passes `is_satisfied`.
    pub fn dependencies_satisfied(&self, is_satisfied: impl Fn(&str) -> bool) -> bool {
        self.dependencies.iter().all(|dep| is_satisfied(dep))
    }

    /// Dependency names that do not pass `is_satisfied`, in declaration order.
    pub fn unsatisfied_dependencies(&self, is_satisfied: impl Fn(&str) -> bool) -> Vec<String> {
        self.dependencies
            .iter()
            .filter(|dep| !is_satisfied(dep))
            .cloned()
            .collect()
    }
}

/// Check that a task name can be used as an output file stem.
pub fn validate_task_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("task name cannot be empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("task name {:?} is reserved", name));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!("task name {:?} must not contain path separators", name));
    }
    if name.contains('\0') {
        return Err(format!("task name {:?} must not contain NUL", name));
    }
    Ok(())
}

#[derive(Deserialize)]
struct TomlTaskFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Ordered, validated task list.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    /// Build a task list, rejecting names that cannot become output files.
    pub fn new(tasks: Vec<Task>) -> Result<Self, ApiError> {
        Self::from_tasks(tasks, Path::new("<memory>"))
    }

    /// Load a task list from a `.json` array or a `.toml` file with `[[tasks]]` entries.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ApiError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let tasks = if is_toml {
            toml::from_str::<TomlTaskFile>(&raw)
                .map(|file| file.tasks)
                .map_err(|e| invalid(path, e.to_string()))?
        } else {
            serde_json::from_str::<Vec<Task>>(&raw).map_err(|e| invalid(path, e.to_string()))?
        };

        Self::from_tasks(tasks, path)
    }

    fn from_tasks(tasks: Vec<Task>, source: &Path) -> Result<Self, ApiError> {
        for task in &tasks {
            validate_task_name(&task.name).map_err(|message| invalid(source, message))?;
        }

        let list = Self { tasks };
        for name in list.duplicate_names() {
            warn!(task = %name, "Duplicate task name; later entries shadow earlier output");
        }
        for (task, dep) in list.unknown_dependencies() {
            warn!(
                task = %task,
                dependency = %dep,
                "Dependency is not defined in the task list"
            );
        }
        Ok(list)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|task| task.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    /// Names that appear more than once, each reported once.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for task in &self.tasks {
            if !seen.insert(task.name.as_str()) && reported.insert(task.name.as_str()) {
                duplicates.push(task.name.clone());
            }
        }
        duplicates
    }

    /// `(task, dependency)` pairs where the dependency names no task in the list.
    pub fn unknown_dependencies(&self) -> Vec<(String, String)> {
        let known: HashSet<&str> = self.names().collect();
        self.tasks
            .iter()
            .flat_map(|task| {
                task.dependencies
                    .iter()
                    .filter(|dep| !known.contains(dep.as_str()))
                    .map(|dep| (task.name.clone(), dep.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Restrict the list to `only`, keeping list order. An empty selection keeps every task.
    pub fn select(&self, only: &[String]) -> Result<Vec<Task>, ApiError> {
        if only.is_empty() {
            return Ok(self.tasks.clone());
        }
        if let Some(missing) = only.iter().find(|name| self.get(name).is_none()) {
            return Err(ApiError::ConfigError(format!(
                "Unknown task selected: {}",
                missing
            )));
        }
        Ok(self
            .tasks
            .iter()
            .filter(|task| only.contains(&task.name))
            .cloned()
            .collect())
    }
}

fn invalid(path: &Path, message: String) -> ApiError {
    ApiError::TaskListInvalid {
        path: PathBuf::from(path),
        message,
    }
}

/// Read the design-spec text that is prepended to every request.
pub fn load_spec_text(path: &Path) -> Result<String, ApiError> {
    std::fs::read_to_string(path).map_err(|source| ApiError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    })
}
