//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_plan_json, format_plan_text, format_run_report_json, format_run_report_text,
    format_status_json, format_status_text, format_validate_result_text,
};
use crate::config::{ConfigLoader, ResolvedPaths, SubspecConfig};
use crate::error::ApiError;
use crate::generation::{
    plan, task_states, Orchestrator, PromptBuilder, RetryPolicy, RunOptions, RunReport,
};
use crate::provider::{CompletionOptions, ModelProviderClient, ProviderFactory};
use crate::store::TaskStore;
use crate::task::{load_spec_text, TaskList};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rendered command output and whether the command fully succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    /// False when a run left failed or blocked subspecs, or validation found errors
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Findings of the `validate` command.
#[derive(Debug, Clone, Default)]
pub struct ValidateResult {
    pub tasks_path: PathBuf,
    pub spec_path: PathBuf,
    pub output_dir: PathBuf,
    pub task_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Runtime context for CLI execution: workspace root, merged config and resolved paths.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: SubspecConfig,
    paths: ResolvedPaths,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let workspace_root = dunce::canonicalize(&workspace_root).map_err(|e| {
            ApiError::ConfigError(format!(
                "Workspace not found at {}: {}",
                workspace_root.display(),
                e
            ))
        })?;

        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        config.ensure_valid()?;

        let paths = config.resolve_paths(&workspace_root);
        debug!(
            workspace = %workspace_root.display(),
            tasks = %paths.tasks.display(),
            spec = %paths.spec.display(),
            output = %paths.output_dir.display(),
            "Resolved workspace paths"
        );

        Ok(Self {
            workspace_root,
            config,
            paths,
        })
    }

    pub fn workspace_root(&self) -> &std::path::Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &SubspecConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Run {
                force,
                only,
                format,
            } => {
                let report = self.run(*force, only)?;
                let text = match format {
                    OutputFormat::Json => format_run_report_json(&report),
                    OutputFormat::Text => format_run_report_text(&report),
                };
                Ok(CommandOutput {
                    text,
                    success: report.is_clean(),
                })
            }
            Commands::Plan {
                force,
                only,
                format,
            } => {
                let tasks = TaskList::load(&self.paths.tasks)?;
                let selected = tasks.select(only)?;
                let store = self.open_store(&tasks)?;
                let existing: HashSet<String> =
                    store.names().into_iter().map(str::to_string).collect();
                let schedule = plan(&selected, &existing, *force);
                Ok(CommandOutput::ok(match format {
                    OutputFormat::Json => format_plan_json(&schedule),
                    OutputFormat::Text => format_plan_text(&schedule),
                }))
            }
            Commands::Status { format } => {
                let tasks = TaskList::load(&self.paths.tasks)?;
                let store = self.open_store(&tasks)?;
                let statuses = task_states(tasks.tasks(), |name| store.contains(name));
                Ok(CommandOutput::ok(match format {
                    OutputFormat::Json => format_status_json(&statuses),
                    OutputFormat::Text => format_status_text(&statuses),
                }))
            }
            Commands::Validate => {
                let result = self.validate();
                Ok(CommandOutput {
                    success: result.errors.is_empty(),
                    text: format_validate_result_text(&result),
                })
            }
        }
    }

    fn open_store(&self, tasks: &TaskList) -> Result<TaskStore, ApiError> {
        Ok(TaskStore::open(
            &self.paths.output_dir,
            &self.config.output.extension,
            tasks.names(),
        )?)
    }

    fn run(&self, force: bool, only: &[String]) -> Result<RunReport, ApiError> {
        let tasks = TaskList::load(&self.paths.tasks)?;
        let selected = tasks.select(only)?;
        let spec_text = load_spec_text(&self.paths.spec)?;
        let provider = self.config.provider.to_model_provider()?;
        let client: Arc<dyn ModelProviderClient> =
            Arc::from(ProviderFactory::create_client(&provider)?);
        let store = self.open_store(&tasks)?;
        info!(
            tasks = tasks.len(),
            selected = selected.len(),
            stored = store.len(),
            "Loaded inputs"
        );

        let generation = &self.config.generation;
        let prompt = match &generation.system_prompt {
            Some(system_prompt) => PromptBuilder::new(system_prompt.clone()),
            None => PromptBuilder::default(),
        };
        let options = CompletionOptions {
            temperature: Some(generation.temperature),
            max_tokens: Some(generation.max_tokens),
        };
        let mut orchestrator = Orchestrator::new(client, store, spec_text)
            .with_prompt(prompt)
            .with_options(options)
            .with_retry(RetryPolicy::new(generation.max_attempts));

        let rt = if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ApiError::ProviderError(
                "Cannot run generation from within an async runtime context".to_string(),
            ));
        } else {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| ApiError::ProviderError(format!("Failed to create runtime: {}", e)))?
        };

        Ok(rt.block_on(orchestrator.run(&selected, RunOptions { force })))
    }

    fn validate(&self) -> ValidateResult {
        let mut result = ValidateResult {
            tasks_path: self.paths.tasks.clone(),
            spec_path: self.paths.spec.clone(),
            output_dir: self.paths.output_dir.clone(),
            ..ValidateResult::default()
        };

        match load_spec_text(&self.paths.spec) {
            Ok(text) if text.trim().is_empty() => {
                result.warnings.push("Design spec is empty".to_string())
            }
            Ok(_) => {}
            Err(e) => result.errors.push(e.to_string()),
        }

        if let Err(e) = self.config.provider.resolve_api_key() {
            result
                .warnings
                .push(format!("{} (required by `run`)", e));
        }

        let tasks = match TaskList::load(&self.paths.tasks) {
            Ok(tasks) => tasks,
            Err(e) => {
                result.errors.push(e.to_string());
                return result;
            }
        };
        result.task_count = tasks.len();

        if tasks.is_empty() {
            result.warnings.push("Task list is empty".to_string());
        }
        for name in tasks.duplicate_names() {
            result
                .warnings
                .push(format!("Duplicate subspec name: {}", name));
        }
        for (task, dep) in tasks.unknown_dependencies() {
            result
                .warnings
                .push(format!("{} depends on unknown subspec {}", task, dep));
        }

        let schedule = plan(tasks.tasks(), &HashSet::new(), true);
        for blocked in schedule.blocked {
            result.errors.push(format!(
                "{} can never be generated (waiting on {})",
                blocked.name,
                blocked.waiting_on.join(", ")
            ));
        }

        if result.errors.is_empty() {
            info!(tasks = result.task_count, "Validation passed");
        } else {
            warn!(errors = result.errors.len(), "Validation found problems");
        }
        result
    }
}
