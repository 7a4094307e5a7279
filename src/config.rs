//! Configuration System
//!
//! Layered configuration: built-in defaults, the user's global file, the workspace
//! `subspec.toml`, then `SUBSPEC__*` environment variables. An explicit `--config` file
//! replaces both file layers.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::{ProviderConfig, ProviderType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubspecConfig {
    #[serde(default)]
    pub inputs: InputsConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the task list and design spec are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    #[serde(default = "default_tasks_path")]
    pub tasks: PathBuf,

    #[serde(default = "default_spec_path")]
    pub spec: PathBuf,
}

fn default_tasks_path() -> PathBuf {
    PathBuf::from("input/subspecs.json")
}

fn default_spec_path() -> PathBuf {
    PathBuf::from("input/context")
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            tasks: default_tasks_path(),
            spec: default_spec_path(),
        }
    }
}

/// Where generated subspecs are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_extension() -> String {
    crate::store::DEFAULT_EXTENSION.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            extension: default_extension(),
        }
    }
}

/// Request shape and retry ceiling for generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    /// Overrides the built-in system instruction
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            system_prompt: None,
        }
    }
}

/// Input and output locations resolved against the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub tasks: PathBuf,
    pub spec: PathBuf,
    pub output_dir: PathBuf,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Generation(String),
    Output(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Output(msg) => write!(f, "Output: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl GenerationConfig {
    /// Check generation settings; the temperature ceiling depends on `provider`.
    pub fn validate(&self, provider: ProviderType) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than zero".to_string());
        }
        let max_temperature = provider.max_temperature();
        if !(0.0..=max_temperature).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and {:.1}, got {}",
                max_temperature, self.temperature
            ));
        }
        if matches!(&self.system_prompt, Some(p) if p.trim().is_empty()) {
            return Err("system_prompt cannot be blank".to_string());
        }
        Ok(())
    }
}

impl SubspecConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.generation.validate(self.provider.provider_type) {
            errors.push(ValidationError::Generation(e));
        }
        if self.output.dir.as_os_str().is_empty() {
            errors.push(ValidationError::Output(
                "Output directory cannot be empty".to_string(),
            ));
        }
        let extension = self.output.extension.trim_start_matches('.');
        if extension.trim().is_empty() {
            errors.push(ValidationError::Output(
                "Output extension cannot be empty".to_string(),
            ));
        } else if extension.contains('/') || extension.contains('\\') {
            errors.push(ValidationError::Output(format!(
                "Invalid output extension: {}",
                self.output.extension
            )));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one error.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Resolve input and output paths; relative paths are taken from `workspace_root`.
    pub fn resolve_paths(&self, workspace_root: &Path) -> ResolvedPaths {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                workspace_root.join(p)
            }
        };
        ResolvedPaths {
            tasks: resolve(&self.inputs.tasks),
            spec: resolve(&self.inputs.spec),
            output_dir: resolve(&self.output.dir),
        }
    }
}
