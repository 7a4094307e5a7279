//! Configuration layering: workspace file, explicit file and environment overrides.

use crate::integration::test_utils::{Workspace, ENV_MUTEX, SURVEY_TASKS};
use std::path::PathBuf;
use subspec::cli::RunContext;
use subspec::config::ConfigLoader;
use subspec::provider::ProviderType;

struct EnvVar {
    key: &'static str,
    previous: Option<String>,
}

impl EnvVar {
    fn set(key: &'static str, value: &str) -> Self {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self { key, previous }
    }
}

impl Drop for EnvVar {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => std::env::set_var(self.key, value),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn test_environment_overrides_workspace_file() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let ws = Workspace::new(SURVEY_TASKS);
    std::fs::write(
        ws.config_path(),
        "[provider]\nmodel = \"from-file\"\n\n[generation]\nmax_attempts = 5\n",
    )
    .unwrap();

    let _model = EnvVar::set("SUBSPEC__PROVIDER__MODEL", "from-env");
    let config = ConfigLoader::load_from_file(&ws.config_path()).unwrap();

    assert_eq!(config.provider.model, "from-env");
    assert_eq!(config.generation.max_attempts, 5);
    assert_eq!(config.provider.provider_type, ProviderType::Anthropic);
}

#[test]
fn test_explicit_config_file_is_required() {
    let ws = Workspace::new(SURVEY_TASKS);
    let err = ConfigLoader::load_from_file(&ws.root().join("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_invalid_config_aborts_startup() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let ws = Workspace::new(SURVEY_TASKS);
    std::fs::write(
        ws.config_path(),
        "[provider]\nmodel = \"\"\n\n[generation]\nmax_attempts = 0\n",
    )
    .unwrap();

    let err = match RunContext::new(ws.root().to_path_buf(), Some(ws.config_path())) {
        Ok(_) => panic!("invalid configuration was accepted"),
        Err(e) => e,
    };
    let message = err.to_string();
    assert!(message.contains("max_attempts"));
    assert!(message.contains("Model cannot be empty"));
}

#[test]
fn test_relative_paths_resolve_against_workspace() {
    let ws = Workspace::new(SURVEY_TASKS);
    std::fs::write(
        ws.config_path(),
        "[inputs]\ntasks = \"plan/tasks.json\"\n\n[output]\ndir = \"/var/tmp/subspec-out\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&ws.config_path()).unwrap();
    let paths = config.resolve_paths(ws.root());
    assert_eq!(paths.tasks, ws.root().join("plan/tasks.json"));
    assert_eq!(paths.spec, ws.root().join("input/context"));
    assert_eq!(paths.output_dir, PathBuf::from("/var/tmp/subspec-out"));
}
