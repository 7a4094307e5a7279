//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win key by key; tables are merged, not replaced.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("inputs.tasks", "input/subspecs.json")?
        .set_default("inputs.spec", "input/context")?
        .set_default("output.dir", "output")?
        .set_default("generation.max_attempts", 3)?
        .set_default("generation.max_tokens", 4096)
}
