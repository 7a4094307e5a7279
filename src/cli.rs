//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_plan_json, format_plan_text, format_run_report_json, format_run_report_text,
    format_section_heading, format_status_json, format_status_text, format_validate_result_text,
};
pub use route::{CommandOutput, RunContext, ValidateResult};
