//! CLI presentation: text and json formatters per command.

use crate::cli::route::ValidateResult;
use crate::generation::{PlannedSchedule, RunReport, TaskState, TaskStatus};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_run_report_json(report: &RunReport) -> String {
    to_pretty_json(report)
}

pub fn format_run_report_text(report: &RunReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Generation run"));

    for name in &report.already_satisfied {
        out.push_str(&format!("  {} {} (already generated)\n", "⊘".yellow(), name));
    }
    for name in &report.succeeded {
        out.push_str(&format!("  {} {}\n", "✓".green(), name));
    }
    for failed in &report.failed {
        out.push_str(&format!(
            "  {} {} after {} attempt(s): {}\n",
            "✗".red(),
            failed.name.bold(),
            failed.attempts,
            failed.error
        ));
    }
    if !report.blocked.is_empty() {
        if report.deadlocked {
            out.push_str(&format!(
                "\n{}\n",
                "Unable to proceed. Circular dependency or missing subspecs.".red()
            ));
        }
        for blocked in &report.blocked {
            out.push_str(&format!(
                "  {} {} waiting on {}\n",
                "…".yellow(),
                blocked.name,
                blocked.waiting_on.join(", ")
            ));
        }
    }

    out.push_str(&format!(
        "\nTasks: {}, generated: {}, skipped: {}, failed: {}, unprocessed: {}, API calls: {}",
        report.total_tasks(),
        report.succeeded.len(),
        report.already_satisfied.len(),
        report.failed.len(),
        report.blocked.len(),
        report.generation_calls
    ));
    out
}

pub fn format_plan_json(schedule: &PlannedSchedule) -> String {
    to_pretty_json(schedule)
}

pub fn format_plan_text(schedule: &PlannedSchedule) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Generation plan"));

    if schedule.order.is_empty() {
        out.push_str("  Nothing to generate.\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["#", "Subspec"]);
        for (i, name) in schedule.order.iter().enumerate() {
            table.add_row(vec![(i + 1).to_string(), name.clone()]);
        }
        out.push_str(&format!("{}\n", table));
    }

    if !schedule.already_satisfied.is_empty() {
        out.push_str(&format!(
            "\nAlready generated: {}\n",
            schedule.already_satisfied.join(", ")
        ));
    }
    if !schedule.blocked.is_empty() {
        out.push_str(&format!("\n{}\n", "Would remain unprocessed:".red()));
        for blocked in &schedule.blocked {
            out.push_str(&format!(
                "  - {} (waiting on {})\n",
                blocked.name,
                blocked.waiting_on.join(", ")
            ));
        }
    }
    out
}

pub fn format_status_json(statuses: &[TaskStatus]) -> String {
    to_pretty_json(&statuses)
}

pub fn format_status_text(statuses: &[TaskStatus]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Subspec status"));
    if statuses.is_empty() {
        out.push_str("  Task list is empty.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Subspec", "State", "Waiting on"]);
    for status in statuses {
        let state = match status.state {
            TaskState::Done => format!("{}", status.state.green()),
            TaskState::Ready => format!("{}", status.state.yellow()),
            TaskState::Waiting => status.state.to_string(),
        };
        let waiting_on = status
            .waiting_on
            .iter()
            .map(|dep| {
                if status.unknown.contains(dep) {
                    format!("{} (unknown)", dep)
                } else {
                    dep.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![status.name.clone(), state, waiting_on]);
    }
    out.push_str(&format!("{}\n", table));

    let done = statuses
        .iter()
        .filter(|s| s.state == TaskState::Done)
        .count();
    out.push_str(&format!("\n{}/{} generated", done, statuses.len()));
    out
}

pub fn format_validate_result_text(result: &ValidateResult) -> String {
    let header = if result.errors.is_empty() {
        "Validation passed:"
    } else {
        "Validation completed with issues:"
    };
    let mut s = format!(
        "{}\n  Task list: {}\n  Design spec: {}\n  Output: {}\n  Tasks: {}",
        header,
        result.tasks_path.display(),
        result.spec_path.display(),
        result.output_dir.display(),
        result.task_count
    );
    if !result.errors.is_empty() {
        s.push_str(&format!("\n\nErrors ({}):", result.errors.len()));
        for e in &result.errors {
            s.push_str(&format!("\n  - {}", e));
        }
    }
    if !result.warnings.is_empty() {
        s.push_str(&format!("\n\nWarnings ({}):", result.warnings.len()));
        for w in &result.warnings {
            s.push_str(&format!("\n  - {}", w));
        }
    }
    if result.errors.is_empty() && result.warnings.is_empty() {
        s.push_str("\n  All checks passed");
    }
    s
}
