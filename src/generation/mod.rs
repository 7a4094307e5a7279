pub mod orchestrator;
pub mod prompt;
pub mod report;
pub mod retry;
pub mod schedule;

pub use orchestrator::{Orchestrator, RunOptions};
pub use prompt::{PromptBuilder, DEFAULT_SYSTEM_PROMPT};
pub use report::{BlockedTask, FailedTask, RunReport};
pub use retry::{AttemptOutcome, RetryPolicy, TaskOutcome};
pub use schedule::{plan, task_states, PlannedSchedule, TaskState, TaskStatus};
