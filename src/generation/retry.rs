//! Attempt outcomes and the retry policy applied to every task.

use crate::error::ApiError;
use crate::provider::CompletionResponse;
use std::future::Future;
use tracing::{error, warn};

/// Result of a single generation attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(String),
    Retryable(ApiError),
    Fatal(ApiError),
}

impl AttemptOutcome {
    /// Classify a provider result. Empty text counts as a retryable failure.
    pub fn from_result(result: Result<CompletionResponse, ApiError>) -> Self {
        match result {
            Ok(response) if response.content.trim().is_empty() => {
                AttemptOutcome::Retryable(ApiError::EmptyCompletion)
            }
            Ok(response) => AttemptOutcome::Success(response.content),
            Err(err) => classify(err),
        }
    }
}

/// Errors that another identical request cannot fix are fatal.
pub fn classify(err: ApiError) -> AttemptOutcome {
    match err {
        ApiError::ProviderAuthFailed(_)
        | ApiError::ProviderModelNotFound(_)
        | ApiError::ProviderNotConfigured(_)
        | ApiError::ConfigError(_) => AttemptOutcome::Fatal(err),
        other => AttemptOutcome::Retryable(other),
    }
}

/// Final result for one task after the policy ran.
#[derive(Debug)]
pub enum TaskOutcome {
    Generated { text: String, attempts: u32 },
    Failed { error: ApiError, attempts: u32 },
}

impl TaskOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            TaskOutcome::Generated { attempts, .. } | TaskOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Bounded retries; attempts run back to back with no delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Call `attempt(n)` (n starting at 1) until success, a fatal outcome, or the ceiling.
    pub async fn run<F, Fut>(&self, label: &str, mut attempt: F) -> TaskOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AttemptOutcome>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for n in 1..=max_attempts {
            match attempt(n).await {
                AttemptOutcome::Success(text) => {
                    return TaskOutcome::Generated { text, attempts: n };
                }
                AttemptOutcome::Fatal(err) => {
                    error!(
                        task = %label,
                        attempt = n,
                        error = %err,
                        "Attempt failed with a non-retryable error. Giving up."
                    );
                    return TaskOutcome::Failed {
                        error: err,
                        attempts: n,
                    };
                }
                AttemptOutcome::Retryable(err) => {
                    warn!(task = %label, attempt = n, error = %err, "Attempt failed");
                    last_error = Some(err);
                }
            }
        }

        error!(task = %label, attempts = max_attempts, "Max retries reached. Giving up.");
        TaskOutcome::Failed {
            error: last_error.unwrap_or_else(|| {
                ApiError::GenerationFailed(format!("no attempts made for {}", label))
            }),
            attempts: max_attempts,
        }
    }
}
