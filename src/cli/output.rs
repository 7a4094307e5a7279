//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;
use std::error::Error as _;

/// Map domain/service errors to a string for CLI output, including the underlying cause.
pub fn map_error(e: &ApiError) -> String {
    match e.source() {
        Some(source) if !e.to_string().contains(&source.to_string()) => {
            format!("Error: {}\n  caused by: {}", e, source)
        }
        _ => format!("Error: {}", e),
    }
}
