//! Subspec: dependency-ordered prompt generation
//!
//! Reads a design spec and a list of named subspec tasks with dependencies, then asks a
//! language model for one detailed code-generation prompt per task. A task is generated
//! only after every dependency's output is stored, and that output is folded into its
//! request. Outputs are cached as one file per task, so a re-run resumes where the last
//! one stopped.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod provider;
pub mod store;
pub mod task;
