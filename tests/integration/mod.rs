//! Integration tests for the subspec generator

mod cli_binary;
mod config_layers;
mod generation_run;
mod test_utils;
