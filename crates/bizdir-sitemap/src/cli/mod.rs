//! CLI subcommand implementations for the bizdir-sitemap binary.

pub mod check_cmd;
pub mod generate_cmd;
pub mod output;
pub mod preview_cmd;
pub mod progress;
