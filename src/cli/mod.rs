//! CLI subcommand implementations for the dropwatch binary.

pub mod check_cmd;
pub mod output;
pub mod probe_cmd;
pub mod state_cmd;
