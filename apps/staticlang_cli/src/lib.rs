//! # staticlang-cli
//!
//! Library backing the `slc` binary. The binary itself is a thin wrapper
//! around [`run_cli`]; keeping the logic here makes the driver testable
//! without spawning processes.

pub mod cli;

pub use cli::{run, run_cli, Cli};
