//! The `slc` binary: parse arguments, run the driver, exit with its code.
//!
//! # Exit codes
//!
//! - `0` — success
//! - `1` — compilation errors reported
//! - `2` — usage error

fn main() {
    std::process::exit(staticlang_cli::run_cli());
}
