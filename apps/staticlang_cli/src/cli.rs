//! Argument parsing and dispatch for the `slc` binary.
//!
//! The driver is deliberately thin: it reads the input files, runs one
//! [`Pipeline`], renders the diagnostics to stderr (human-readable by
//! default, JSON with `--json`), and writes the IR to the output path or
//! stdout. All compilation logic lives in the library crates.
//!
//! # Exit codes
//!
//! - `0` — success, IR written
//! - `1` — compilation errors reported
//! - `2` — usage error (bad flags, unreadable input)

use clap::Parser as ClapParser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use staticlang_base::DiagnosticSink;
use staticlang_compile::{CodegenOptions, CompileOptions, Pipeline};

/// The StaticLang compiler.
///
/// Compiles StaticLang source files to textual LLVM IR for assembly by an
/// external LLVM toolchain.
#[derive(Debug, ClapParser)]
#[command(name = "slc", about = "The StaticLang compiler", version)]
pub struct Cli {
    /// Input source file(s); separate multiple paths with commas.
    #[arg(short = 'i', long = "input", value_delimiter = ',', required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output IR file path; stdout when omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Optimization level hint passed to the emitter.
    #[arg(short = 'O', long = "opt-level", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub opt_level: u8,

    /// Request debug info (reserved; currently ignored).
    #[arg(short = 'g', long = "debug-info")]
    pub debug_info: bool,

    /// Verbose progress on stderr.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Use mock components (test-only): emits a placeholder module
    /// without running the real pipeline.
    #[arg(long)]
    pub mock: bool,

    /// Render diagnostics as JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,

    /// Fail the compile when any warning is reported.
    #[arg(long = "warnings-as-errors")]
    pub warnings_as_errors: bool,
}

/// Parses the process arguments and runs the driver.
///
/// Returns the process exit code; clap handles `--help`/`--version` and
/// malformed flags itself (exiting with code 2 on usage errors).
pub fn run_cli() -> i32 {
    run(Cli::parse())
}

/// Runs the driver with already-parsed arguments.
pub fn run(cli: Cli) -> i32 {
    if cli.mock {
        return write_output(cli.output.as_deref(), "; staticlang mock module\n");
    }

    let mut units = Vec::new();
    for path in &cli.inputs {
        match fs::read_to_string(path) {
            Ok(source) => units.push((path.display().to_string(), source)),
            Err(err) => {
                eprintln!("slc: cannot read '{}': {}", path.display(), err);
                return 2;
            }
        }
    }

    if cli.verbose {
        eprintln!("slc: compiling {} file(s)", units.len());
        for (name, source) in &units {
            eprintln!("slc:   {} ({} bytes)", name, source.len());
        }
    }

    let options = CompileOptions {
        codegen: CodegenOptions { opt_level: cli.opt_level, ..CodegenOptions::default() },
        warnings_as_errors: cli.warnings_as_errors,
    };
    let mut pipeline = Pipeline::new(options);

    let unit_refs: Vec<(&str, &str)> = units
        .iter()
        .map(|(name, source)| (name.as_str(), source.as_str()))
        .collect();
    let ir = pipeline.compile_many(&unit_refs);

    let rendered = if cli.json {
        render_json(pipeline.diagnostics())
    } else {
        render_human(pipeline.diagnostics())
    };
    if !rendered.is_empty() {
        eprint!("{}", rendered);
    }

    if cli.verbose {
        let stats = pipeline.stats();
        eprintln!(
            "slc: {} tokens, {} declarations, {} arena bytes, {} errors, {} warnings",
            stats.tokens, stats.decls, stats.arena_bytes, stats.errors, stats.warnings
        );
    }

    match ir {
        Some(ir) => write_output(cli.output.as_deref(), &ir),
        None => 1,
    }
}

/// Renders diagnostics in document order, one per line, hints indented.
pub fn render_human(sink: &DiagnosticSink) -> String {
    let mut out = String::new();
    for diag in sink.sorted() {
        out.push_str(&diag.to_string());
        out.push('\n');
    }
    out
}

/// Renders diagnostics as a JSON array in document order.
pub fn render_json(sink: &DiagnosticSink) -> String {
    if sink.all().is_empty() {
        return String::new();
    }
    let mut out = serde_json::to_string_pretty(&sink.sorted()).unwrap_or_default();
    out.push('\n');
    out
}

fn write_output(path: Option<&std::path::Path>, ir: &str) -> i32 {
    match path {
        None => {
            print!("{}", ir);
            0
        }
        Some(path) => match fs::File::create(path).and_then(|mut f| f.write_all(ir.as_bytes())) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("slc: cannot write '{}': {}", path.display(), err);
                2
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_separated_inputs_split() {
        let cli = Cli::parse_from(["slc", "-i", "a.sl,b.sl", "-O", "2"]);
        let names: Vec<String> = cli.inputs.iter().map(|p| p.display().to_string()).collect();
        assert_eq!(names, ["a.sl", "b.sl"]);
        assert_eq!(cli.opt_level, 2);
    }

    #[test]
    fn flags_default_off() {
        let cli = Cli::parse_from(["slc", "-i", "a.sl"]);
        assert!(!cli.verbose);
        assert!(!cli.mock);
        assert!(!cli.json);
        assert!(!cli.warnings_as_errors);
        assert!(!cli.debug_info);
        assert!(cli.output.is_none());
        assert_eq!(cli.opt_level, 0);
    }

    #[test]
    fn opt_level_is_bounded() {
        assert!(Cli::try_parse_from(["slc", "-i", "a.sl", "-O", "4"]).is_err());
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        assert!(Cli::try_parse_from(["slc"]).is_err());
    }
}
