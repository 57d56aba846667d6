//! Shared helpers for the end-to-end tests: compile a source string
//! through a fresh pipeline and hand back either the IR or the error
//! messages.

use staticlang_compile::Pipeline;

pub fn compile(source: &str) -> Result<String, Vec<String>> {
    let mut pipeline = Pipeline::default();
    match pipeline.compile("test.sl", source) {
        Some(ir) => Ok(ir),
        None => Err(pipeline
            .diagnostics()
            .errors()
            .map(|d| d.message.clone())
            .collect()),
    }
}

pub fn compile_ok(source: &str) -> String {
    compile(source).unwrap_or_else(|errors| panic!("expected IR, got errors: {:?}", errors))
}

pub fn compile_err(source: &str) -> Vec<String> {
    match compile(source) {
        Ok(ir) => panic!("expected errors, got IR:\n{}", ir),
        Err(errors) => errors,
    }
}

/// Checks the structural invariant on emitted IR: inside every function,
/// each basic block ends with exactly one terminator and nothing follows
/// a terminator within its block.
pub fn assert_blocks_terminated(ir: &str) {
    let mut in_function = false;
    let mut last_was_terminator = false;
    let mut current_block = String::new();

    for line in ir.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("define ") {
            in_function = true;
            last_was_terminator = false;
            current_block.clear();
            continue;
        }
        if !in_function {
            continue;
        }
        if trimmed == "}" {
            assert!(
                last_was_terminator,
                "function body ended without a terminator (last block '{}')",
                current_block
            );
            in_function = false;
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        if let Some(label) = trimmed.strip_suffix(':') {
            if !current_block.is_empty() {
                assert!(
                    last_was_terminator,
                    "block '{}' fell through into '{}' without a terminator",
                    current_block, label
                );
            }
            current_block = label.to_string();
            last_was_terminator = false;
            continue;
        }
        assert!(
            !last_was_terminator,
            "instruction after terminator in block '{}': {}",
            current_block, trimmed
        );
        last_was_terminator = trimmed.starts_with("br ") || trimmed.starts_with("ret");
    }
}
