//! Output helpers shared by the CLI commands.
//!
//! Global flags are propagated through environment variables so every
//! module can check them without threading state through call sites.

/// Whether `--json` was passed.
pub fn is_json() -> bool {
    std::env::var("DROPWATCH_JSON").is_ok()
}

/// Whether `--quiet` was passed.
pub fn is_quiet() -> bool {
    std::env::var("DROPWATCH_QUIET").is_ok()
}

/// Print a machine-readable JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".into())
    );
}

/// Print a human line unless quiet/json mode is active.
pub fn say(line: impl AsRef<str>) {
    if !is_quiet() && !is_json() {
        println!("{}", line.as_ref());
    }
}
