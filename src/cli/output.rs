//! Output formatting for CLI commands.
//!
//! Every command result renders both for people and for `--json` consumers.

use std::io::{self, Write};

use serde::Serialize;

/// A command result printable as text or JSON.
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

/// Print `result` to stdout in the selected mode.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    // a closed stdout (e.g. `| head`) is not an error worth reporting
    let _ = write_output(&mut io::stdout().lock(), result, json_mode);
}

fn write_output<W: Write, T: CommandOutput>(out: &mut W, result: &T, json_mode: bool) -> io::Result<()> {
    if json_mode {
        let rendered = serde_json::to_string_pretty(&result.to_json()).unwrap_or_default();
        writeln!(out, "{rendered}")
    } else {
        writeln!(out, "{}", result.to_human())
    }
}
