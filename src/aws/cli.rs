//! AWS CLI command execution.
//!
//! Provides utilities for running AWS CLI commands and capturing their output.

use colored::Colorize;
use std::error::Error;
use std::process::Command;

/// Largest stdout accepted from a single command.
const MAX_OUTPUT_BYTES: usize = 500_000;

/// Run `program` with `args` and return its stdout.
///
/// # Returns
/// * `Ok(String)` - The stdout output on success
/// * `Err` - If the command cannot start, exits non-zero or produces too much output
pub fn run(program: &str, args: &[String]) -> Result<String, Box<dyn Error>> {
    let cmd = command_line(program, args);
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let output = Command::new(program).args(args).output().map_err(|e| {
        log::error!("Command execution failed: {}", e);
        format!("Failed to execute command {program}: {}", e)
    })?;

    if output.status.success() {
        log::debug!("Success output.stdout.len(): {}", output.stdout.len());
        log::debug!("Success output.status.code(): {:?}", output.status.code());

        if output.stdout.len() > MAX_OUTPUT_BYTES {
            return Err(format!(
                "Response too large: {} bytes for command: {cmd}",
                output.stdout.len()
            )
            .into());
        }
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!(
            "{failed} to run {cmd}",
            failed = "failed".on_red(),
            cmd = cmd.on_blue()
        );
        return Err(format!("ERROR running: {}", stderr.trim()).into());
    }

    let stdout = String::from_utf8(output.stdout).map_err(|e| format!("Invalid UTF-8: {}", e))?;

    Ok(stdout)
}

/// Render a command line for logging, quoting arguments that need it.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|arg| {
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"') {
                format!("'{arg}'")
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
