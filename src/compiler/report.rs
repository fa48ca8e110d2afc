// src/compiler/report.rs

//! Logging of bundler results.

use std::path::Path;

use tracing::{error, info};

use crate::exec::ProcessOutput;

/// Log the result of a bundler run with the severities callers rely on:
///
/// - success: `info` summary, `error` for a non-empty stderr (tools warn on
///   stderr and still exit 0), `info` for stdout when `verbose` is set;
/// - failure: a single `error` report with the exit status and every
///   non-empty stream.
pub fn log_process_output(output: &ProcessOutput, output_dir: &Path, verbose: bool) {
    if output.status.success() {
        info!("Compiled all packs in {}", output_dir.display());

        if !output.stderr.is_empty() {
            error!("{}", output.stderr);
        }

        if verbose && !output.stdout.is_empty() {
            info!("{}", output.stdout);
        }
    } else {
        error!(status = %output.status, "{}", failure_report(output));
    }
}

/// Composite report for a failed build.
pub fn failure_report(output: &ProcessOutput) -> String {
    let streams: Vec<&str> = [output.stdout.as_str(), output.stderr.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();

    format!(
        "\nCOMPILATION FAILED:\nEXIT STATUS: {}\nOUTPUTS:\n{}",
        output.status,
        streams.join("\n\n")
    )
}
