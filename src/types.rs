use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Where the last compilation digest is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestStorageMode {
    /// Store the digest in `<cache_path>/last-compilation-digest-<env>`.
    File,
    /// Keep the digest in memory only (lost on restart, so every new
    /// process compiles once).
    Memory,
}

impl Default for DigestStorageMode {
    fn default() -> Self {
        DigestStorageMode::File
    }
}

impl FromStr for DigestStorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(DigestStorageMode::File),
            "memory" => Ok(DigestStorageMode::Memory),
            other => Err(format!(
                "invalid digest_storage: {other} (expected \"file\" or \"memory\")"
            )),
        }
    }
}

/// Exit status of the external build process.
///
/// `Failed` carries the exit code, or `-1` when the process was terminated
/// by a signal and has no code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Success,
    Failed(i32),
}

impl ProcessStatus {
    pub fn success(&self) -> bool {
        matches!(self, ProcessStatus::Success)
    }

    pub fn from_exit_status(status: std::process::ExitStatus) -> Self {
        if status.success() {
            ProcessStatus::Success
        } else {
            ProcessStatus::Failed(status.code().unwrap_or(-1))
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Success => write!(f, "exit 0"),
            ProcessStatus::Failed(-1) => write!(f, "terminated by signal"),
            ProcessStatus::Failed(code) => write!(f, "exit {code}"),
        }
    }
}
