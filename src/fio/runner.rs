//! fio process execution.
//!
//! Pure process-execution boundary: renders a job file, invokes fio with
//! that file as its sole argument, and classifies the exit. Argument
//! semantics are never inspected here.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::fio::FioArgs;

/// Invokes the fio binary against a rendered job file.
#[derive(Debug, Clone)]
pub struct FioRunner {
    command: PathBuf,
}

impl FioRunner {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Run fio for the given job configuration, blocking until it exits.
    ///
    /// The job file path is the only argument and no shell is involved, so
    /// caller-influenced option values and volume ids are never interpreted.
    /// Both output streams are captured in full; a non-zero exit yields an
    /// error carrying them for postmortem diagnosis.
    pub fn run(&self, args: &FioArgs) -> Result<String> {
        let job = args.job_file().map_err(|err| match err {
            Error::Io(source) => Error::FioSpawn {
                args: args.to_string(),
                source,
            },
            other => other,
        })?;

        debug!(command = %self.command.display(), job_file = %job.path().display(), "invoking fio");

        let output = Command::new(&self.command)
            .arg(job.path())
            .output()
            .map_err(|source| Error::FioSpawn {
                args: args.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::FioFailed {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for FioRunner {
    fn default() -> Self {
        Self::new("fio")
    }
}
