//! Error types for the host target service.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Host target errors with structured context.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed fio arguments: {0}")]
    BadFioArgs(String),

    #[error("explicitly specifying `{key}` as a fio argument is not allowed")]
    ReservedArgument { key: &'static str },

    #[error("volume id must not be empty")]
    EmptyVolumeId,

    #[error("disk to exercise is required")]
    MissingDisk,

    #[error("fio execution error: '{stdout}' | '{stderr}'")]
    FioFailed { stdout: String, stderr: String },

    #[error("failed to invoke fio for arguments '{args}': {source}")]
    FioSpawn { args: String, source: io::Error },

    #[error("device not found: {handle}")]
    DeviceNotFound { handle: String },

    #[error("failed to plug device {handle}: {source}")]
    Plug { handle: String, source: io::Error },

    #[error("failed to unplug device {handle}: {source}")]
    Unplug { handle: String, source: io::Error },

    /// Startup-only: a configured customization yielded no usable exerciser.
    #[error("customization at {} produced no device exerciser", path.display())]
    NoCustomExerciser { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        // Every per-request failure surfaces as FAILED_PRECONDITION carrying
        // only the message text; internal types never cross the boundary.
        tonic::Status::failed_precondition(err.to_string())
    }
}
