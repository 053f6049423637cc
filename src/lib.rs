//! fio-target: remote-controllable storage exerciser.
//!
//! A gRPC service that attaches and detaches a storage device under test
//! and runs fio against the volumes it exposes, returning the raw fio
//! output to the caller. External test orchestration drives it over the
//! network to validate storage hardware and virtual devices.

// tonic::Status is large by design (176 bytes)
#![allow(clippy::result_large_err)]

pub mod error;
pub mod exerciser;
pub mod fio;
pub mod service;
pub mod types;

pub mod proto {
    tonic::include_proto!("host_target.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("host_target_descriptor");
}

pub use error::{Error, Result};
pub use exerciser::{resolve_exerciser, DeviceExerciser, ExerciserFactory, KvmExerciser};
pub use fio::{FioArgs, FioRunner};
pub use service::HostTargetService;
pub use types::VolumeId;

#[cfg(test)]
pub(crate) mod test_util;
