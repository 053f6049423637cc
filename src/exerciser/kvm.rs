//! Default exerciser for virtio-blk devices exposed to a KVM host.
//!
//! Plug and unplug are PCI hotplug gestures through sysfs; fio runs against
//! the volumes as local block devices.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use tokio::task;
use tracing::{debug, info};

use super::DeviceExerciser;
use crate::error::{Error, Result};
use crate::fio::{FioArgs, FioRunner};
use crate::types::VolumeId;

const PCI_SYSFS_ROOT: &str = "/sys/bus/pci";

/// Built-in exerciser targeting PCI devices on the local host.
pub struct KvmExerciser {
    runner: FioRunner,
    sysfs_root: PathBuf,
}

impl KvmExerciser {
    pub fn new(runner: FioRunner) -> Self {
        Self {
            runner,
            sysfs_root: PathBuf::from(PCI_SYSFS_ROOT),
        }
    }

    /// Override the sysfs bus root. Used by tests to fake PCI hotplug.
    pub fn with_sysfs_root(runner: FioRunner, sysfs_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            sysfs_root: sysfs_root.into(),
        }
    }

    fn device_dir(&self, device_handle: &str) -> PathBuf {
        self.sysfs_root.join("devices").join(device_handle)
    }
}

impl Default for KvmExerciser {
    fn default() -> Self {
        Self::new(FioRunner::default())
    }
}

#[tonic::async_trait]
impl DeviceExerciser for KvmExerciser {
    async fn run_fio(
        &self,
        device_handle: &str,
        volumes: &BTreeSet<VolumeId>,
        mut args: FioArgs,
    ) -> Result<String> {
        debug!(device_handle, volumes = volumes.len(), "running fio");
        args.add_volumes_to_exercise(volumes);

        // fio blocks for the whole job; keep it off the async runtime.
        let runner = self.runner.clone();
        task::spawn_blocking(move || runner.run(&args))
            .await
            .map_err(|e| Error::Io(io::Error::other(format!("task join error: {e}"))))?
    }

    async fn plug_device(&self, device_handle: &str) -> Result<()> {
        // A bus rescan picks up the freshly exposed function.
        fs::write(self.sysfs_root.join("rescan"), "1").map_err(|source| Error::Plug {
            handle: device_handle.to_string(),
            source,
        })?;

        if !self.device_dir(device_handle).exists() {
            return Err(Error::DeviceNotFound {
                handle: device_handle.to_string(),
            });
        }

        info!(device_handle, "device plugged");
        Ok(())
    }

    async fn unplug_device(&self, device_handle: &str) -> Result<()> {
        fs::write(self.device_dir(device_handle).join("remove"), "1").map_err(|source| {
            Error::Unplug {
                handle: device_handle.to_string(),
                source,
            }
        })?;

        info!(device_handle, "device unplugged");
        Ok(())
    }
}
