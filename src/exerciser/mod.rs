//! Pluggable device exerciser backends.
//!
//! A backend performs device plug/unplug and fio execution. One backend is
//! resolved at process startup, either the built-in [`KvmExerciser`] or one
//! produced by a customization hook, and is shared by every worker for the
//! lifetime of the process.

pub mod kvm;

pub use kvm::KvmExerciser;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::fio::FioArgs;
use crate::types::VolumeId;

/// Capability set a device exerciser must provide.
///
/// Implementations are shared across workers and must tolerate concurrent
/// invocation; serializing conflicting operations against the same physical
/// device is the implementation's responsibility.
#[tonic::async_trait]
pub trait DeviceExerciser: Send + Sync {
    /// Run fio against the given volumes on the device, returning raw
    /// fio output.
    async fn run_fio(
        &self,
        device_handle: &str,
        volumes: &BTreeSet<VolumeId>,
        args: FioArgs,
    ) -> Result<String>;

    /// Attach the device under test to the host.
    async fn plug_device(&self, device_handle: &str) -> Result<()>;

    /// Detach the device under test from the host.
    async fn unplug_device(&self, device_handle: &str) -> Result<()>;
}

impl std::fmt::Debug for dyn DeviceExerciser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeviceExerciser")
    }
}

/// Zero-argument constructor returned by a customization hook.
///
/// Yields `None` when the customization cannot produce a usable exerciser.
pub type ExerciserFactory = Box<dyn FnOnce() -> Option<Box<dyn DeviceExerciser>> + Send>;

/// Customization lookup used by the shipped binary.
///
/// Downstream builds replace this hook to graft their own backend in; the
/// stock build has no customizations to discover.
pub fn find_custom_factory(_customization_dir: &Path) -> Option<ExerciserFactory> {
    None
}

/// Resolve the process-wide exerciser, exactly once at startup.
///
/// The hook is consulted only when a customization path is configured. A
/// factory that fails to produce an exerciser is fatal: the service never
/// starts with a partially capable backend.
pub fn resolve_exerciser<F, D>(
    customization_dir: Option<&Path>,
    find_custom_factory: F,
    make_default: D,
) -> Result<Arc<dyn DeviceExerciser>>
where
    F: FnOnce(&Path) -> Option<ExerciserFactory>,
    D: FnOnce() -> Box<dyn DeviceExerciser>,
{
    let custom = customization_dir.and_then(|dir| {
        find_custom_factory(dir).map(|factory| (dir.to_path_buf(), factory))
    });

    match custom {
        Some((path, factory)) => {
            info!(path = %path.display(), "customized exerciser factory found, creating one");
            let exerciser = factory().ok_or(Error::NoCustomExerciser { path })?;
            Ok(Arc::from(exerciser))
        }
        None => {
            info!("using default device exerciser");
            Ok(Arc::from(make_default()))
        }
    }
}
