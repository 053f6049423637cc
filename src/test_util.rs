//! Shared test utilities.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::exerciser::DeviceExerciser;
use crate::fio::FioArgs;
use crate::service::HostTargetService;
use crate::types::VolumeId;

/// Scripted exerciser recording the calls it receives.
pub struct MockExerciser {
    fio_output: String,
    fail_stderr: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockExerciser {
    /// An exerciser whose operations all succeed, returning `output` from
    /// `run_fio`.
    pub fn ok(output: &str) -> Self {
        Self {
            fio_output: output.to_string(),
            fail_stderr: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An exerciser whose operations all fail with the given detail text.
    pub fn failing(stderr: &str) -> Self {
        Self {
            fio_output: String::new(),
            fail_stderr: Some(stderr.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn outcome(&self) -> Result<()> {
        match &self.fail_stderr {
            Some(stderr) => Err(Error::FioFailed {
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[tonic::async_trait]
impl DeviceExerciser for MockExerciser {
    async fn run_fio(
        &self,
        device_handle: &str,
        volumes: &BTreeSet<VolumeId>,
        _args: FioArgs,
    ) -> Result<String> {
        let targets: Vec<&str> = volumes.iter().map(VolumeId::as_str).collect();
        self.record(format!(
            "run_fio {device_handle} [{}]",
            targets.join(":")
        ));
        self.outcome().map(|()| self.fio_output.clone())
    }

    async fn plug_device(&self, device_handle: &str) -> Result<()> {
        self.record(format!("plug_device {device_handle}"));
        self.outcome()
    }

    async fn unplug_device(&self, device_handle: &str) -> Result<()> {
        self.record(format!("unplug_device {device_handle}"));
        self.outcome()
    }
}

/// Test fixture wiring a [`MockExerciser`] into the service while keeping a
/// handle on the mock for call inspection.
pub struct TestFixture {
    pub mock: Arc<MockExerciser>,
}

impl TestFixture {
    pub fn new(mock: MockExerciser) -> Self {
        Self {
            mock: Arc::new(mock),
        }
    }

    pub fn service(&self) -> HostTargetService {
        HostTargetService::new(self.mock.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.mock.calls.lock().unwrap().clone()
    }
}
