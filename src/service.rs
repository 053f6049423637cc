//! HostTarget gRPC service implementation.
//!
//! Thin gRPC layer that validates requests, builds domain values, and
//! delegates to the resolved exerciser. Every failure on the request path
//! crosses the boundary as a single uniform FAILED_PRECONDITION status.

use std::collections::BTreeSet;
use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::exerciser::DeviceExerciser;
use crate::fio::FioArgs;
use crate::proto;
use crate::types::VolumeId;

pub struct HostTargetService {
    exerciser: Arc<dyn DeviceExerciser>,
}

impl HostTargetService {
    pub fn new(exerciser: Arc<dyn DeviceExerciser>) -> Self {
        Self { exerciser }
    }

    async fn exercise(&self, req: proto::RunFioRequest) -> Result<String> {
        let disk = req.disk_to_exercise.ok_or(Error::MissingDisk)?;

        let mut volumes = BTreeSet::new();
        for raw in &disk.volume_id {
            info!(volume_id = %raw, "volume to exercise");
            volumes.insert(VolumeId::parse(raw.clone())?);
        }

        let args = FioArgs::parse(&req.fio_args)?;
        self.exerciser
            .run_fio(&disk.device_handle, &volumes, args)
            .await
    }
}

#[tonic::async_trait]
impl proto::host_target_server::HostTarget for HostTargetService {
    async fn run_fio(
        &self,
        request: Request<proto::RunFioRequest>,
    ) -> std::result::Result<Response<proto::RunFioReply>, Status> {
        let req = request.into_inner();
        info!(?req, "RunFio");

        match self.exercise(req).await {
            Ok(fio_output) => Ok(Response::new(proto::RunFioReply { fio_output })),
            Err(e) => {
                error!(error = %e, "RunFio failed");
                Err(e.into())
            }
        }
    }

    async fn plug_device(
        &self,
        request: Request<proto::PlugDeviceRequest>,
    ) -> std::result::Result<Response<proto::PlugDeviceReply>, Status> {
        let req = request.into_inner();
        info!(?req, "PlugDevice");

        match self.exerciser.plug_device(&req.device_handle).await {
            Ok(()) => Ok(Response::new(proto::PlugDeviceReply {})),
            Err(e) => {
                error!(error = %e, "PlugDevice failed");
                Err(e.into())
            }
        }
    }

    async fn unplug_device(
        &self,
        request: Request<proto::UnplugDeviceRequest>,
    ) -> std::result::Result<Response<proto::UnplugDeviceReply>, Status> {
        let req = request.into_inner();
        info!(?req, "UnplugDevice");

        match self.exerciser.unplug_device(&req.device_handle).await {
            Ok(()) => Ok(Response::new(proto::UnplugDeviceReply {})),
            Err(e) => {
                error!(error = %e, "UnplugDevice failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    use crate::proto::host_target_server::HostTarget;
    use crate::test_util::{MockExerciser, TestFixture};

    fn run_fio_request(
        device_handle: &str,
        volume_ids: &[&str],
        fio_args: &str,
    ) -> proto::RunFioRequest {
        proto::RunFioRequest {
            disk_to_exercise: Some(proto::DiskToExercise {
                device_handle: device_handle.to_string(),
                volume_id: volume_ids.iter().map(|id| id.to_string()).collect(),
            }),
            fio_args: fio_args.to_string(),
        }
    }

    #[tokio::test]
    async fn run_fio_returns_tool_output_verbatim() {
        let fixture = TestFixture::new(MockExerciser::ok("fio: all good\n"));

        let response = fixture
            .service()
            .run_fio(Request::new(run_fio_request(
                "0000:01:00.0",
                &["/dev/vda"],
                r#"{"rw": "read"}"#,
            )))
            .await
            .expect("RunFio should succeed");

        assert_eq!(response.into_inner().fio_output, "fio: all good\n");
    }

    #[tokio::test]
    async fn run_fio_passes_handle_and_volume_set_to_backend() {
        let fixture = TestFixture::new(MockExerciser::ok(""));

        fixture
            .service()
            .run_fio(Request::new(run_fio_request(
                "0000:01:00.0",
                &["/dev/b", "/dev/a", "/dev/a"],
                "{}",
            )))
            .await
            .expect("RunFio should succeed");

        assert_eq!(fixture.calls(), vec!["run_fio 0000:01:00.0 [/dev/a:/dev/b]"]);
    }

    #[tokio::test]
    async fn run_fio_requires_disk_to_exercise() {
        let fixture = TestFixture::new(MockExerciser::ok(""));
        let request = proto::RunFioRequest {
            disk_to_exercise: None,
            fio_args: "{}".to_string(),
        };

        let err = fixture
            .service()
            .run_fio(Request::new(request))
            .await
            .expect_err("should fail");

        assert_eq!(err.code(), Code::FailedPrecondition);
    }

    #[tokio::test]
    async fn run_fio_rejects_empty_volume_id() {
        let fixture = TestFixture::new(MockExerciser::ok(""));

        let err = fixture
            .service()
            .run_fio(Request::new(run_fio_request("dev", &["/dev/a", ""], "{}")))
            .await
            .expect_err("should fail");

        assert_eq!(err.code(), Code::FailedPrecondition);
        assert!(fixture.calls().is_empty());
    }

    #[tokio::test]
    async fn run_fio_rejects_malformed_arguments() {
        let fixture = TestFixture::new(MockExerciser::ok(""));

        let err = fixture
            .service()
            .run_fio(Request::new(run_fio_request("dev", &["/dev/a"], "not json")))
            .await
            .expect_err("should fail");

        assert_eq!(err.code(), Code::FailedPrecondition);
        assert!(fixture.calls().is_empty());
    }

    #[tokio::test]
    async fn run_fio_rejects_explicit_filename_argument() {
        let fixture = TestFixture::new(MockExerciser::ok(""));

        let err = fixture
            .service()
            .run_fio(Request::new(run_fio_request(
                "dev",
                &["/dev/a"],
                r#"{"filename": "/dev/x"}"#,
            )))
            .await
            .expect_err("should fail");

        assert_eq!(err.code(), Code::FailedPrecondition);
        assert!(err.message().contains("filename"));
        assert!(fixture.calls().is_empty());
    }

    #[tokio::test]
    async fn run_fio_surfaces_backend_failure_detail() {
        let fixture = TestFixture::new(MockExerciser::failing("bad option"));

        let err = fixture
            .service()
            .run_fio(Request::new(run_fio_request(
                "dev",
                &["/dev/a"],
                r#"{"rw": "read"}"#,
            )))
            .await
            .expect_err("should fail");

        assert_eq!(err.code(), Code::FailedPrecondition);
        assert!(err.message().contains("bad option"));
    }

    #[tokio::test]
    async fn plug_device_delegates_to_backend() {
        let fixture = TestFixture::new(MockExerciser::ok(""));

        fixture
            .service()
            .plug_device(Request::new(proto::PlugDeviceRequest {
                device_handle: "0000:01:00.0".to_string(),
            }))
            .await
            .expect("PlugDevice should succeed");

        assert_eq!(fixture.calls(), vec!["plug_device 0000:01:00.0"]);
    }

    #[tokio::test]
    async fn unplug_device_delegates_to_backend() {
        let fixture = TestFixture::new(MockExerciser::ok(""));

        fixture
            .service()
            .unplug_device(Request::new(proto::UnplugDeviceRequest {
                device_handle: "0000:01:00.0".to_string(),
            }))
            .await
            .expect("UnplugDevice should succeed");

        assert_eq!(fixture.calls(), vec!["unplug_device 0000:01:00.0"]);
    }

    #[tokio::test]
    async fn plug_device_failure_maps_to_failed_precondition() {
        let fixture = TestFixture::new(MockExerciser::failing("no such device"));

        let err = fixture
            .service()
            .plug_device(Request::new(proto::PlugDeviceRequest {
                device_handle: "0000:01:00.0".to_string(),
            }))
            .await
            .expect_err("should fail");

        assert_eq!(err.code(), Code::FailedPrecondition);
        assert!(err.message().contains("no such device"));
    }
}
