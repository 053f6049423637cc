//! fio-target: gRPC storage exerciser for devices under test.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fio_target::exerciser::{self, KvmExerciser};
use fio_target::fio::FioRunner;
use fio_target::proto::host_target_server::HostTargetServer;
use fio_target::proto::FILE_DESCRIPTOR_SET;
use fio_target::service::HostTargetService;

#[derive(Parser, Debug)]
#[command(name = "fio-target")]
#[command(about = "Remote-controllable storage exerciser")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    addr: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 50051)]
    port: u16,

    /// Directory holding an exerciser customization, if any.
    #[arg(long)]
    customization_dir: Option<PathBuf>,

    /// fio binary to invoke.
    #[arg(long, default_value = "fio")]
    fio_command: PathBuf,

    /// Worker pool size for blocking fio and device operations.
    #[arg(long, default_value_t = 10)]
    workers: usize,

    /// Verbosity level (0-4).
    #[arg(short, default_value = "0")]
    v: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Only fio-target gets detailed logging; dependencies stay at warn.
    let filter = match args.v {
        0 => "warn",
        1 => "fio_target=info,warn",
        2 => "fio_target=debug,warn",
        3 => "fio_target=trace,warn",
        _ => "fio_target=trace,info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // Each in-flight fio run or device operation occupies one blocking slot
    // for its full duration; the pool bounds request concurrency.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(args.workers.max(1))
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(serve(args))
}

async fn serve(args: Args) -> anyhow::Result<()> {
    // Resolved exactly once; a configured customization that cannot produce
    // a fully capable exerciser aborts startup before the listener binds.
    let exerciser = exerciser::resolve_exerciser(
        args.customization_dir.as_deref(),
        exerciser::find_custom_factory,
        || Box::new(KvmExerciser::new(FioRunner::new(args.fio_command.clone()))),
    )
    .context("no device exerciser created")?;

    let addr: SocketAddr = format!("{}:{}", args.addr, args.port)
        .parse()
        .context("invalid listen address")?;

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()
        .context("failed to build reflection service")?;

    info!(%addr, workers = args.workers, "starting host target service");

    Server::builder()
        .add_service(reflection)
        .add_service(HostTargetServer::new(HostTargetService::new(exerciser)))
        .serve(addr)
        .await
        .context("gRPC server failed")?;

    Ok(())
}
