//! Stand-in for the media server's transcoder binary.
//!
//! The media server executes this binary exactly as it would execute its
//! transcoder. The invocation is forwarded into an ephemeral pod and the
//! process exits with the pod's outcome.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use k8s_openapi::api::core::v1::Pod;
use serde::Serialize;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use kube_transcoder::config::{parse_env_vars, Settings};
use kube_transcoder::error::TranscodeError;
use kube_transcoder::orchestrator::KubePodClient;
use kube_transcoder::rewrite::rewrite_args;
use kube_transcoder::shutdown::install_shutdown_handler;
use kube_transcoder::transcoder::{build_pod, TranscodeRunner};

#[derive(Serialize)]
struct DryRunOutput<'a> {
    namespace: &'a str,
    pod: &'a Pod,
}

fn os_to_string(value: OsString) -> String {
    value.to_string_lossy().into_owned()
}

/// Host environment, skipping entries that are not valid UTF-8.
fn host_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut command: Vec<String> = std::env::args_os().map(os_to_string).collect();
    let program = command
        .first()
        .cloned()
        .unwrap_or_else(|| "kube-transcoder".to_string());

    // argv is the transcoder's, only the environment configures us
    let settings = Settings::try_parse_from([program])?;

    rewrite_args(&mut command, settings.pms_internal_address.as_deref());

    let mut env_vars = host_env();
    env_vars.extend(parse_env_vars(settings.extra_env_entries())?);

    let working_dir = std::env::current_dir()?;
    let job = settings.job_config(working_dir, command, env_vars);

    if settings.dry_run {
        let pod = build_pod(&job);
        let output = DryRunOutput {
            namespace: &job.namespace,
            pod: &pod,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let shutdown = install_shutdown_handler()?;

    let client = KubePodClient::connect()
        .await
        .map_err(TranscodeError::Connect)?;
    let runner = TranscodeRunner::new(Arc::new(client), settings.runner_config());

    tracing::info!(
        namespace = %job.namespace,
        image = %job.image,
        data_pvc = %job.data_pvc,
        working_dir = %job.working_dir.display(),
        "Offloading transcode"
    );

    runner.run_and_wait(&job, shutdown).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // stdout belongs to whoever launched the transcoder
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let span = tracing::info_span!("transcode", run_id = %Uuid::new_v4());
    match run().instrument(span.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _entered = span.enter();
            let pod = e
                .downcast_ref::<TranscodeError>()
                .and_then(TranscodeError::pod_name);
            tracing::error!(pod = ?pod, error = %e, "Transcode failed");
            ExitCode::FAILURE
        }
    }
}
