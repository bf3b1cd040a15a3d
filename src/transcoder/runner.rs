use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use tokio_util::sync::CancellationToken;

use super::pod::build_pod;
use crate::config::{JobConfig, RunnerConfig};
use crate::error::{Result, TranscodeError};
use crate::orchestrator::{PodClient, PodPhase};

/// A pod that was accepted by the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodHandle {
    pub namespace: String,
    /// Name assigned by the API server at creation time
    pub name: String,
}

/// Drives one transcoder pod from submission to deletion.
///
/// At most one pod exists per [`run_and_wait`](Self::run_and_wait) call, and
/// once it has been created the runner deletes it on every exit path.
#[derive(Clone)]
pub struct TranscodeRunner {
    client: Arc<dyn PodClient>,
    config: RunnerConfig,
}

impl TranscodeRunner {
    pub fn new(client: Arc<dyn PodClient>, config: RunnerConfig) -> Self {
        Self { client, config }
    }

    /// Create the pod. Attempted once, any rejection is final.
    pub async fn submit(&self, namespace: &str, pod: &Pod) -> Result<PodHandle> {
        let name = self
            .client
            .create_pod(namespace, pod)
            .await
            .map_err(TranscodeError::Submit)?;

        tracing::info!(pod = %name, namespace, "Transcoder pod created");

        Ok(PodHandle {
            namespace: namespace.to_string(),
            name,
        })
    }

    /// Poll the pod until it reaches a terminal phase.
    ///
    /// Returns `Ok` on `Succeeded` and [`TranscodeError::JobFailed`] on
    /// `Failed`. A single failed status read ends the wait with
    /// [`TranscodeError::Poll`].
    pub async fn wait_for_completion(&self, handle: &PodHandle) -> Result<()> {
        poll_until_terminal(self.client.as_ref(), handle, self.config.poll_interval).await
    }

    /// Delete the pod.
    pub async fn cleanup(&self, handle: &PodHandle) -> Result<()> {
        tracing::info!(pod = %handle.name, "Cleaning up transcoder pod");
        self.client
            .delete_pod(&handle.namespace, &handle.name)
            .await
            .map_err(|source| TranscodeError::Cleanup {
                pod: handle.name.clone(),
                source,
            })
    }

    /// Build and submit the pod for `job`, wait for it to finish and delete it.
    ///
    /// The status poller runs as its own task and races `shutdown`. When
    /// `shutdown` fires first the poller is aborted, the pod is deleted on a
    /// best-effort basis within the cleanup grace period and
    /// [`TranscodeError::Interrupted`] is returned.
    ///
    /// If the job fails and the delete fails too, the job failure is
    /// returned and the delete failure is only logged. After a successful
    /// job a failed delete is returned as [`TranscodeError::Cleanup`].
    pub async fn run_and_wait(&self, job: &JobConfig, shutdown: CancellationToken) -> Result<()> {
        let pod = build_pod(job);
        let handle = self.submit(&job.namespace, &pod).await?;

        let client = Arc::clone(&self.client);
        let poll_handle = handle.clone();
        let interval = self.config.poll_interval;
        let mut wait_task = tokio::spawn(async move {
            poll_until_terminal(client.as_ref(), &poll_handle, interval).await
        });

        let max_wait = self.config.max_wait;
        let deadline = async move {
            match max_wait {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let result = tokio::select! {
            joined = &mut wait_task => match joined {
                Ok(result) => result,
                Err(e) => Err(TranscodeError::Internal(format!("status poller stopped: {}", e))),
            },
            _ = shutdown.cancelled() => {
                wait_task.abort();
                let _ = wait_task.await;
                tracing::warn!(pod = %handle.name, "Interrupted while waiting, removing transcoder pod");
                self.cleanup_within_grace_period(&handle).await;
                return Err(TranscodeError::Interrupted { pod: handle.name });
            }
            _ = deadline => {
                wait_task.abort();
                let _ = wait_task.await;
                Err(TranscodeError::TimedOut {
                    pod: handle.name.clone(),
                    waited: max_wait.unwrap_or_default(),
                })
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(pod = %handle.name, "Transcoder pod succeeded");
                self.cleanup(&handle).await
            }
            Err(err) => {
                if let Err(cleanup_err) = self.cleanup(&handle).await {
                    tracing::warn!(
                        pod = %handle.name,
                        error = %cleanup_err,
                        "Failed to delete transcoder pod after error"
                    );
                }
                Err(err)
            }
        }
    }

    async fn cleanup_within_grace_period(&self, handle: &PodHandle) {
        let grace = self.config.cleanup_grace_period;
        match tokio::time::timeout(grace, self.cleanup(handle)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(pod = %handle.name, error = %e, "Failed to delete transcoder pod");
            }
            Err(_) => {
                tracing::warn!(
                    pod = %handle.name,
                    grace_period = ?grace,
                    "Timed out deleting transcoder pod"
                );
            }
        }
    }
}

async fn poll_until_terminal(
    client: &dyn PodClient,
    handle: &PodHandle,
    interval: Duration,
) -> Result<()> {
    loop {
        let phase = client
            .pod_phase(&handle.namespace, &handle.name)
            .await
            .map_err(|source| TranscodeError::Poll {
                pod: handle.name.clone(),
                source,
            })?;

        tracing::debug!(pod = %handle.name, phase = %phase, "Observed pod phase");

        match phase {
            PodPhase::Pending | PodPhase::Running => {}
            PodPhase::Unknown => {
                tracing::warn!(pod = %handle.name, "Pod is in an unknown state");
            }
            PodPhase::Failed => {
                return Err(TranscodeError::JobFailed {
                    pod: handle.name.clone(),
                });
            }
            PodPhase::Succeeded => return Ok(()),
        }

        tokio::time::sleep(interval).await;
    }
}
