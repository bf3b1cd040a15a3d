use std::time::Duration;

use thiserror::Error;

/// Failure of a single call against the orchestrator API.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Created pod has no name assigned")]
    MissingName,

    /// Failure reported by a [`PodClient`](crate::orchestrator::PodClient)
    /// implementation that does not talk to the API server through `kube`.
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Failed to connect to cluster: {0}")]
    Connect(#[source] OrchestratorError),

    #[error("Failed to create transcoder pod: {0}")]
    Submit(#[source] OrchestratorError),

    #[error("Pod {pod:?} failed")]
    JobFailed { pod: String },

    #[error("Failed to read status of pod {pod:?}: {source}")]
    Poll {
        pod: String,
        #[source]
        source: OrchestratorError,
    },

    #[error("Interrupted while waiting for pod {pod:?}")]
    Interrupted { pod: String },

    #[error("Pod {pod:?} did not finish within {waited:?}")]
    TimedOut { pod: String, waited: Duration },

    #[error("Failed to delete pod {pod:?}: {source}")]
    Cleanup {
        pod: String,
        #[source]
        source: OrchestratorError,
    },

    #[error("Invalid environment entry {0:?}, expected KEY=VALUE")]
    InvalidEnvVar(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TranscodeError {
    /// Name of the pod the failure relates to, when one was created.
    pub fn pod_name(&self) -> Option<&str> {
        match self {
            TranscodeError::JobFailed { pod }
            | TranscodeError::Poll { pod, .. }
            | TranscodeError::Interrupted { pod }
            | TranscodeError::TimedOut { pod, .. }
            | TranscodeError::Cleanup { pod, .. } => Some(pod),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TranscodeError>;
