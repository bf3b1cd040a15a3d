//! Access to the cluster orchestrator.
//!
//! The lifecycle runner only ever needs three calls against the pod API,
//! which are captured by the [`PodClient`] trait:
//! - **create**: submit a pod and learn the name the API server assigned
//! - **phase**: read the pod's current phase
//! - **delete**: remove the pod once it is no longer needed
//!
//! [`KubePodClient`] is the production implementation backed by `kube`.
//! Tests substitute a scripted client.

pub mod kube_client;
pub mod phase;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;

use crate::error::OrchestratorError;

pub use kube_client::KubePodClient;
pub use phase::PodPhase;

#[async_trait]
pub trait PodClient: Send + Sync {
    /// Create `pod` in `namespace` and return the name assigned by the API server.
    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<String, OrchestratorError>;

    async fn pod_phase(&self, namespace: &str, name: &str) -> Result<PodPhase, OrchestratorError>;

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), OrchestratorError>;
}
