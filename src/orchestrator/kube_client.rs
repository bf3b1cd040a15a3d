use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};

use super::{PodClient, PodPhase};
use crate::error::OrchestratorError;

/// [`PodClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubePodClient {
    client: Client,
}

impl KubePodClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the in-cluster service account, falling back to the
    /// local kubeconfig.
    pub async fn connect() -> Result<Self, OrchestratorError> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl PodClient for KubePodClient {
    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<String, OrchestratorError> {
        let created = self.pods(namespace).create(&PostParams::default(), pod).await?;
        created.metadata.name.ok_or(OrchestratorError::MissingName)
    }

    async fn pod_phase(&self, namespace: &str, name: &str) -> Result<PodPhase, OrchestratorError> {
        let pod = self.pods(namespace).get(name).await?;
        let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
        Ok(PodPhase::from_status(phase))
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), OrchestratorError> {
        self.pods(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}
