//! Test harness for lifecycle runner tests.
//!
//! Provides a scripted in-memory [`PodClient`] that records every call made
//! against it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use tracing_subscriber::fmt::MakeWriter;

use kube_transcoder::config::{JobConfig, RunnerConfig};
use kube_transcoder::error::OrchestratorError;
use kube_transcoder::orchestrator::{PodClient, PodPhase};
use kube_transcoder::transcoder::pod::GENERATE_NAME;

/// Suffix the mock "API server" appends to the generated name
pub const ASSIGNED_SUFFIX: &str = "x7k2p";

/// One scripted answer to a status read
#[derive(Debug, Clone)]
pub enum Step {
    Phase(PodPhase),
    Error(String),
}

/// Runner config with a short poll interval for fast tests
pub fn fast_runner_config() -> RunnerConfig {
    RunnerConfig {
        poll_interval: Duration::from_millis(5),
        cleanup_grace_period: Duration::from_millis(200),
        max_wait: None,
    }
}

pub fn test_job() -> JobConfig {
    JobConfig {
        namespace: "media".to_string(),
        command: vec![
            "/usr/lib/plexmediaserver/Plex Transcoder".to_string(),
            "-i".to_string(),
            "/data/movie.mkv".to_string(),
        ],
        ..JobConfig::default()
    }
}

pub fn assigned_name() -> String {
    format!("{}{}", GENERATE_NAME, ASSIGNED_SUFFIX)
}

/// Scripted pod client.
///
/// Status reads consume the script in order; once it runs out the last step
/// repeats forever.
#[derive(Default)]
pub struct MockPodClient {
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    create_error: Option<String>,
    delete_error: Option<String>,
    delete_delay: Option<Duration>,
    pub created: Mutex<Vec<(String, Pod)>>,
    pub deleted: Mutex<Vec<(String, String)>>,
    pub polls: AtomicUsize,
}

impl MockPodClient {
    pub fn with_phases(phases: &[PodPhase]) -> Self {
        Self::with_steps(phases.iter().copied().map(Step::Phase).collect())
    }

    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            ..Self::default()
        }
    }

    pub fn failing_create(mut self, message: &str) -> Self {
        self.create_error = Some(message.to_string());
        self
    }

    pub fn failing_delete(mut self, message: &str) -> Self {
        self.delete_error = Some(message.to_string());
        self
    }

    pub fn slow_delete(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// Names passed to `delete_pod`, in call order
    pub fn deleted_names(&self) -> Vec<String> {
        self.deleted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    fn next_step(&self) -> Step {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(step) = script.pop_front() {
            *last = Some(step.clone());
            step
        } else {
            last.clone().unwrap_or(Step::Phase(PodPhase::Pending))
        }
    }
}

#[async_trait]
impl PodClient for MockPodClient {
    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<String, OrchestratorError> {
        if let Some(ref message) = self.create_error {
            return Err(OrchestratorError::Transport(message.clone()));
        }
        self.created
            .lock()
            .unwrap()
            .push((namespace.to_string(), pod.clone()));
        Ok(assigned_name())
    }

    async fn pod_phase(&self, _namespace: &str, _name: &str) -> Result<PodPhase, OrchestratorError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Phase(phase) => Ok(phase),
            Step::Error(message) => Err(OrchestratorError::Transport(message)),
        }
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), OrchestratorError> {
        self.deleted
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        }
        match self.delete_error {
            Some(ref message) => Err(OrchestratorError::Transport(message.clone())),
            None => Ok(()),
        }
    }
}

/// In-memory log sink for asserting on emitted diagnostics
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a subscriber writing WARN and above into this capture for the
    /// current thread. Logging reverts when the guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
