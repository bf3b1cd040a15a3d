use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;

use crate::error::{Result, TranscodeError};

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_IMAGE: &str = "plexinc/pms-docker:latest";
pub const DEFAULT_DATA_PVC: &str = "plex-pvc";

/// Everything needed to describe one transcoder pod.
///
/// Built once at process start and handed to the runner by value; nothing
/// reads process-wide state after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Namespace the pod is created in
    pub namespace: String,
    /// Image containing the transcoder, normally the same as the media server's
    pub image: String,
    /// Working directory of the transcoder process
    pub working_dir: PathBuf,
    /// Full argv of the transcoder process
    pub command: Vec<String>,
    /// Environment of the transcoder process
    pub env_vars: BTreeMap<String, String>,
    /// Pre-existing persistent volume claim holding the media library
    pub data_pvc: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            working_dir: PathBuf::from("."),
            command: Vec::new(),
            env_vars: BTreeMap::new(),
            data_pvc: DEFAULT_DATA_PVC.to_string(),
        }
    }
}

/// Timing knobs for the lifecycle runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Delay between two pod status reads
    pub poll_interval: Duration,
    /// Upper bound for the best-effort delete after an interruption
    pub cleanup_grace_period: Duration,
    /// Give up waiting after this long. `None` waits forever.
    pub max_wait: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            cleanup_grace_period: Duration::from_secs(10),
            max_wait: None,
        }
    }
}

/// Process settings.
///
/// argv belongs to the transcoder command line being forwarded, so every
/// setting is taken from the environment. Parse with
/// `Settings::try_parse_from([program])`.
#[derive(Parser, Debug, Clone)]
#[command(name = "kube-transcoder")]
#[command(about = "Runs a transcoder invocation in an ephemeral Kubernetes pod")]
pub struct Settings {
    /// Namespace the media server runs in
    #[arg(
        long,
        env = "KUBE_NAMESPACE",
        value_parser = NonEmptyStringValueParser::new(),
        default_value = DEFAULT_NAMESPACE
    )]
    pub namespace: String,

    /// Media server image containing the transcoder
    #[arg(
        long,
        env = "PMS_IMAGE",
        value_parser = NonEmptyStringValueParser::new(),
        default_value = DEFAULT_IMAGE
    )]
    pub image: String,

    /// Persistent volume claim holding the media library
    #[arg(
        long,
        env = "DATA_PVC",
        value_parser = NonEmptyStringValueParser::new(),
        default_value = DEFAULT_DATA_PVC
    )]
    pub data_pvc: String,

    /// Address the transcoder pod uses to reach the media server
    /// (e.g. "http://plex.media.svc:32400")
    #[arg(
        long,
        env = "PMS_INTERNAL_ADDRESS",
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub pms_internal_address: Option<String>,

    /// Milliseconds between pod status reads, at least 1
    #[arg(
        long,
        env = "TRANSCODE_POLL_INTERVAL_MS",
        default_value = "1000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Seconds allowed for deleting the pod after an interruption
    #[arg(long, env = "TRANSCODE_CLEANUP_GRACE_SECS", default_value = "10")]
    pub cleanup_grace_secs: u64,

    /// Abort the wait after this many seconds (unbounded if unset)
    #[arg(long, env = "TRANSCODE_MAX_WAIT_SECS")]
    pub max_wait_secs: Option<u64>,

    /// Additional KEY=VALUE entries for the pod environment, comma-separated.
    /// They override host variables of the same name. A comma only starts a
    /// new entry when it is followed by `NAME=`, so values may contain commas.
    #[arg(long, env = "TRANSCODE_EXTRA_ENV")]
    pub extra_env: Vec<String>,

    /// Print the pod manifest instead of creating it
    #[arg(long, env = "TRANSCODE_DRY_RUN")]
    pub dry_run: bool,
}

impl Settings {
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            cleanup_grace_period: Duration::from_secs(self.cleanup_grace_secs),
            max_wait: self.max_wait_secs.map(Duration::from_secs),
        }
    }

    /// `extra_env` split into individual `KEY=VALUE` entries.
    pub fn extra_env_entries(&self) -> Vec<String> {
        self.extra_env
            .iter()
            .flat_map(|raw| split_env_list(raw))
            .collect()
    }

    pub fn job_config(
        &self,
        working_dir: PathBuf,
        command: Vec<String>,
        env_vars: BTreeMap<String, String>,
    ) -> JobConfig {
        JobConfig {
            namespace: self.namespace.clone(),
            image: self.image.clone(),
            working_dir,
            command,
            env_vars,
            data_pvc: self.data_pvc.clone(),
        }
    }
}

/// Split a comma-separated list of `KEY=VALUE` entries.
///
/// A comma followed by something that is not `NAME=` belongs to the
/// current value, e.g. `CAPS=compute,video,TZ=UTC` yields
/// `["CAPS=compute,video", "TZ=UTC"]`.
pub fn split_env_list(raw: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for piece in raw.split(',') {
        match entries.last_mut() {
            Some(current) if !starts_with_name(piece) => {
                current.push(',');
                current.push_str(piece);
            }
            _ => entries.push(piece.to_string()),
        }
    }
    entries.retain(|e| !e.is_empty());
    entries
}

/// True when `piece` begins with `NAME=` where NAME is a shell identifier.
fn starts_with_name(piece: &str) -> bool {
    let Some((name, _)) = piece.split_once('=') else {
        return false;
    };
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse `KEY=VALUE` entries, splitting on the first `=`.
///
/// An entry without any `=` is rejected. Later duplicates win.
pub fn parse_env_vars<I, S>(entries: I) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeMap::new();
    for entry in entries {
        let entry = entry.as_ref();
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| TranscodeError::InvalidEnvVar(entry.to_string()))?;
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}
