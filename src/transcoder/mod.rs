//! Transcoder pod lifecycle.
//!
//! - [`build_pod`]: turns a [`JobConfig`](crate::config::JobConfig) into a pod manifest
//! - [`TranscodeRunner`]: submits the pod, waits for a terminal phase while
//!   watching for shutdown, and deletes the pod afterwards
//!
//! # Lifecycle
//!
//! ```text
//! Submitting -> Running -> Succeeded | Failed | Interrupted | TimedOut
//!      |            |
//!      v            v
//!  SubmitError   PollError
//! ```
//!
//! Every state below `Submitting` ends with the pod being deleted.

pub mod pod;
pub mod runner;

pub use pod::build_pod;
pub use runner::{PodHandle, TranscodeRunner};
