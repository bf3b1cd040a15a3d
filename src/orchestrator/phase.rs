/// Lifecycle phase of a pod as reported by the API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Map the `status.phase` string of a pod.
    ///
    /// A pod that has no status yet has not been scheduled and counts as
    /// pending. Values this client does not know are treated as unknown.
    pub fn from_status(phase: Option<&str>) -> Self {
        match phase {
            None => PodPhase::Pending,
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            Some(_) => PodPhase::Unknown,
        }
    }

    /// No further transitions happen after a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PodPhase::Pending => write!(f, "pending"),
            PodPhase::Running => write!(f, "running"),
            PodPhase::Succeeded => write!(f, "succeeded"),
            PodPhase::Failed => write!(f, "failed"),
            PodPhase::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_known_phases() {
        assert_eq!(PodPhase::from_status(Some("Pending")), PodPhase::Pending);
        assert_eq!(PodPhase::from_status(Some("Running")), PodPhase::Running);
        assert_eq!(PodPhase::from_status(Some("Succeeded")), PodPhase::Succeeded);
        assert_eq!(PodPhase::from_status(Some("Failed")), PodPhase::Failed);
        assert_eq!(PodPhase::from_status(Some("Unknown")), PodPhase::Unknown);
    }

    #[test]
    fn missing_status_is_pending() {
        assert_eq!(PodPhase::from_status(None), PodPhase::Pending);
    }

    #[test]
    fn unrecognised_status_is_unknown() {
        assert_eq!(PodPhase::from_status(Some("Evicted")), PodPhase::Unknown);
    }

    #[test]
    fn only_succeeded_and_failed_are_terminal() {
        assert!(PodPhase::Succeeded.is_terminal());
        assert!(PodPhase::Failed.is_terminal());
        assert!(!PodPhase::Pending.is_terminal());
        assert!(!PodPhase::Running.is_terminal());
        assert!(!PodPhase::Unknown.is_terminal());
    }
}
