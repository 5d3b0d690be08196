//! Bundle submission outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which relay call reported the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayFailureKind {
    /// The dry-run against the target block failed
    Simulation,
    /// The relay rejected or errored on submission
    Relay,
}

/// A structured error returned by the private relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayFailure {
    pub kind: RelayFailureKind,
    pub message: String,
}

impl RelayFailure {
    pub fn simulation(message: impl Into<String>) -> Self {
        Self {
            kind: RelayFailureKind::Simulation,
            message: message.into(),
        }
    }

    pub fn relay(message: impl Into<String>) -> Self {
        Self {
            kind: RelayFailureKind::Relay,
            message: message.into(),
        }
    }
}

impl fmt::Display for RelayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RelayFailureKind::Simulation => write!(f, "Simulation error: {}", self.message),
            RelayFailureKind::Relay => write!(f, "Relay error: {}", self.message),
        }
    }
}

impl std::error::Error for RelayFailure {}

/// The terminal result of one bundle submission
///
/// `Sent` means "accepted for consideration" at `target_block`; private
/// relays may still drop the bundle without further signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Sent {
        target_block: u64,
        bundle_hash: Option<String>,
    },
    SimulationFailed {
        target_block: u64,
        message: String,
    },
    RelayError {
        target_block: u64,
        message: String,
    },
}

impl SubmissionOutcome {
    pub fn from_failure(target_block: u64, failure: RelayFailure) -> Self {
        match failure.kind {
            RelayFailureKind::Simulation => Self::SimulationFailed {
                target_block,
                message: failure.message,
            },
            RelayFailureKind::Relay => Self::RelayError {
                target_block,
                message: failure.message,
            },
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    pub fn target_block(&self) -> u64 {
        match self {
            Self::Sent { target_block, .. }
            | Self::SimulationFailed { target_block, .. }
            | Self::RelayError { target_block, .. } => *target_block,
        }
    }

    /// Get a machine-readable status code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "SENT",
            Self::SimulationFailed { .. } => "SIMULATION_FAILED",
            Self::RelayError { .. } => "RELAY_ERROR",
        }
    }

    /// Get a human-readable message for this outcome
    pub fn message(&self) -> String {
        match self {
            Self::Sent { target_block, .. } => {
                format!("Bundle sent to relay for block {}", target_block)
            }
            Self::SimulationFailed { message, .. } => format!("Simulation Error: {}", message),
            Self::RelayError { message, .. } => {
                format!("Error sending bundle to relay: {}", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_maps_to_outcome() {
        let outcome = SubmissionOutcome::from_failure(101, RelayFailure::simulation("reverted"));
        assert_eq!(outcome.code(), "SIMULATION_FAILED");
        assert_eq!(outcome.target_block(), 101);
        assert!(!outcome.is_sent());

        let outcome = SubmissionOutcome::from_failure(7, RelayFailure::relay("bad bundle"));
        assert!(matches!(
            outcome,
            SubmissionOutcome::RelayError { ref message, .. } if message == "bad bundle"
        ));
    }
}
