use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases of a single guarded invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    /// Protected operation is executing
    Running,
    /// Protected operation returned a value
    Ok,
    /// Protected operation raised a failure
    Failed,
    /// Cleanup step is executing
    Finalizing,
    /// Invocation finished; result returned or failure raised
    Done,
}

impl InvocationState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if the protected operation has produced an outcome
    pub fn has_outcome(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: InvocationState) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Ok)
                | (Self::Running, Self::Failed)
                | (Self::Ok, Self::Finalizing)
                | (Self::Failed, Self::Finalizing)
                | (Self::Finalizing, Self::Done)
        )
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Ok => write!(f, "ok"),
            Self::Failed => write!(f, "failed"),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for InvocationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "ok" => Ok(Self::Ok),
            "failed" => Ok(Self::Failed),
            "finalizing" => Ok(Self::Finalizing),
            "done" => Ok(Self::Done),
            _ => Err(format!("Invalid invocation state: {s}")),
        }
    }
}
