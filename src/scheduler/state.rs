//! Request lifecycle state machine
//!
//! `Pending -> Retrieving -> (Failed | FannedOut) -> Aggregating -> terminal`
//!
//! Terminal states are `Success`, `Partial` and `Failed`. No enrichment work
//! exists before `FannedOut`, and `Aggregating` is only entered once every
//! submitted task has reached a terminal result.

use crate::aggregator::OverallStatus;
use crate::errors::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// Request execution states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestState {
    /// Accepted, nothing started
    Pending,

    /// Waiting on the retrieval gateway
    Retrieving,

    /// Enrichment tasks submitted to the pool
    FannedOut,

    /// All tasks joined; merging results
    Aggregating,

    /// Every submitted task succeeded (terminal)
    Success,

    /// Retrieval usable, some task failed or timed out (terminal)
    Partial,

    /// Retrieval failed or empty (terminal)
    Failed,
}

/// Events that drive a request forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    /// Retrieval call issued
    Start,

    /// Retrieval produced at least one passage
    RetrievalReady,

    /// Retrieval failed or came back empty
    RetrievalFailed,

    /// Every submitted task finished or timed out
    TasksJoined,

    /// Aggregator classified the request
    Classified(OverallStatus),
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Success | RequestState::Partial | RequestState::Failed
        )
    }

    /// Attempt a transition
    ///
    /// Valid edges:
    /// 1. Pending     -> Retrieving  (Start)
    /// 2. Retrieving  -> FannedOut   (RetrievalReady)
    /// 3. Retrieving  -> Failed      (RetrievalFailed)
    /// 4. FannedOut   -> Aggregating (TasksJoined)
    /// 5. Aggregating -> Success | Partial | Failed (Classified)
    pub fn transition(&self, event: RequestEvent) -> Result<RequestState> {
        use RequestEvent::*;
        use RequestState::*;

        let next = match (self, event) {
            (Pending, Start) => Retrieving,
            (Retrieving, RetrievalReady) => FannedOut,
            (Retrieving, RetrievalFailed) => Failed,
            (FannedOut, TasksJoined) => Aggregating,
            (Aggregating, Classified(status)) => status.into(),

            (from, event) => {
                return Err(BridgeError::InvalidTransition {
                    from: format!("{:?}", from),
                    to: format!("(via {:?})", event),
                    reason: format!("No valid transition from {:?} on {:?}", from, event),
                });
            }
        };

        Ok(next)
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            RequestState::Pending => "Pending",
            RequestState::Retrieving => "Retrieving Context",
            RequestState::FannedOut => "Running Tasks",
            RequestState::Aggregating => "Aggregating Results",
            RequestState::Success => "Succeeded",
            RequestState::Partial => "Partially Succeeded",
            RequestState::Failed => "Failed",
        }
    }
}

impl From<OverallStatus> for RequestState {
    fn from(status: OverallStatus) -> Self {
        match status {
            OverallStatus::Success => RequestState::Success,
            OverallStatus::Partial => RequestState::Partial,
            OverallStatus::Failed => RequestState::Failed,
        }
    }
}
