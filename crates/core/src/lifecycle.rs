//! Job lifecycle state machine.
//!
//! This module lives in `core` (zero internal deps) so it can be used by both
//! the repository layer and the orchestrator without either depending on the
//! other.

// ---------------------------------------------------------------------------
// Status IDs
// ---------------------------------------------------------------------------

/// Status ID for jobs waiting to be dispatched.
pub const STATUS_PENDING: i16 = 1;

/// Status ID for jobs currently held by a worker.
pub const STATUS_PROCESSING: i16 = 2;

/// Status ID for successfully finished jobs. Terminal.
pub const STATUS_COMPLETED: i16 = 3;

/// Status ID for jobs that exhausted their attempts. Terminal.
pub const STATUS_FAILED: i16 = 4;

/// Status ID for jobs cancelled by the caller. Terminal.
pub const STATUS_CANCELLED: i16 = 5;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Job status IDs matching `job_statuses` seed data (1-based SMALLINT).
///
/// The state machine is intentionally duplicated from the `db` crate's
/// `JobStatus` enum because `core` must have zero internal deps.
pub mod state_machine {
    /// Returns the set of valid target status IDs reachable from `from_status`.
    ///
    /// Terminal states (Completed=3, Failed=4, Cancelled=5) return an empty
    /// slice because no further transitions are allowed.
    pub fn valid_transitions(from_status: i16) -> &'static [i16] {
        match from_status {
            // Pending -> Processing, Cancelled
            1 => &[2, 5],
            // Processing -> Completed, Failed, Cancelled, Pending (retry requeue)
            2 => &[3, 4, 5, 1],
            // Terminal states: Completed, Failed, Cancelled
            3 | 4 | 5 => &[],
            // Unknown status: no transitions allowed
            _ => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: i16, to: i16) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: i16, to: i16) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            let from_name = status_name(from);
            let to_name = status_name(to);
            Err(format!(
                "Invalid transition: {from_name} ({from}) -> {to_name} ({to})"
            ))
        }
    }

    /// Whether a status ID is terminal (no outgoing transitions).
    pub fn is_terminal(status: i16) -> bool {
        matches!(status, 3..=5)
    }

    /// Human-readable name for a status ID (for error messages).
    fn status_name(id: i16) -> &'static str {
        match id {
            1 => "Pending",
            2 => "Processing",
            3 => "Completed",
            4 => "Failed",
            5 => "Cancelled",
            _ => "Unknown",
        }
    }
}
