//! Status codes reported by the provider for each kind of operation.

/// Stack statuses.
pub mod stack {
    /// Creation running.
    pub const CREATE_IN_PROGRESS: &str = "CREATE_IN_PROGRESS";
    /// Creation finished.
    pub const CREATE_COMPLETE: &str = "CREATE_COMPLETE";
    /// Creation failed without rollback.
    pub const CREATE_FAILED: &str = "CREATE_FAILED";
    /// Rollback after a failed create running.
    pub const ROLLBACK_IN_PROGRESS: &str = "ROLLBACK_IN_PROGRESS";
    /// Rollback after a failed create finished.
    pub const ROLLBACK_COMPLETE: &str = "ROLLBACK_COMPLETE";
    /// Rollback after a failed create failed.
    pub const ROLLBACK_FAILED: &str = "ROLLBACK_FAILED";
    /// Deletion running.
    pub const DELETE_IN_PROGRESS: &str = "DELETE_IN_PROGRESS";
    /// Deletion finished.
    pub const DELETE_COMPLETE: &str = "DELETE_COMPLETE";
    /// Deletion failed.
    pub const DELETE_FAILED: &str = "DELETE_FAILED";
    /// Update running.
    pub const UPDATE_IN_PROGRESS: &str = "UPDATE_IN_PROGRESS";
    /// Update applied; old resources being cleaned up.
    pub const UPDATE_COMPLETE_CLEANUP_IN_PROGRESS: &str = "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS";
    /// Update finished.
    pub const UPDATE_COMPLETE: &str = "UPDATE_COMPLETE";
    /// Update failed.
    pub const UPDATE_FAILED: &str = "UPDATE_FAILED";
    /// Rollback after a failed update running.
    pub const UPDATE_ROLLBACK_IN_PROGRESS: &str = "UPDATE_ROLLBACK_IN_PROGRESS";
    /// Rollback after a failed update applied; cleanup running.
    pub const UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS: &str =
        "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS";
    /// Rollback after a failed update finished.
    pub const UPDATE_ROLLBACK_COMPLETE: &str = "UPDATE_ROLLBACK_COMPLETE";
    /// Rollback after a failed update failed.
    pub const UPDATE_ROLLBACK_FAILED: &str = "UPDATE_ROLLBACK_FAILED";
}

/// Stack-set operation statuses.
pub mod stack_set_operation {
    /// Accepted, not yet started.
    pub const QUEUED: &str = "QUEUED";
    /// Running.
    pub const RUNNING: &str = "RUNNING";
    /// Stop requested.
    pub const STOPPING: &str = "STOPPING";
    /// Stopped before finishing.
    pub const STOPPED: &str = "STOPPED";
    /// Finished.
    pub const SUCCEEDED: &str = "SUCCEEDED";
    /// Failed.
    pub const FAILED: &str = "FAILED";
}

/// Change-set statuses.
pub mod change_set {
    /// Accepted, not yet started.
    pub const CREATE_PENDING: &str = "CREATE_PENDING";
    /// Being computed.
    pub const CREATE_IN_PROGRESS: &str = "CREATE_IN_PROGRESS";
    /// Ready to execute.
    pub const CREATE_COMPLETE: &str = "CREATE_COMPLETE";
    /// Could not be computed.
    pub const FAILED: &str = "FAILED";
}

/// Extension type registration statuses.
pub mod type_registration {
    /// Registration running.
    pub const IN_PROGRESS: &str = "IN_PROGRESS";
    /// Registration finished.
    pub const COMPLETE: &str = "COMPLETE";
    /// Registration failed.
    pub const FAILED: &str = "FAILED";
}

/// Resource rule (compliance rule) states.
pub mod resource_rule {
    /// Rule evaluating.
    pub const EVALUATING: &str = "EVALUATING";
    /// Rule active.
    pub const ACTIVE: &str = "ACTIVE";
    /// Rule being deleted.
    pub const DELETING: &str = "DELETING";
    /// Rule's results being deleted.
    pub const DELETING_RESULTS: &str = "DELETING_RESULTS";
}

/// Per-target result status marking a failure.
pub const RESULT_FAILED: &str = "FAILED";
