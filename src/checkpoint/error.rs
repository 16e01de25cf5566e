//! Checkpoint error types.

use thiserror::Error;

/// Errors raised while encoding, decoding or validating a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("JSON checkpoint encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary checkpoint encoding failed: {0}")]
    Binary(#[from] bincode::Error),

    /// Written by a newer or older release with a different layout.
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The history's last committed state is not the checkpoint's state.
    #[error("checkpoint state {state} does not follow its history, which ends in {last}")]
    Inconsistent { state: String, last: String },

    /// Captured while an action was in flight; nothing would ever complete it.
    #[error("checkpoint state {state} is waiting on an action that is not part of the checkpoint")]
    InFlight { state: String },

    #[error("checkpoint history holds {len} transitions but its capacity is {capacity}")]
    HistoryOverflow { len: usize, capacity: usize },
}
