//! Serializable snapshots of a running state machine.
//!
//! A checkpoint holds the current state and the retained transition history. Storing
//! it is left to the caller; the machine never persists anything on its own.

use crate::core::{State, StateHistory};
use crate::engine::{EnvironmentOf, Resolver, StateMachine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of a machine's state.
/// Does NOT include the environment or in-flight actions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// State of the machine when captured
    pub state: S,

    /// Retained transition history
    pub history: StateHistory<S>,
}

impl<S: State> Checkpoint<S> {
    pub fn new(state: S, history: StateHistory<S>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            state,
            history,
        }
    }

    /// Capture a running machine.
    ///
    /// Fails with [`CheckpointError::InFlight`] while the machine waits on an action;
    /// capture again once it has settled.
    pub fn capture<R>(machine: &StateMachine<R>) -> Result<Self, CheckpointError>
    where
        R: Resolver<State = S>,
    {
        let (state, history) = machine.snapshot();
        Self::new(state, history).validate()
    }

    /// Start a new machine from this checkpoint.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn restore<R>(
        self,
        resolver: R,
        environment: EnvironmentOf<R>,
    ) -> Result<StateMachine<R>, CheckpointError>
    where
        R: Resolver<State = S>,
    {
        let checkpoint = self.validate()?;
        Ok(StateMachine::resume(
            checkpoint.state,
            checkpoint.history,
            resolver,
            environment,
        ))
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode and validate a JSON checkpoint.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str::<Self>(json)?.validate()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize::<Self>(bytes)?.validate()
    }

    fn validate(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        if self.state.awaits_action() {
            return Err(CheckpointError::InFlight {
                state: self.state.name().to_string(),
            });
        }
        if !self.history.is_bounded() {
            return Err(CheckpointError::HistoryOverflow {
                len: self.history.len(),
                capacity: self.history.capacity(),
            });
        }
        if let Some(last) = self.history.last() {
            if last.to != self.state {
                return Err(CheckpointError::Inconsistent {
                    state: self.state.name().to_string(),
                    last: last.to.name().to_string(),
                });
            }
        }
        Ok(self)
    }
}
