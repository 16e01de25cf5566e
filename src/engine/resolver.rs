//! Pure transition functions.

use super::action::Action;
use crate::core::State;
use std::fmt::Debug;

/// An event the machine can process.
pub trait MachineEvent: Debug + Send + Sync + 'static {
    /// Stable identifier used in logs and transition history.
    fn identifier(&self) -> &'static str;
}

/// Output of a resolver: the next state and at most one action to run.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution<S, A> {
    pub new_state: S,
    pub action: Option<A>,
}

impl<S, A> Resolution<S, A> {
    /// Keep the given state and schedule nothing.
    pub fn unchanged(state: &S) -> Self
    where
        S: Clone,
    {
        Self {
            new_state: state.clone(),
            action: None,
        }
    }

    pub fn to(new_state: S) -> Self {
        Self {
            new_state,
            action: None,
        }
    }

    pub fn with_action(new_state: S, action: A) -> Self {
        Self {
            new_state,
            action: Some(action),
        }
    }

    pub fn map_state<T>(self, f: impl FnOnce(S) -> T) -> Resolution<T, A> {
        Resolution {
            new_state: f(self.new_state),
            action: self.action,
        }
    }
}

/// Maps `(state, event)` to `(state, action?)`.
///
/// Implementations must be total and free of I/O. An event that means nothing in the
/// current state resolves to the same state and no action.
pub trait Resolver: Send + Sync + 'static {
    type State: State + 'static;
    type Event: MachineEvent;
    type Action: Action<Event = Self::Event>;

    fn resolve(
        &self,
        state: &Self::State,
        event: &Self::Event,
    ) -> Resolution<Self::State, Self::Action>;
}
