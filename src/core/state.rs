//! Core State trait shared by the composite snapshot and its sub-states.
//!
//! A state is an immutable value. The machine never mutates one in place; every
//! processed event produces a replacement snapshot.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// All methods are pure. `PartialEq` is load-bearing: the machine only commits and
/// publishes a resolved state when it differs from the current one.
///
/// # Example
///
/// ```rust
/// use authflow::auth::AuthenticationState;
/// use authflow::core::State;
///
/// let state = AuthenticationState::FederatedToIdentityPool;
/// assert_eq!(state.name(), "FederatedToIdentityPool");
/// assert!(!state.is_error());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a state a waiting caller treats as flow-complete.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }

    /// Check if this state only ends when an in-flight action reports back.
    ///
    /// Such a state cannot be restored on its own. Default implementation returns `false`.
    fn awaits_action(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, AuthState, AuthenticationState, AuthorizationState};

    #[test]
    fn names_are_stable_per_variant() {
        assert_eq!(AuthState::NotConfigured.name(), "NotConfigured");
        assert_eq!(
            AuthState::Configured(
                AuthenticationState::NotConfigured,
                AuthorizationState::Configured
            )
            .name(),
            "Configured"
        );
        assert_eq!(AuthorizationState::FetchingCredentials.name(), "FetchingCredentials");
    }

    #[test]
    fn error_states_are_reported() {
        let error = AuthError::Service("boom".into());
        assert!(AuthenticationState::Error(error.clone()).is_error());
        assert!(AuthorizationState::Error(error.clone()).is_error());
        assert!(AuthState::Configured(
            AuthenticationState::SignedOut(Default::default()),
            AuthorizationState::Error(error)
        )
        .is_error());
        assert!(!AuthorizationState::Configured.is_error());
    }

    #[test]
    fn state_serializes_correctly() {
        let state = AuthState::Configured(
            AuthenticationState::FederatedToIdentityPool,
            AuthorizationState::Configured,
        );
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: AuthState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
