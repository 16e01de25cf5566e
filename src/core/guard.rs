//! Guard predicates over states.
//!
//! Tasks use guards to state which sub-states they are willing to start from.

use super::state::State;
use std::fmt;
use std::sync::Arc;

/// Pure predicate over a state, with a label used in precondition errors.
///
/// # Example
///
/// ```rust
/// use authflow::auth::AuthorizationState;
/// use authflow::core::Guard;
///
/// let idle = Guard::new("authorization idle", |s: &AuthorizationState| {
///     matches!(s, AuthorizationState::Configured)
/// });
///
/// assert!(idle.check(&AuthorizationState::Configured));
/// assert!(!idle.check(&AuthorizationState::FetchingCredentials));
/// ```
pub struct Guard<S: State> {
    label: &'static str,
    predicate: Arc<dyn Fn(&S) -> bool + Send + Sync>,
}

impl<S: State> Guard<S> {
    /// Create a guard from a pure, thread-safe predicate.
    pub fn new<F>(label: &'static str, predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Guard {
            label,
            predicate: Arc::new(predicate),
        }
    }

    pub fn check(&self, state: &S) -> bool {
        (self.predicate)(state)
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<S: State> Clone for Guard<S> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<S: State> fmt::Debug for Guard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("label", &self.label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, AuthenticationState};

    fn can_start() -> Guard<AuthenticationState> {
        Guard::new("start", |s: &AuthenticationState| {
            matches!(
                s,
                AuthenticationState::NotConfigured
                    | AuthenticationState::SignedOut(_)
                    | AuthenticationState::Error(_)
            )
        })
    }

    #[test]
    fn guard_allows_matching_states() {
        let guard = can_start();
        assert!(guard.check(&AuthenticationState::NotConfigured));
        assert!(guard.check(&AuthenticationState::Error(AuthError::Cancelled)));
        assert!(!guard.check(&AuthenticationState::FederatedToIdentityPool));
    }

    #[test]
    fn cloned_guard_shares_predicate() {
        let guard = can_start();
        let cloned = guard.clone();
        let state = AuthenticationState::SignedOut(Default::default());
        assert_eq!(guard.check(&state), cloned.check(&state));
        assert_eq!(cloned.label(), "start");
    }
}
