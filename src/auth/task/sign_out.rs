use super::await_outcome;
use crate::auth::data::SignedOutData;
use crate::auth::error::AuthError;
use crate::auth::event::AuthenticationEvent;
use crate::auth::state::{AuthenticationState, AuthorizationState};
use crate::auth::AuthStateMachine;
use crate::core::State;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignOutResult {
    Complete,
    /// Signed out locally, but the provider could not invalidate everything.
    Partial {
        revoke_token_error: Option<String>,
        global_sign_out_error: Option<String>,
    },
}

impl From<&SignedOutData> for SignOutResult {
    fn from(data: &SignedOutData) -> Self {
        if data.is_partial() {
            SignOutResult::Partial {
                revoke_token_error: data.revoke_token_error.clone(),
                global_sign_out_error: data.global_sign_out_error.clone(),
            }
        } else {
            SignOutResult::Complete
        }
    }
}

pub struct SignOutTask {
    global: bool,
    machine: AuthStateMachine,
    cancellation: CancellationToken,
}

impl SignOutTask {
    pub fn new(machine: AuthStateMachine) -> Self {
        Self {
            global: false,
            machine,
            cancellation: CancellationToken::new(),
        }
    }

    /// Also invalidate the user's tokens on every other device.
    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub async fn execute(&self) -> Result<SignOutResult, AuthError> {
        debug!(task = "SignOut", global = self.global, "Starting execution");
        let (state, mut states) = self.machine.observe();
        match state.authentication() {
            Some(
                AuthenticationState::SignedIn(_) | AuthenticationState::SignedInWithTokens(_),
            ) => {}
            Some(AuthenticationState::SignedOut(_)) => return Ok(SignOutResult::Complete),
            Some(other) => {
                return Err(AuthError::invalid_state(format!(
                    "Sign out could not be completed: user is {}",
                    other.name()
                )))
            }
            None => {
                return Err(AuthError::invalid_state(
                    "Sign out could not be completed: auth is not configured",
                ))
            }
        }

        self.machine
            .send(AuthenticationEvent::SignOutRequested { global: self.global }.into())
            .await;

        await_outcome(
            "Sign out",
            &mut states,
            &self.cancellation,
            |authn, authz| match (authn, authz) {
                (AuthenticationState::SignedOut(data), AuthorizationState::Configured) => {
                    Some(Ok(SignOutResult::from(data)))
                }
                _ => None,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sign_out_keeps_errors() {
        let data = SignedOutData {
            last_known_username: Some("alice".into()),
            revoke_token_error: None,
            global_sign_out_error: Some("network down".into()),
        };
        assert_eq!(
            SignOutResult::from(&data),
            SignOutResult::Partial {
                revoke_token_error: None,
                global_sign_out_error: Some("network down".into()),
            }
        );
        assert_eq!(
            SignOutResult::from(&SignedOutData::default()),
            SignOutResult::Complete
        );
    }
}
