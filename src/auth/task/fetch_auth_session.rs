use super::await_outcome;
use crate::auth::data::Credentials;
use crate::auth::error::AuthError;
use crate::auth::event::AuthorizationEvent;
use crate::auth::state::{AuthState, AuthenticationState, AuthorizationState};
use crate::auth::AuthStateMachine;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The session as seen by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub is_signed_in: bool,
    pub credentials: Option<Credentials>,
}

/// Read the current session, refreshing it when asked to or when its tokens expired.
pub struct FetchAuthSessionTask {
    force_refresh: bool,
    machine: AuthStateMachine,
    cancellation: CancellationToken,
}

impl FetchAuthSessionTask {
    pub fn new(machine: AuthStateMachine) -> Self {
        Self {
            force_refresh: false,
            machine,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub async fn execute(&self) -> Result<AuthSession, AuthError> {
        debug!(
            task = "FetchAuthSession",
            force_refresh = self.force_refresh,
            "Starting execution"
        );
        let (state, mut states) = self.machine.observe();
        let AuthState::Configured(authn, authz) = &state else {
            return Err(AuthError::invalid_state(
                "Fetch auth session could not be completed: auth is not configured",
            ));
        };
        let signed_in = is_signed_in(authn);

        match authz {
            AuthorizationState::NotConfigured | AuthorizationState::Configured => {
                return Ok(AuthSession {
                    is_signed_in: signed_in,
                    credentials: None,
                });
            }
            AuthorizationState::Error(error) => return Err(error.clone()),
            AuthorizationState::SessionEstablished(credentials)
                if !self.force_refresh && !self.expired(credentials) =>
            {
                return Ok(AuthSession {
                    is_signed_in: signed_in,
                    credentials: Some(credentials.clone()),
                });
            }
            AuthorizationState::SessionEstablished(_) => {
                self.machine.send(AuthorizationEvent::RefreshSession.into()).await;
            }
            // A fetch or refresh is already running; wait for it.
            AuthorizationState::FetchingCredentials | AuthorizationState::RefreshingSession(_) => {}
        }

        await_outcome(
            "Fetch auth session",
            &mut states,
            &self.cancellation,
            |authn, authz| match authz {
                AuthorizationState::SessionEstablished(credentials) => Some(Ok(AuthSession {
                    is_signed_in: is_signed_in(authn),
                    credentials: Some(credentials.clone()),
                })),
                AuthorizationState::Error(error) => Some(Err(error.clone())),
                _ => None,
            },
        )
        .await
    }

    fn expired(&self, credentials: &Credentials) -> bool {
        let now = self.machine.environment().now();
        credentials
            .user_pool_tokens()
            .is_some_and(|tokens| tokens.is_expired(now))
    }
}

fn is_signed_in(authn: &AuthenticationState) -> bool {
    matches!(
        authn,
        AuthenticationState::SignedIn(_) | AuthenticationState::SignedInWithTokens(_)
    )
}
