use super::{await_outcome, sign_in_outcome, Precondition, SignInResult};
use crate::auth::data::{AuthFlowType, SignInEventData};
use crate::auth::error::AuthError;
use crate::auth::event::AuthenticationEvent;
use crate::auth::resolver::{can_fetch_session, can_restart_sign_in};
use crate::auth::AuthStateMachine;
use crate::core::Guard;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Password sign-in. Resolves once the user is signed in or the provider asks for
/// another step.
pub struct SignInTask {
    data: SignInEventData,
    machine: AuthStateMachine,
    cancellation: CancellationToken,
}

impl SignInTask {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        machine: AuthStateMachine,
    ) -> Self {
        Self {
            data: SignInEventData {
                username: username.into(),
                password: password.into(),
                auth_flow: AuthFlowType::UserSrp,
            },
            machine,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_auth_flow(mut self, auth_flow: AuthFlowType) -> Self {
        self.data.auth_flow = auth_flow;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub async fn execute(&self) -> Result<SignInResult, AuthError> {
        debug!(task = "SignIn", "Starting execution");
        if self.data.username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required to sign in".to_string()));
        }
        let (state, mut states) = self.machine.observe();
        precondition().check(&state)?;

        self.machine
            .send(AuthenticationEvent::SignInRequested(self.data.clone()).into())
            .await;

        await_outcome("Sign in", &mut states, &self.cancellation, sign_in_outcome).await
    }
}

fn precondition() -> Precondition {
    Precondition::new(
        "Sign in",
        Guard::new("sign in", can_restart_sign_in),
        Guard::new("session fetch", can_fetch_session),
    )
}
