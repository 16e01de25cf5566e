use super::{await_outcome, sign_in_outcome, SignInResult};
use crate::auth::error::AuthError;
use crate::auth::event::{AuthEvent, SetupSoftwareTokenEvent, SignInEvent};
use crate::auth::state::{AuthState, AuthenticationState, SignInState, SoftwareTokenSetupState};
use crate::auth::AuthStateMachine;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Answer the step a previous [`SignInTask`](super::SignInTask) stopped at.
///
/// The answer is a challenge response, or the first code of a newly enrolled
/// authenticator during TOTP setup.
pub struct ConfirmSignInTask {
    answer: String,
    machine: AuthStateMachine,
    cancellation: CancellationToken,
}

impl ConfirmSignInTask {
    pub fn new(answer: impl Into<String>, machine: AuthStateMachine) -> Self {
        Self {
            answer: answer.into(),
            machine,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub async fn execute(&self) -> Result<SignInResult, AuthError> {
        debug!(task = "ConfirmSignIn", "Starting execution");
        if self.answer.trim().is_empty() {
            return Err(AuthError::Validation(
                "A challenge response is required to confirm sign in".to_string(),
            ));
        }
        let (state, mut states) = self.machine.observe();
        let event = self.confirmation(&state)?;

        self.machine.send(event).await;

        await_outcome(
            "Confirm sign in",
            &mut states,
            &self.cancellation,
            sign_in_outcome,
        )
        .await
    }

    /// The event that answers the step the sign-in is waiting at.
    fn confirmation(&self, state: &AuthState) -> Result<AuthEvent, AuthError> {
        match state.authentication() {
            Some(AuthenticationState::SigningIn(SignInState::ResolvingChallenge(_))) => {
                Ok(SignInEvent::ConfirmSignIn {
                    answer: self.answer.clone(),
                }
                .into())
            }
            Some(AuthenticationState::SigningIn(SignInState::ResolvingTotpSetup(
                SoftwareTokenSetupState::WaitingForAnswer(_)
                | SoftwareTokenSetupState::Error(Some(_), _),
                _,
            ))) => Ok(SetupSoftwareTokenEvent::VerifyChallengeAnswer {
                code: self.answer.clone(),
            }
            .into()),
            _ => Err(AuthError::invalid_state(
                "Confirm sign in could not be completed: no sign in step is awaiting an answer",
            )),
        }
    }
}
