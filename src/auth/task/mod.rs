//! Caller-facing operations.
//!
//! A task reads the current state and subscribes to later commits in one step, checks
//! that the state is one it may start from, sends its initiating event and then scans
//! committed states for a terminal pair. Precondition failures never send anything.
//!
//! The software-token tasks for a signed-in user are the exception: they read the
//! state for the user's tokens and call the provider directly.

mod associate_software_token;
mod confirm_sign_in;
mod fetch_auth_session;
mod sign_in;
mod sign_in_with_tokens;
mod sign_out;
mod verify_software_token;

pub use associate_software_token::{AssociateSoftwareTokenTask, TotpSetupDetails};
pub use confirm_sign_in::ConfirmSignInTask;
pub use fetch_auth_session::{AuthSession, FetchAuthSessionTask};
pub use sign_in::SignInTask;
pub use sign_in_with_tokens::{SignInWithTokensRequest, SignInWithTokensTask};
pub use sign_out::{SignOutResult, SignOutTask};
pub use verify_software_token::VerifySoftwareTokenTask;

use super::data::{Credentials, SignInContext, SignedInData};
use super::error::{AuthError, ProviderError};
use super::state::{
    AuthState, AuthenticationState, AuthorizationState, SignInState, SoftwareTokenSetupState,
};
use super::AuthStateMachine;
use crate::core::{Guard, State};
use crate::engine::StateStream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What the caller has to do next to finish signing in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuthSignInStep {
    ConfirmSignInWithTotpCode,
    /// Enroll an authenticator app with `secret_code`, then confirm with its first code.
    ContinueSignInWithTotpSetup {
        secret_code: String,
        username: String,
    },
    ConfirmSignInWithChallenge {
        name: String,
        parameters: BTreeMap<String, String>,
    },
    Done,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignInResult {
    pub next_step: AuthSignInStep,
    /// The established session, once `next_step` is `Done`.
    pub credentials: Option<Credentials>,
}

impl SignInResult {
    fn next(next_step: AuthSignInStep) -> Self {
        Self {
            next_step,
            credentials: None,
        }
    }

    fn done(credentials: Credentials) -> Self {
        Self {
            next_step: AuthSignInStep::Done,
            credentials: Some(credentials),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.next_step == AuthSignInStep::Done
    }
}

/// Sub-states a task may start from.
pub(crate) struct Precondition {
    operation: &'static str,
    authentication: Guard<AuthenticationState>,
    authorization: Guard<AuthorizationState>,
}

impl Precondition {
    pub(crate) fn new(
        operation: &'static str,
        authentication: Guard<AuthenticationState>,
        authorization: Guard<AuthorizationState>,
    ) -> Self {
        Self {
            operation,
            authentication,
            authorization,
        }
    }

    /// Check both halves, reporting every rejected half at once.
    pub(crate) fn check<'s>(
        &self,
        state: &'s AuthState,
    ) -> Result<(&'s AuthenticationState, &'s AuthorizationState), AuthError> {
        let AuthState::Configured(authn, authz) = state else {
            return Err(AuthError::invalid_state(format!(
                "{} could not be completed: auth is not configured",
                self.operation
            )));
        };

        let checks = vec![
            admit(&self.authentication, authn),
            admit(&self.authorization, authz),
        ];
        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok((authn, authz)),
            Validation::Failure(violations) => {
                let reasons: Vec<&str> = violations.iter().map(String::as_str).collect();
                debug!(
                    operation = self.operation,
                    violations = reasons.len(),
                    "Precondition failed"
                );
                Err(AuthError::invalid_state(format!(
                    "{} could not be completed: {}",
                    self.operation,
                    reasons.join("; ")
                )))
            }
        }
    }
}

fn admit<S: State>(guard: &Guard<S>, state: &S) -> Validation<(), NonEmptyVec<String>> {
    if guard.check(state) {
        Validation::success(())
    } else {
        Validation::fail(format!("{} does not accept {}", guard.label(), state.name()))
    }
}

/// The signed-in user, for calls made directly on their behalf.
///
/// Fails with [`AuthError::SessionExpired`] once the access token has expired.
pub(crate) fn signed_in_user(
    operation: &'static str,
    machine: &AuthStateMachine,
) -> Result<SignedInData, AuthError> {
    let user = match machine.current_state().authentication() {
        Some(
            AuthenticationState::SignedIn(data) | AuthenticationState::SignedInWithTokens(data),
        ) => data.clone(),
        Some(other) => {
            return Err(AuthError::invalid_state(format!(
                "{operation} could not be completed: user is {}",
                other.name()
            )))
        }
        None => {
            return Err(AuthError::invalid_state(format!(
                "{operation} could not be completed: auth is not configured"
            )))
        }
    };
    if user.tokens.is_expired(machine.environment().now()) {
        return Err(AuthError::SessionExpired(format!(
            "{operation} could not be completed: the access token has expired"
        )));
    }
    Ok(user)
}

/// Provider failures keep their sign-in classification, e.g. a mismatched code.
pub(crate) fn provider_failure(error: ProviderError) -> AuthError {
    error.into_sign_in_error().into()
}

/// Scan `states` until `outcome` recognises a terminal pair.
///
/// Ends with [`AuthError::Cancelled`] when `cancellation` fires, or with
/// [`AuthError::FlowIncomplete`] when the stream ends first.
pub(crate) async fn await_outcome<T, F>(
    operation: &'static str,
    states: &mut StateStream<AuthState>,
    cancellation: &CancellationToken,
    mut outcome: F,
) -> Result<T, AuthError>
where
    F: FnMut(&AuthenticationState, &AuthorizationState) -> Option<Result<T, AuthError>>,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                debug!(operation, "Cancelled while waiting");
                return Err(AuthError::Cancelled);
            }
            state = states.next() => state,
        };
        let Some(state) = next else {
            return Err(AuthError::FlowIncomplete(format!(
                "{operation} could not be completed"
            )));
        };
        if let AuthState::Configured(authn, authz) = &state {
            if let Some(result) = outcome(authn, authz) {
                return result;
            }
        }
    }
}

/// Terminal pairs of a sign-in that may stop at a challenge.
pub(crate) fn sign_in_outcome(
    authn: &AuthenticationState,
    authz: &AuthorizationState,
) -> Option<Result<SignInResult, AuthError>> {
    match (authn, authz) {
        (AuthenticationState::SignedIn(_), AuthorizationState::SessionEstablished(credentials)) => {
            Some(Ok(SignInResult::done(credentials.clone())))
        }
        (AuthenticationState::Error(_), AuthorizationState::Error(error)) => {
            Some(Err(error.clone()))
        }
        (AuthenticationState::SigningIn(sign_in), _) => sign_in_step(sign_in),
        _ => None,
    }
}

fn sign_in_step(state: &SignInState) -> Option<Result<SignInResult, AuthError>> {
    match state {
        SignInState::ResolvingChallenge(challenge) => Some(Ok(SignInResult::next(
            challenge_step(challenge.name.as_str(), &challenge.parameters),
        ))),
        SignInState::ResolvingTotpSetup(
            SoftwareTokenSetupState::WaitingForAnswer(data),
            context,
        ) => Some(Ok(SignInResult::next(totp_setup_step(
            &data.secret_code,
            context,
        )))),
        SignInState::ResolvingTotpSetup(SoftwareTokenSetupState::Error(_, error), _)
        | SignInState::Error(error) => Some(Err(error.clone().into())),
        _ => None,
    }
}

fn challenge_step(name: &str, parameters: &BTreeMap<String, String>) -> AuthSignInStep {
    match name {
        "SOFTWARE_TOKEN_MFA" => AuthSignInStep::ConfirmSignInWithTotpCode,
        other => AuthSignInStep::ConfirmSignInWithChallenge {
            name: other.to_string(),
            parameters: parameters.clone(),
        },
    }
}

fn totp_setup_step(secret_code: &str, context: &SignInContext) -> AuthSignInStep {
    AuthSignInStep::ContinueSignInWithTotpSetup {
        secret_code: secret_code.to_string(),
        username: context.username.clone(),
    }
}
