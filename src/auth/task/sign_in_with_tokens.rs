use super::{await_outcome, Precondition, SignInResult};
use crate::auth::data::{
    AuthFlowType, Credentials, DeviceMetadata, SignInMethod, SignedInData, UserPoolTokens,
};
use crate::auth::error::AuthError;
use crate::auth::event::AuthenticationEvent;
use crate::auth::resolver::{can_fetch_session, can_start_sign_in};
use crate::auth::state::{AuthenticationState, AuthorizationState};
use crate::auth::AuthStateMachine;
use crate::core::Guard;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tokens obtained outside this library, e.g. from a backend session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInWithTokensRequest {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the tokens expire; one hour when absent.
    pub expires_in: Option<i64>,
}

impl fmt::Debug for SignInWithTokensRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInWithTokensRequest")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Sign in with externally issued user-pool tokens and establish a full session.
pub struct SignInWithTokensTask {
    request: SignInWithTokensRequest,
    machine: AuthStateMachine,
    cancellation: CancellationToken,
}

impl SignInWithTokensTask {
    pub const EVENT_NAME: &'static str = "Auth.signedInWithTokens";

    pub fn new(request: SignInWithTokensRequest, machine: AuthStateMachine) -> Self {
        Self {
            request,
            machine,
            cancellation: CancellationToken::new(),
        }
    }

    /// Stop waiting when `cancellation` fires. In-flight actions still complete.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub async fn execute(&self) -> Result<SignInResult, AuthError> {
        debug!(task = Self::EVENT_NAME, "Starting execution");
        let (state, mut states) = self.machine.observe();
        precondition().check(&state)?;

        self.machine
            .send(AuthenticationEvent::InitializedSignInWithTokens(self.signed_in_data()).into())
            .await;
        debug!(task = Self::EVENT_NAME, "Waiting for sign in with tokens to complete");

        await_outcome(
            "Sign in with tokens",
            &mut states,
            &self.cancellation,
            |authn, authz| match (authn, authz) {
                (
                    AuthenticationState::SignedInWithTokens(_),
                    AuthorizationState::SessionEstablished(credentials),
                ) => Some(sign_in_result(credentials)),
                (AuthenticationState::Error(_), AuthorizationState::Error(error)) => {
                    Some(Err(error.clone()))
                }
                _ => None,
            },
        )
        .await
    }

    fn signed_in_data(&self) -> SignedInData {
        let now = self.machine.environment().now();
        SignedInData {
            username: None,
            signed_in_date: now,
            sign_in_method: SignInMethod::ApiBased(AuthFlowType::UserSrp),
            device_metadata: DeviceMetadata::NoData,
            tokens: UserPoolTokens::new(
                self.request.id_token.clone(),
                self.request.access_token.clone(),
                self.request.refresh_token.clone(),
                self.request.expires_in,
                now,
            ),
        }
    }
}

fn precondition() -> Precondition {
    Precondition::new(
        "Sign in with tokens",
        Guard::new("sign in with tokens", can_start_sign_in),
        Guard::new("session fetch", can_fetch_session),
    )
}

fn sign_in_result(credentials: &Credentials) -> Result<SignInResult, AuthError> {
    match credentials {
        Credentials::UserPoolAndIdentityPool { .. } => Ok(SignInResult::done(credentials.clone())),
        _ => Err(AuthError::Unknown(
            "Unable to parse credentials to expected output".to_string(),
        )),
    }
}
