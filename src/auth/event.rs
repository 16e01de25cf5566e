//! Events understood by the auth resolvers.

use super::data::{
    AssociateSoftwareTokenData, AuthChallenge, Credentials, SignInEventData, SignedInData,
    SignedOutData,
};
use super::error::{AuthError, SignInError};
use crate::engine::MachineEvent;

/// Session restored by the embedding application at startup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigureData {
    pub user_pool_configured: bool,
    pub signed_in: Option<SignedInData>,
    pub credentials: Option<Credentials>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AuthEvent {
    Configure(ConfigureData),
    Authentication(AuthenticationEvent),
    SignIn(SignInEvent),
    SetupSoftwareToken(SetupSoftwareTokenEvent),
    Authorization(AuthorizationEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum AuthenticationEvent {
    SignInRequested(SignInEventData),
    InitializedSignInWithTokens(SignedInData),
    CancelSignIn,
    SignOutRequested { global: bool },
    SignedOut(SignedOutData),
    FederatedToIdentityPool(Credentials),
    ClearFederation,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SignInEvent {
    ReceivedChallenge(AuthChallenge),
    ConfirmSignIn { answer: String },
    FinalizeSignIn(SignedInData),
    ThrowAuthError(SignInError),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SetupSoftwareTokenEvent {
    WaitForAnswer(AssociateSoftwareTokenData),
    VerifyChallengeAnswer { code: String },
    RespondToAuthChallenge { session: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AuthorizationEvent {
    SessionEstablished(Credentials),
    RefreshSession,
    Refreshed(Credentials),
    ThrowError(AuthError),
}

impl MachineEvent for AuthEvent {
    fn identifier(&self) -> &'static str {
        match self {
            AuthEvent::Configure(_) => "AuthEvent.configure",
            AuthEvent::Authentication(event) => match event {
                AuthenticationEvent::SignInRequested(_) => "AuthenticationEvent.signInRequested",
                AuthenticationEvent::InitializedSignInWithTokens(_) => {
                    "AuthenticationEvent.initializedSignInWithTokens"
                }
                AuthenticationEvent::CancelSignIn => "AuthenticationEvent.cancelSignIn",
                AuthenticationEvent::SignOutRequested { .. } => {
                    "AuthenticationEvent.signOutRequested"
                }
                AuthenticationEvent::SignedOut(_) => "AuthenticationEvent.signedOut",
                AuthenticationEvent::FederatedToIdentityPool(_) => {
                    "AuthenticationEvent.federatedToIdentityPool"
                }
                AuthenticationEvent::ClearFederation => "AuthenticationEvent.clearFederation",
            },
            AuthEvent::SignIn(event) => match event {
                SignInEvent::ReceivedChallenge(_) => "SignInEvent.receivedChallenge",
                SignInEvent::ConfirmSignIn { .. } => "SignInEvent.confirmSignIn",
                SignInEvent::FinalizeSignIn(_) => "SignInEvent.finalizeSignIn",
                SignInEvent::ThrowAuthError(_) => "SignInEvent.throwAuthError",
            },
            AuthEvent::SetupSoftwareToken(event) => match event {
                SetupSoftwareTokenEvent::WaitForAnswer(_) => {
                    "SetupSoftwareTokenEvent.waitForAnswer"
                }
                SetupSoftwareTokenEvent::VerifyChallengeAnswer { .. } => {
                    "SetupSoftwareTokenEvent.verifyChallengeAnswer"
                }
                SetupSoftwareTokenEvent::RespondToAuthChallenge { .. } => {
                    "SetupSoftwareTokenEvent.respondToAuthChallenge"
                }
            },
            AuthEvent::Authorization(event) => match event {
                AuthorizationEvent::SessionEstablished(_) => {
                    "AuthorizationEvent.sessionEstablished"
                }
                AuthorizationEvent::RefreshSession => "AuthorizationEvent.refreshSession",
                AuthorizationEvent::Refreshed(_) => "AuthorizationEvent.refreshed",
                AuthorizationEvent::ThrowError(_) => "AuthorizationEvent.throwError",
            },
        }
    }
}

impl From<AuthenticationEvent> for AuthEvent {
    fn from(event: AuthenticationEvent) -> Self {
        AuthEvent::Authentication(event)
    }
}

impl From<SignInEvent> for AuthEvent {
    fn from(event: SignInEvent) -> Self {
        AuthEvent::SignIn(event)
    }
}

impl From<SetupSoftwareTokenEvent> for AuthEvent {
    fn from(event: SetupSoftwareTokenEvent) -> Self {
        AuthEvent::SetupSoftwareToken(event)
    }
}

impl From<AuthorizationEvent> for AuthEvent {
    fn from(event: AuthorizationEvent) -> Self {
        AuthEvent::Authorization(event)
    }
}
