//! The composite auth state and its sub-states.

use super::data::{
    AssociateSoftwareTokenData, AuthChallenge, Credentials, SignInContext, SignInEventData,
    SignedInData, SignedOutData,
};
use super::error::{AuthError, SignInError};
use crate::core::State;
use serde::{Deserialize, Serialize};

/// Top-level snapshot. Only the `Configured` pair is meaningful to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuthState {
    NotConfigured,
    Configured(AuthenticationState, AuthorizationState),
}

impl AuthState {
    pub fn authentication(&self) -> Option<&AuthenticationState> {
        match self {
            AuthState::Configured(authn, _) => Some(authn),
            AuthState::NotConfigured => None,
        }
    }

    pub fn authorization(&self) -> Option<&AuthorizationState> {
        match self {
            AuthState::Configured(_, authz) => Some(authz),
            AuthState::NotConfigured => None,
        }
    }
}

impl State for AuthState {
    fn name(&self) -> &str {
        match self {
            Self::NotConfigured => "NotConfigured",
            Self::Configured(..) => "Configured",
        }
    }

    fn is_error(&self) -> bool {
        match self {
            Self::NotConfigured => false,
            Self::Configured(authn, authz) => authn.is_error() || authz.is_error(),
        }
    }

    fn awaits_action(&self) -> bool {
        match self {
            Self::NotConfigured => false,
            Self::Configured(authn, authz) => authn.awaits_action() || authz.awaits_action(),
        }
    }
}

/// Who the user is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuthenticationState {
    /// No user pool is configured.
    NotConfigured,
    SignedOut(SignedOutData),
    SigningIn(SignInState),
    SignedIn(SignedInData),
    SignedInWithTokens(SignedInData),
    SigningOut(SignedInData),
    FederatedToIdentityPool,
    Error(AuthError),
}

impl AuthenticationState {
    pub fn signed_in_data(&self) -> Option<&SignedInData> {
        match self {
            Self::SignedIn(data) | Self::SignedInWithTokens(data) | Self::SigningOut(data) => {
                Some(data)
            }
            _ => None,
        }
    }
}

impl State for AuthenticationState {
    fn name(&self) -> &str {
        match self {
            Self::NotConfigured => "NotConfigured",
            Self::SignedOut(_) => "SignedOut",
            Self::SigningIn(_) => "SigningIn",
            Self::SignedIn(_) => "SignedIn",
            Self::SignedInWithTokens(_) => "SignedInWithTokens",
            Self::SigningOut(_) => "SigningOut",
            Self::FederatedToIdentityPool => "FederatedToIdentityPool",
            Self::Error(_) => "Error",
        }
    }

    fn is_final(&self) -> bool {
        matches!(
            self,
            Self::SignedOut(_)
                | Self::SignedIn(_)
                | Self::SignedInWithTokens(_)
                | Self::FederatedToIdentityPool
                | Self::Error(_)
        )
    }

    fn is_error(&self) -> bool {
        match self {
            Self::Error(_) => true,
            Self::SigningIn(sign_in) => sign_in.is_error(),
            _ => false,
        }
    }

    fn awaits_action(&self) -> bool {
        match self {
            Self::SigningIn(sign_in) => sign_in.awaits_action(),
            Self::SigningOut(_) => true,
            _ => false,
        }
    }
}

/// Progress of an API-based sign-in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SignInState {
    SigningInWithPassword(SignInEventData),
    /// Waiting for the user to answer a challenge.
    ResolvingChallenge(AuthChallenge),
    VerifyingChallenge(AuthChallenge),
    ResolvingTotpSetup(SoftwareTokenSetupState, SignInContext),
    Error(SignInError),
}

impl State for SignInState {
    fn name(&self) -> &str {
        match self {
            Self::SigningInWithPassword(_) => "SigningInWithPassword",
            Self::ResolvingChallenge(_) => "ResolvingChallenge",
            Self::VerifyingChallenge(_) => "VerifyingChallenge",
            Self::ResolvingTotpSetup(..) => "ResolvingTotpSetup",
            Self::Error(_) => "Error",
        }
    }

    fn is_error(&self) -> bool {
        match self {
            Self::Error(_) => true,
            Self::ResolvingTotpSetup(setup, _) => setup.is_error(),
            _ => false,
        }
    }

    fn awaits_action(&self) -> bool {
        match self {
            Self::SigningInWithPassword(_) | Self::VerifyingChallenge(_) => true,
            Self::ResolvingTotpSetup(setup, _) => setup.awaits_action(),
            Self::ResolvingChallenge(_) | Self::Error(_) => false,
        }
    }
}

/// Software-token (TOTP) enrollment during sign-in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SoftwareTokenSetupState {
    AssociatingSoftwareToken {
        session: Option<String>,
    },
    WaitingForAnswer(AssociateSoftwareTokenData),
    Verifying(AssociateSoftwareTokenData, String),
    RespondingToAuthChallenge {
        session: String,
    },
    /// Keeps the association, when there is one, so the user can retry the code.
    Error(Option<AssociateSoftwareTokenData>, SignInError),
}

impl State for SoftwareTokenSetupState {
    fn name(&self) -> &str {
        match self {
            Self::AssociatingSoftwareToken { .. } => "AssociatingSoftwareToken",
            Self::WaitingForAnswer(_) => "WaitingForAnswer",
            Self::Verifying(..) => "Verifying",
            Self::RespondingToAuthChallenge { .. } => "RespondingToAuthChallenge",
            Self::Error(..) => "Error",
        }
    }

    fn is_error(&self) -> bool {
        matches!(self, Self::Error(..))
    }

    fn awaits_action(&self) -> bool {
        matches!(
            self,
            Self::AssociatingSoftwareToken { .. }
                | Self::Verifying(..)
                | Self::RespondingToAuthChallenge { .. }
        )
    }
}

/// What the user may access.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuthorizationState {
    NotConfigured,
    Configured,
    FetchingCredentials,
    SessionEstablished(Credentials),
    RefreshingSession(Credentials),
    Error(AuthError),
}

impl AuthorizationState {
    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            Self::SessionEstablished(credentials) | Self::RefreshingSession(credentials) => {
                Some(credentials)
            }
            _ => None,
        }
    }
}

impl State for AuthorizationState {
    fn name(&self) -> &str {
        match self {
            Self::NotConfigured => "NotConfigured",
            Self::Configured => "Configured",
            Self::FetchingCredentials => "FetchingCredentials",
            Self::SessionEstablished(_) => "SessionEstablished",
            Self::RefreshingSession(_) => "RefreshingSession",
            Self::Error(_) => "Error",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::SessionEstablished(_) | Self::Error(_))
    }

    fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    fn awaits_action(&self) -> bool {
        matches!(self, Self::FetchingCredentials | Self::RefreshingSession(_))
    }
}
