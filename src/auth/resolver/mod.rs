//! Transition logic for the composite auth state.
//!
//! The composite resolver routes every event to both sub-resolvers. Each one sees its
//! own sub-state plus a read-only snapshot of its sibling taken before the event, and
//! the pair of results becomes the next composite state. The transition table never
//! schedules an action from both sides for the same event; if it ever did, the
//! authentication side would win.

mod authentication;
mod authorization;
mod sign_in;
mod software_token;

pub use authentication::AuthenticationResolver;
pub use authorization::AuthorizationResolver;
pub use sign_in::SignInResolver;
pub use software_token::SoftwareTokenSetupResolver;

use super::action::AuthAction;
use super::event::{AuthEvent, ConfigureData};
use super::state::{AuthState, AuthenticationState, AuthorizationState};
use crate::core::State;
use crate::engine::{Resolution, Resolver};

/// Resolver for [`AuthState`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthResolver;

impl Resolver for AuthResolver {
    type State = AuthState;
    type Event = AuthEvent;
    type Action = AuthAction;

    fn resolve(&self, state: &AuthState, event: &AuthEvent) -> Resolution<AuthState, AuthAction> {
        match (state, event) {
            (AuthState::NotConfigured, AuthEvent::Configure(data)) => {
                Resolution::to(configured(data))
            }
            (AuthState::NotConfigured, _) => Resolution::unchanged(state),
            (AuthState::Configured(authn, authz), event) => {
                let authentication = AuthenticationResolver.resolve(authn, authz, event);
                let authorization = AuthorizationResolver.resolve(authz, authn, event);
                Resolution {
                    new_state: AuthState::Configured(
                        authentication.new_state,
                        authorization.new_state,
                    ),
                    action: authentication.action.or(authorization.action),
                }
            }
        }
    }
}

fn configured(data: &ConfigureData) -> AuthState {
    let authn = match (&data.signed_in, data.user_pool_configured) {
        (_, false) => AuthenticationState::NotConfigured,
        (Some(signed_in), true) => AuthenticationState::SignedIn(signed_in.clone()),
        (None, true) => AuthenticationState::SignedOut(Default::default()),
    };
    let authz = match &data.credentials {
        Some(credentials) => AuthorizationState::SessionEstablished(credentials.clone()),
        None => AuthorizationState::Configured,
    };
    AuthState::Configured(authn, authz)
}

/// Authentication states a new sign-in may start from.
pub(crate) fn can_start_sign_in(authn: &AuthenticationState) -> bool {
    matches!(
        authn,
        AuthenticationState::NotConfigured
            | AuthenticationState::SignedOut(_)
            | AuthenticationState::FederatedToIdentityPool
            | AuthenticationState::Error(_)
    )
}

/// Authentication states a password sign-in may start from, including a failed attempt
/// at any step.
pub(crate) fn can_restart_sign_in(authn: &AuthenticationState) -> bool {
    match authn {
        AuthenticationState::SigningIn(sign_in) => sign_in.is_error(),
        other => can_start_sign_in(other),
    }
}

/// Authorization states that may start fetching a fresh session.
pub(crate) fn can_fetch_session(authz: &AuthorizationState) -> bool {
    matches!(
        authz,
        AuthorizationState::Configured
            | AuthorizationState::SessionEstablished(_)
            | AuthorizationState::Error(_)
    )
}

/// Both halves must agree before a sign-in with tokens moves either of them.
pub(crate) fn accepts_sign_in_with_tokens(
    authn: &AuthenticationState,
    authz: &AuthorizationState,
) -> bool {
    can_start_sign_in(authn) && can_fetch_session(authz)
}

pub(crate) fn accepts_federation(authn: &AuthenticationState, authz: &AuthorizationState) -> bool {
    matches!(
        authn,
        AuthenticationState::NotConfigured
            | AuthenticationState::SignedOut(_)
            | AuthenticationState::Error(_)
    ) && can_fetch_session(authz)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::auth::data::{
        AuthFlowType, AwsCredentials, Credentials, DeviceMetadata, SignInMethod, SignedInData,
        UserPoolTokens,
    };
    use chrono::{DateTime, TimeZone, Utc};

    pub fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    pub fn tokens(tag: &str) -> UserPoolTokens {
        UserPoolTokens::new(
            format!("{tag}-id"),
            format!("{tag}-access"),
            format!("{tag}-refresh"),
            None,
            instant(),
        )
    }

    pub fn signed_in(tag: &str) -> SignedInData {
        SignedInData {
            username: Some("alice".into()),
            signed_in_date: instant(),
            sign_in_method: SignInMethod::ApiBased(AuthFlowType::UserSrp),
            device_metadata: DeviceMetadata::NoData,
            tokens: tokens(tag),
        }
    }

    pub fn credentials(tag: &str) -> Credentials {
        Credentials::UserPoolAndIdentityPool {
            tokens: tokens(tag),
            identity_id: format!("{tag}-identity"),
            credentials: AwsCredentials {
                access_key_id: format!("{tag}-key"),
                secret_access_key: "secret".into(),
                session_token: "session".into(),
                expiration: instant(),
            },
        }
    }
}
