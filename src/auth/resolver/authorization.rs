use super::{accepts_federation, accepts_sign_in_with_tokens};
use crate::auth::action::{AuthAction, FetchAuthSession, RefreshAuthSession};
use crate::auth::data::UserPoolTokens;
use crate::auth::event::{AuthEvent, AuthenticationEvent, AuthorizationEvent, SignInEvent};
use crate::auth::state::{AuthenticationState, AuthorizationState};
use crate::engine::Resolution;

/// Resolves the "what may the user access" half of the composite state.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorizationResolver;

impl AuthorizationResolver {
    pub fn resolve(
        &self,
        state: &AuthorizationState,
        authn: &AuthenticationState,
        event: &AuthEvent,
    ) -> Resolution<AuthorizationState, AuthAction> {
        match event {
            AuthEvent::Authentication(event) => resolve_authentication(state, authn, event),
            AuthEvent::SignIn(SignInEvent::FinalizeSignIn(data)) => match authn {
                AuthenticationState::SigningIn(_) => fetch(data.tokens.clone()),
                _ => Resolution::unchanged(state),
            },
            AuthEvent::Authorization(event) => resolve_authorization(state, event),
            _ => Resolution::unchanged(state),
        }
    }
}

fn fetch(tokens: UserPoolTokens) -> Resolution<AuthorizationState, AuthAction> {
    Resolution::with_action(
        AuthorizationState::FetchingCredentials,
        AuthAction::FetchAuthSession(FetchAuthSession { tokens }),
    )
}

fn resolve_authentication(
    state: &AuthorizationState,
    authn: &AuthenticationState,
    event: &AuthenticationEvent,
) -> Resolution<AuthorizationState, AuthAction> {
    match (authn, event) {
        (_, AuthenticationEvent::InitializedSignInWithTokens(data))
            if accepts_sign_in_with_tokens(authn, state) =>
        {
            fetch(data.tokens.clone())
        }

        (AuthenticationState::SigningOut(_), AuthenticationEvent::SignedOut(_)) => {
            Resolution::to(AuthorizationState::Configured)
        }

        (_, AuthenticationEvent::FederatedToIdentityPool(credentials))
            if accepts_federation(authn, state) =>
        {
            Resolution::to(AuthorizationState::SessionEstablished(credentials.clone()))
        }

        (AuthenticationState::FederatedToIdentityPool, AuthenticationEvent::ClearFederation) => {
            Resolution::to(AuthorizationState::Configured)
        }

        _ => Resolution::unchanged(state),
    }
}

fn resolve_authorization(
    state: &AuthorizationState,
    event: &AuthorizationEvent,
) -> Resolution<AuthorizationState, AuthAction> {
    match (state, event) {
        (
            AuthorizationState::FetchingCredentials,
            AuthorizationEvent::SessionEstablished(credentials),
        )
        | (
            AuthorizationState::RefreshingSession(_),
            AuthorizationEvent::Refreshed(credentials),
        ) => Resolution::to(AuthorizationState::SessionEstablished(credentials.clone())),

        (
            AuthorizationState::FetchingCredentials | AuthorizationState::RefreshingSession(_),
            AuthorizationEvent::ThrowError(error),
        ) => Resolution::to(AuthorizationState::Error(error.clone())),

        (
            AuthorizationState::SessionEstablished(credentials),
            AuthorizationEvent::RefreshSession,
        ) => Resolution::with_action(
            AuthorizationState::RefreshingSession(credentials.clone()),
            AuthAction::RefreshAuthSession(RefreshAuthSession {
                credentials: credentials.clone(),
            }),
        ),

        _ => Resolution::unchanged(state),
    }
}
