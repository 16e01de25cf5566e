use super::sign_in::SignInResolver;
use super::{accepts_federation, accepts_sign_in_with_tokens, can_restart_sign_in};
use crate::auth::action::{AuthAction, InitiateAuth, SignOut};
use crate::auth::data::{SignedInData, UserPoolTokens};
use crate::auth::event::{AuthEvent, AuthenticationEvent, AuthorizationEvent, SignInEvent};
use crate::auth::state::{AuthenticationState, AuthorizationState, SignInState};
use crate::engine::Resolution;

/// Resolves the "who is the user" half of the composite state.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthenticationResolver;

impl AuthenticationResolver {
    pub fn resolve(
        &self,
        state: &AuthenticationState,
        authz: &AuthorizationState,
        event: &AuthEvent,
    ) -> Resolution<AuthenticationState, AuthAction> {
        match event {
            AuthEvent::Configure(_) => Resolution::unchanged(state),
            AuthEvent::Authentication(event) => self.resolve_authentication(state, authz, event),
            AuthEvent::SignIn(SignInEvent::FinalizeSignIn(data)) => match state {
                AuthenticationState::SigningIn(_) => {
                    Resolution::to(AuthenticationState::SignedIn(data.clone()))
                }
                _ => Resolution::unchanged(state),
            },
            AuthEvent::SignIn(_) | AuthEvent::SetupSoftwareToken(_) => match state {
                AuthenticationState::SigningIn(sign_in) => SignInResolver
                    .resolve(sign_in, event)
                    .map_state(AuthenticationState::SigningIn),
                _ => Resolution::unchanged(state),
            },
            AuthEvent::Authorization(event) => resolve_authorization(state, authz, event),
        }
    }

    fn resolve_authentication(
        &self,
        state: &AuthenticationState,
        authz: &AuthorizationState,
        event: &AuthenticationEvent,
    ) -> Resolution<AuthenticationState, AuthAction> {
        match (state, event) {
            (_, AuthenticationEvent::SignInRequested(data)) if can_restart_sign_in(state) => {
                Resolution::with_action(
                    AuthenticationState::SigningIn(SignInState::SigningInWithPassword(
                        data.clone(),
                    )),
                    AuthAction::InitiateAuth(InitiateAuth { data: data.clone() }),
                )
            }

            (_, AuthenticationEvent::InitializedSignInWithTokens(data))
                if accepts_sign_in_with_tokens(state, authz) =>
            {
                // The fetch is scheduled by the authorization side.
                Resolution::to(AuthenticationState::SignedInWithTokens(data.clone()))
            }

            (AuthenticationState::SigningIn(_), AuthenticationEvent::CancelSignIn) => {
                Resolution::to(AuthenticationState::SignedOut(Default::default()))
            }

            (
                AuthenticationState::SignedIn(data) | AuthenticationState::SignedInWithTokens(data),
                AuthenticationEvent::SignOutRequested { global },
            ) => Resolution::with_action(
                AuthenticationState::SigningOut(data.clone()),
                AuthAction::SignOut(SignOut {
                    data: data.clone(),
                    global: *global,
                }),
            ),

            (AuthenticationState::SigningOut(_), AuthenticationEvent::SignedOut(data)) => {
                Resolution::to(AuthenticationState::SignedOut(data.clone()))
            }

            (_, AuthenticationEvent::FederatedToIdentityPool(_))
                if accepts_federation(state, authz) =>
            {
                Resolution::to(AuthenticationState::FederatedToIdentityPool)
            }

            (
                AuthenticationState::FederatedToIdentityPool,
                AuthenticationEvent::ClearFederation,
            ) => Resolution::to(AuthenticationState::SignedOut(Default::default())),

            _ => Resolution::unchanged(state),
        }
    }
}

fn resolve_authorization(
    state: &AuthenticationState,
    authz: &AuthorizationState,
    event: &AuthorizationEvent,
) -> Resolution<AuthenticationState, AuthAction> {
    match (state, authz, event) {
        (
            AuthenticationState::SignedIn(_) | AuthenticationState::SignedInWithTokens(_),
            AuthorizationState::FetchingCredentials,
            AuthorizationEvent::ThrowError(error),
        ) => Resolution::to(AuthenticationState::Error(error.clone())),

        (
            AuthenticationState::SignedIn(data),
            AuthorizationState::RefreshingSession(_),
            AuthorizationEvent::Refreshed(credentials),
        ) => match credentials.user_pool_tokens() {
            Some(tokens) => {
                Resolution::to(AuthenticationState::SignedIn(with_tokens(data, tokens)))
            }
            None => Resolution::unchanged(state),
        },

        (
            AuthenticationState::SignedInWithTokens(data),
            AuthorizationState::RefreshingSession(_),
            AuthorizationEvent::Refreshed(credentials),
        ) => match credentials.user_pool_tokens() {
            Some(tokens) => {
                Resolution::to(AuthenticationState::SignedInWithTokens(with_tokens(data, tokens)))
            }
            None => Resolution::unchanged(state),
        },

        _ => Resolution::unchanged(state),
    }
}

fn with_tokens(data: &SignedInData, tokens: &UserPoolTokens) -> SignedInData {
    SignedInData {
        tokens: tokens.clone(),
        ..data.clone()
    }
}
