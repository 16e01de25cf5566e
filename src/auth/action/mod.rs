//! Side effects scheduled by the auth resolvers.
//!
//! Every action reports through the dispatcher and never returns an error. Sign-in
//! actions classify provider failures with [`ProviderError::into_sign_in_error`], so
//! errors the sign-in flow understands stay typed and everything else arrives wrapped
//! as [`SignInError::Service`].
//!
//! [`ProviderError::into_sign_in_error`]: crate::auth::ProviderError::into_sign_in_error

mod associate_software_token;
mod complete_totp_setup;
mod fetch_auth_session;
mod initiate_auth;
mod refresh_auth_session;
mod sign_out;
mod verify_sign_in_challenge;
mod verify_software_token_setup;

pub use associate_software_token::AssociateSoftwareToken;
pub use complete_totp_setup::CompleteTotpSetup;
pub use fetch_auth_session::FetchAuthSession;
pub use initiate_auth::InitiateAuth;
pub use refresh_auth_session::RefreshAuthSession;
pub use sign_out::SignOut;
pub use verify_sign_in_challenge::VerifySignInChallenge;
pub use verify_software_token_setup::VerifySoftwareTokenSetup;

use super::data::{
    AuthChallenge, ChallengeName, SignInContext, SignInMethod, SignedInData, UserPoolTokens,
};
use super::environment::{AuthEnvironment, AuthResponse, AuthenticationResult};
use super::error::SignInError;
use super::event::{AuthEvent, SignInEvent};
use crate::engine::{Action, EventDispatcher, MachineEvent};
use async_trait::async_trait;
use tracing::debug;

/// Every action the auth resolvers can schedule.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthAction {
    InitiateAuth(InitiateAuth),
    VerifySignInChallenge(VerifySignInChallenge),
    AssociateSoftwareToken(AssociateSoftwareToken),
    VerifySoftwareTokenSetup(VerifySoftwareTokenSetup),
    CompleteTotpSetup(CompleteTotpSetup),
    FetchAuthSession(FetchAuthSession),
    RefreshAuthSession(RefreshAuthSession),
    SignOut(SignOut),
}

#[async_trait]
impl Action for AuthAction {
    type Event = AuthEvent;
    type Environment = AuthEnvironment;

    fn identifier(&self) -> &'static str {
        match self {
            AuthAction::InitiateAuth(_) => InitiateAuth::IDENTIFIER,
            AuthAction::VerifySignInChallenge(_) => VerifySignInChallenge::IDENTIFIER,
            AuthAction::AssociateSoftwareToken(_) => AssociateSoftwareToken::IDENTIFIER,
            AuthAction::VerifySoftwareTokenSetup(_) => VerifySoftwareTokenSetup::IDENTIFIER,
            AuthAction::CompleteTotpSetup(_) => CompleteTotpSetup::IDENTIFIER,
            AuthAction::FetchAuthSession(_) => FetchAuthSession::IDENTIFIER,
            AuthAction::RefreshAuthSession(_) => RefreshAuthSession::IDENTIFIER,
            AuthAction::SignOut(_) => SignOut::IDENTIFIER,
        }
    }

    async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        match self {
            AuthAction::InitiateAuth(action) => action.execute(dispatcher, environment).await,
            AuthAction::VerifySignInChallenge(action) => {
                action.execute(dispatcher, environment).await
            }
            AuthAction::AssociateSoftwareToken(action) => {
                action.execute(dispatcher, environment).await
            }
            AuthAction::VerifySoftwareTokenSetup(action) => {
                action.execute(dispatcher, environment).await
            }
            AuthAction::CompleteTotpSetup(action) => action.execute(dispatcher, environment).await,
            AuthAction::FetchAuthSession(action) => action.execute(dispatcher, environment).await,
            AuthAction::RefreshAuthSession(action) => {
                action.execute(dispatcher, environment).await
            }
            AuthAction::SignOut(action) => action.execute(dispatcher, environment).await,
        }
    }
}

/// Log and send the single event an action produced.
async fn report(
    identifier: &'static str,
    dispatcher: &dyn EventDispatcher<AuthEvent>,
    event: AuthEvent,
) {
    debug!(action = identifier, event = event.identifier(), "Sending event");
    dispatcher.send(event).await;
}

/// Fold a sign-in step into the event that continues the flow.
fn sign_in_event(identifier: &'static str, result: Result<AuthEvent, SignInError>) -> AuthEvent {
    result.unwrap_or_else(|error| {
        debug!(action = identifier, error = %error, "Sign-in step failed");
        SignInEvent::ThrowAuthError(error).into()
    })
}

/// Turn a provider answer into the next sign-in event: either a new challenge or the
/// finished sign-in.
fn next_sign_in_event(
    response: AuthResponse,
    context: &SignInContext,
    environment: &AuthEnvironment,
) -> Result<AuthEvent, SignInError> {
    match response {
        AuthResponse::Challenge {
            name,
            session,
            parameters,
        } => Ok(SignInEvent::ReceivedChallenge(AuthChallenge {
            name: ChallengeName::parse(&name),
            context: context.clone(),
            session,
            parameters,
        })
        .into()),
        AuthResponse::Authenticated(result) => {
            let tokens = tokens_from_result(result, None, environment)?;
            Ok(SignInEvent::FinalizeSignIn(SignedInData {
                username: Some(context.username.clone()),
                signed_in_date: environment.now(),
                sign_in_method: SignInMethod::ApiBased(context.auth_flow),
                device_metadata: environment.device_metadata(&context.username),
                tokens,
            })
            .into())
        }
    }
}

/// Validate a wire result into tokens. A refresh response may omit the refresh token;
/// `previous_refresh_token` fills the gap.
fn tokens_from_result(
    result: AuthenticationResult,
    previous_refresh_token: Option<&str>,
    environment: &AuthEnvironment,
) -> Result<UserPoolTokens, SignInError> {
    let missing = |field: &str| {
        SignInError::InvalidServiceResponse(format!(
            "Authentication result did not contain {field}"
        ))
    };
    let id_token = result.id_token.ok_or_else(|| missing("an id token"))?;
    let access_token = result.access_token.ok_or_else(|| missing("an access token"))?;
    let refresh_token = result
        .refresh_token
        .or_else(|| previous_refresh_token.map(str::to_string))
        .ok_or_else(|| missing("a refresh token"))?;
    Ok(UserPoolTokens::new(
        id_token,
        access_token,
        refresh_token,
        result.expires_in,
        environment.now(),
    ))
}
