use super::fetch_auth_session::establish_session;
use super::{report, tokens_from_result};
use crate::auth::data::Credentials;
use crate::auth::environment::AuthEnvironment;
use crate::auth::error::{AuthError, ProviderError};
use crate::auth::event::{AuthEvent, AuthorizationEvent};
use crate::engine::EventDispatcher;
use tracing::debug;

/// Renew an established session with its refresh token.
#[derive(Clone, Debug, PartialEq)]
pub struct RefreshAuthSession {
    pub credentials: Credentials,
}

impl RefreshAuthSession {
    pub const IDENTIFIER: &'static str = "RefreshAuthSession";

    pub async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        debug!(action = Self::IDENTIFIER, "Starting execution");
        let event = match self.refresh(environment).await {
            Ok(credentials) => AuthorizationEvent::Refreshed(credentials),
            Err(error) => AuthorizationEvent::ThrowError(error),
        };
        report(Self::IDENTIFIER, dispatcher, event.into()).await;
    }

    async fn refresh(&self, environment: &AuthEnvironment) -> Result<Credentials, AuthError> {
        let Some(current) = self.credentials.user_pool_tokens() else {
            return Err(AuthError::SessionExpired(
                "Session has no user pool tokens to refresh".to_string(),
            ));
        };
        let client = environment.user_pool_environment()?.client()?;
        let result = client
            .refresh_tokens(current.refresh_token.clone())
            .await
            .map_err(|error| match error {
                ProviderError::NotAuthorized(message) => AuthError::SessionExpired(message),
                other => other.into_auth_error(),
            })?;
        let tokens = tokens_from_result(result, Some(&current.refresh_token), environment)?;
        establish_session(tokens, environment).await
    }
}
