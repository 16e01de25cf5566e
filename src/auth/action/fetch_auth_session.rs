use super::report;
use crate::auth::data::{Credentials, UserPoolTokens};
use crate::auth::environment::AuthEnvironment;
use crate::auth::error::{AuthError, EnvironmentError, ProviderError};
use crate::auth::event::{AuthEvent, AuthorizationEvent};
use crate::engine::EventDispatcher;
use tracing::debug;

/// Exchange fresh user-pool tokens for a full session.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchAuthSession {
    pub tokens: UserPoolTokens,
}

impl FetchAuthSession {
    pub const IDENTIFIER: &'static str = "FetchAuthSession";

    pub async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        debug!(action = Self::IDENTIFIER, "Starting execution");
        let event = match establish_session(self.tokens.clone(), environment).await {
            Ok(credentials) => AuthorizationEvent::SessionEstablished(credentials),
            Err(error) => AuthorizationEvent::ThrowError(error),
        };
        report(Self::IDENTIFIER, dispatcher, event.into()).await;
    }
}

/// Pair user-pool tokens with identity-pool credentials.
///
/// Without an identity pool the session holds the tokens alone.
pub(super) async fn establish_session(
    tokens: UserPoolTokens,
    environment: &AuthEnvironment,
) -> Result<Credentials, AuthError> {
    let identity_pool = match environment.identity_pool_environment() {
        Ok(identity_pool) => identity_pool,
        Err(EnvironmentError::IdentityPoolNotConfigured) => {
            return Ok(Credentials::UserPoolOnly { tokens });
        }
        Err(error) => return Err(error.into()),
    };
    let client = identity_pool.client()?;
    let identity = client
        .fetch_credentials(tokens.clone())
        .await
        .map_err(ProviderError::into_auth_error)?;
    Ok(Credentials::UserPoolAndIdentityPool {
        tokens,
        identity_id: identity.identity_id,
        credentials: identity.credentials,
    })
}
