use super::{next_sign_in_event, report, sign_in_event};
use crate::auth::data::SignInEventData;
use crate::auth::environment::{AuthEnvironment, InitiateAuthRequest};
use crate::auth::error::{ProviderError, SignInError};
use crate::auth::event::AuthEvent;
use crate::engine::EventDispatcher;
use tracing::debug;

/// Start an API-based sign-in with the user's password.
#[derive(Clone, Debug, PartialEq)]
pub struct InitiateAuth {
    pub data: SignInEventData,
}

impl InitiateAuth {
    pub const IDENTIFIER: &'static str = "InitiateAuth";

    pub async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        debug!(action = Self::IDENTIFIER, "Starting execution");
        let event = sign_in_event(Self::IDENTIFIER, self.initiate(environment).await);
        report(Self::IDENTIFIER, dispatcher, event).await;
    }

    async fn initiate(&self, environment: &AuthEnvironment) -> Result<AuthEvent, SignInError> {
        let client = environment.user_pool_environment()?.client()?;
        let response = client
            .initiate_auth(InitiateAuthRequest {
                username: self.data.username.clone(),
                password: self.data.password.clone(),
                auth_flow: self.data.auth_flow.as_str().to_string(),
            })
            .await
            .map_err(ProviderError::into_sign_in_error)?;
        next_sign_in_event(response, &self.data.context(), environment)
    }
}
