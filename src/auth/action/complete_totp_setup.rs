use super::{next_sign_in_event, report, sign_in_event};
use crate::auth::data::{ChallengeName, SignInContext};
use crate::auth::environment::{AuthEnvironment, RespondToAuthChallengeRequest};
use crate::auth::error::{ProviderError, SignInError};
use crate::auth::event::AuthEvent;
use crate::engine::EventDispatcher;
use std::collections::BTreeMap;
use tracing::debug;

/// Answer the `MFA_SETUP` challenge once the software token is verified.
#[derive(Clone, Debug, PartialEq)]
pub struct CompleteTotpSetup {
    pub context: SignInContext,
    pub session: String,
}

impl CompleteTotpSetup {
    pub const IDENTIFIER: &'static str = "CompleteTOTPSetup";

    pub async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        debug!(action = Self::IDENTIFIER, "Starting execution");
        let event = sign_in_event(Self::IDENTIFIER, self.complete(environment).await);
        report(Self::IDENTIFIER, dispatcher, event).await;
    }

    async fn complete(&self, environment: &AuthEnvironment) -> Result<AuthEvent, SignInError> {
        let client = environment.user_pool_environment()?.client()?;
        let response = client
            .respond_to_auth_challenge(RespondToAuthChallengeRequest {
                challenge_name: ChallengeName::MfaSetup,
                username: self.context.username.clone(),
                session: Some(self.session.clone()),
                responses: BTreeMap::from([(
                    "USERNAME".to_string(),
                    self.context.username.clone(),
                )]),
            })
            .await
            .map_err(ProviderError::into_sign_in_error)?;
        next_sign_in_event(response, &self.context, environment)
    }
}
