use super::{next_sign_in_event, report, sign_in_event};
use crate::auth::data::AuthChallenge;
use crate::auth::environment::{AuthEnvironment, RespondToAuthChallengeRequest};
use crate::auth::error::{ProviderError, SignInError};
use crate::auth::event::AuthEvent;
use crate::engine::EventDispatcher;
use std::collections::BTreeMap;
use tracing::debug;

/// Answer a pending challenge.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifySignInChallenge {
    pub challenge: AuthChallenge,
    pub answer: String,
}

impl VerifySignInChallenge {
    pub const IDENTIFIER: &'static str = "VerifySignInChallenge";

    pub async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        debug!(
            action = Self::IDENTIFIER,
            challenge = self.challenge.name.as_str(),
            "Starting execution"
        );
        let event = sign_in_event(Self::IDENTIFIER, self.verify(environment).await);
        report(Self::IDENTIFIER, dispatcher, event).await;
    }

    async fn verify(&self, environment: &AuthEnvironment) -> Result<AuthEvent, SignInError> {
        let client = environment.user_pool_environment()?.client()?;
        let context = &self.challenge.context;
        let responses = BTreeMap::from([
            ("USERNAME".to_string(), context.username.clone()),
            (
                self.challenge.name.response_key().to_string(),
                self.answer.clone(),
            ),
        ]);
        let response = client
            .respond_to_auth_challenge(RespondToAuthChallengeRequest {
                challenge_name: self.challenge.name.clone(),
                username: context.username.clone(),
                session: self.challenge.session.clone(),
                responses,
            })
            .await
            .map_err(ProviderError::into_sign_in_error)?;
        next_sign_in_event(response, context, environment)
    }
}
