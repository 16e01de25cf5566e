use super::{report, sign_in_event};
use crate::auth::data::AssociateSoftwareTokenData;
use crate::auth::environment::{AuthEnvironment, SoftwareTokenOwner, VerifySoftwareTokenRequest};
use crate::auth::error::{ProviderError, SignInError};
use crate::auth::event::{AuthEvent, SetupSoftwareTokenEvent};
use crate::engine::EventDispatcher;
use tracing::debug;

/// Check the first code the user's authenticator produced.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifySoftwareTokenSetup {
    pub data: AssociateSoftwareTokenData,
    pub code: String,
}

impl VerifySoftwareTokenSetup {
    pub const IDENTIFIER: &'static str = "VerifySoftwareTokenSetup";

    pub async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        debug!(action = Self::IDENTIFIER, "Starting execution");
        let event = sign_in_event(Self::IDENTIFIER, self.verify(environment).await);
        report(Self::IDENTIFIER, dispatcher, event).await;
    }

    async fn verify(&self, environment: &AuthEnvironment) -> Result<AuthEvent, SignInError> {
        let client = environment.user_pool_environment()?.client()?;
        let output = client
            .verify_software_token(VerifySoftwareTokenRequest {
                owner: SoftwareTokenOwner::Session(Some(self.data.session.clone())),
                user_code: self.code.clone(),
                friendly_device_name: None,
            })
            .await
            .map_err(ProviderError::into_sign_in_error)?;

        let session = output.session.ok_or_else(|| {
            SignInError::InvalidServiceResponse(
                "Unable to retrieve the session value from VerifySoftwareToken response"
                    .to_string(),
            )
        })?;
        Ok(SetupSoftwareTokenEvent::RespondToAuthChallenge { session }.into())
    }
}
