use super::{report, sign_in_event};
use crate::auth::data::AssociateSoftwareTokenData;
use crate::auth::environment::{AuthEnvironment, SoftwareTokenOwner};
use crate::auth::error::{ProviderError, SignInError};
use crate::auth::event::{AuthEvent, SetupSoftwareTokenEvent};
use crate::engine::EventDispatcher;
use tracing::debug;

/// Ask the provider for a new TOTP shared secret.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociateSoftwareToken {
    pub session: Option<String>,
}

impl AssociateSoftwareToken {
    pub const IDENTIFIER: &'static str = "AssociateSoftwareToken";

    pub async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        debug!(action = Self::IDENTIFIER, "Starting execution");
        let event = sign_in_event(Self::IDENTIFIER, self.associate(environment).await);
        report(Self::IDENTIFIER, dispatcher, event).await;
    }

    async fn associate(&self, environment: &AuthEnvironment) -> Result<AuthEvent, SignInError> {
        let client = environment.user_pool_environment()?.client()?;
        let output = client
            .associate_software_token(SoftwareTokenOwner::Session(self.session.clone()))
            .await
            .map_err(ProviderError::into_sign_in_error)?;

        match (output.secret_code, output.session) {
            (Some(secret_code), Some(session)) => Ok(SetupSoftwareTokenEvent::WaitForAnswer(
                AssociateSoftwareTokenData {
                    secret_code,
                    session,
                },
            )
            .into()),
            _ => Err(SignInError::InvalidServiceResponse(
                "Unable to retrieve associate software token response".to_string(),
            )),
        }
    }
}
