use super::{provider_failure, signed_in_user};
use crate::auth::environment::{SoftwareTokenOwner, VerifySoftwareTokenRequest};
use crate::auth::error::AuthError;
use crate::auth::AuthStateMachine;
use tracing::debug;

/// Confirm an authenticator app enrolled through
/// [`AssociateSoftwareTokenTask`](super::AssociateSoftwareTokenTask) with its first code.
pub struct VerifySoftwareTokenTask {
    code: String,
    friendly_device_name: Option<String>,
    machine: AuthStateMachine,
}

impl VerifySoftwareTokenTask {
    pub const EVENT_NAME: &'static str = "Auth.verifySoftwareTokenAPI";

    pub fn new(code: impl Into<String>, machine: AuthStateMachine) -> Self {
        Self {
            code: code.into(),
            friendly_device_name: None,
            machine,
        }
    }

    pub fn with_friendly_device_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_device_name = Some(name.into());
        self
    }

    pub async fn execute(&self) -> Result<(), AuthError> {
        debug!(task = Self::EVENT_NAME, "Starting execution");
        if self.code.trim().is_empty() {
            return Err(AuthError::Validation(
                "A code is required to verify the software token".to_string(),
            ));
        }
        let user = signed_in_user("Verify software token", &self.machine)?;
        let client = self.machine.environment().user_pool_environment()?.client()?;

        client
            .verify_software_token(VerifySoftwareTokenRequest {
                owner: SoftwareTokenOwner::AccessToken(user.tokens.access_token),
                user_code: self.code.clone(),
                friendly_device_name: self.friendly_device_name.clone(),
            })
            .await
            .map_err(provider_failure)?;
        debug!(task = Self::EVENT_NAME, "Software token verified");
        Ok(())
    }
}
