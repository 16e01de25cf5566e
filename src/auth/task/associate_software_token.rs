use super::{provider_failure, signed_in_user};
use crate::auth::environment::SoftwareTokenOwner;
use crate::auth::error::AuthError;
use crate::auth::AuthStateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// What an authenticator app needs to start producing codes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpSetupDetails {
    pub secret_code: String,
    pub username: Option<String>,
}

impl fmt::Debug for TotpSetupDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpSetupDetails")
            .field("secret_code", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// Start enrolling an authenticator app for the signed-in user.
///
/// The machine's state is only read. Finish the enrollment with
/// [`VerifySoftwareTokenTask`](super::VerifySoftwareTokenTask).
pub struct AssociateSoftwareTokenTask {
    machine: AuthStateMachine,
}

impl AssociateSoftwareTokenTask {
    pub const EVENT_NAME: &'static str = "Auth.associateSoftwareTokenAPI";

    pub fn new(machine: AuthStateMachine) -> Self {
        Self { machine }
    }

    pub async fn execute(&self) -> Result<TotpSetupDetails, AuthError> {
        debug!(task = Self::EVENT_NAME, "Starting execution");
        let user = signed_in_user("Associate software token", &self.machine)?;
        let client = self.machine.environment().user_pool_environment()?.client()?;

        let output = client
            .associate_software_token(SoftwareTokenOwner::AccessToken(
                user.tokens.access_token.clone(),
            ))
            .await
            .map_err(provider_failure)?;
        let secret_code = output.secret_code.ok_or_else(|| {
            AuthError::Service("Unable to retrieve associate software token response".to_string())
        })?;

        Ok(TotpSetupDetails {
            secret_code,
            username: user.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_code_is_not_logged() {
        let details = TotpSetupDetails {
            secret_code: "JBSWY3DPEHPK3PXP".into(),
            username: Some("alice".into()),
        };
        let rendered = format!("{details:?}");
        assert!(!rendered.contains("JBSWY3DPEHPK3PXP"));
        assert!(rendered.contains("alice"));
    }
}
