use super::report;
use crate::auth::data::{SignedInData, SignedOutData};
use crate::auth::environment::{AuthEnvironment, UserPoolEnvironment};
use crate::auth::event::{AuthEvent, AuthenticationEvent};
use crate::engine::EventDispatcher;
use tracing::{debug, warn};

/// Invalidate tokens with the provider, then sign out locally.
///
/// Local sign-out always succeeds; provider failures are recorded in the resulting
/// [`SignedOutData`].
#[derive(Clone, Debug, PartialEq)]
pub struct SignOut {
    pub data: SignedInData,
    pub global: bool,
}

impl SignOut {
    pub const IDENTIFIER: &'static str = "SignOut";

    pub async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<AuthEvent>,
        environment: &AuthEnvironment,
    ) {
        debug!(action = Self::IDENTIFIER, global = self.global, "Starting execution");
        let mut signed_out = SignedOutData {
            last_known_username: self.data.username.clone(),
            ..Default::default()
        };

        match environment
            .user_pool_environment()
            .and_then(UserPoolEnvironment::client)
        {
            Ok(client) => {
                if self.global {
                    if let Err(error) = client
                        .global_sign_out(self.data.tokens.access_token.clone())
                        .await
                    {
                        warn!(error = %error, "Global sign out failed");
                        signed_out.global_sign_out_error = Some(error.to_string());
                    }
                }
                if let Err(error) = client
                    .revoke_token(self.data.tokens.refresh_token.clone())
                    .await
                {
                    warn!(error = %error, "Token revocation failed");
                    signed_out.revoke_token_error = Some(error.to_string());
                }
            }
            Err(error) => {
                warn!(error = %error, "Signing out locally only");
                signed_out.revoke_token_error = Some(error.to_string());
            }
        }

        report(
            Self::IDENTIFIER,
            dispatcher,
            AuthenticationEvent::SignedOut(signed_out).into(),
        )
        .await;
    }
}
