//! Payload types carried by auth states and events.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Token lifetime assumed when the caller does not supply one.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Opaque tokens issued by the user pool.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoolTokens {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expiration: DateTime<Utc>,
}

impl UserPoolTokens {
    /// Build tokens that expire `expires_in` seconds after `issued_at`.
    pub fn new(
        id_token: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: Option<i64>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let lifetime = expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Self {
            id_token: id_token.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expiration: issued_at + Duration::seconds(lifetime),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }
}

// Token material never goes into logs.
impl fmt::Debug for UserPoolTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPoolTokens")
            .field("id_token", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Short-lived AWS credentials vended by the identity pool.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Session material owned by the authorization sub-state.
///
/// Replaced wholesale on every refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credentials {
    UserPoolOnly {
        tokens: UserPoolTokens,
    },
    IdentityPoolOnly {
        identity_id: String,
        credentials: AwsCredentials,
    },
    UserPoolAndIdentityPool {
        tokens: UserPoolTokens,
        identity_id: String,
        credentials: AwsCredentials,
    },
    NoCredentials,
}

impl Credentials {
    pub fn user_pool_tokens(&self) -> Option<&UserPoolTokens> {
        match self {
            Credentials::UserPoolOnly { tokens }
            | Credentials::UserPoolAndIdentityPool { tokens, .. } => Some(tokens),
            _ => None,
        }
    }

    pub fn identity_id(&self) -> Option<&str> {
        match self {
            Credentials::IdentityPoolOnly { identity_id, .. }
            | Credentials::UserPoolAndIdentityPool { identity_id, .. } => Some(identity_id),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthFlowType {
    UserSrp,
    CustomWithSrp,
    CustomWithoutSrp,
    UserPassword,
}

impl AuthFlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFlowType::UserSrp => "USER_SRP_AUTH",
            AuthFlowType::CustomWithSrp | AuthFlowType::CustomWithoutSrp => "CUSTOM_AUTH",
            AuthFlowType::UserPassword => "USER_PASSWORD_AUTH",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedUiOptions {
    pub scopes: Vec<String>,
    pub provider: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignInMethod {
    ApiBased(AuthFlowType),
    HostedUi(HostedUiOptions),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceMetadata {
    NoData,
    Metadata {
        device_key: String,
        device_group_key: String,
    },
}

/// Everything known about a successful sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInData {
    pub username: Option<String>,
    pub signed_in_date: DateTime<Utc>,
    pub sign_in_method: SignInMethod,
    pub device_metadata: DeviceMetadata,
    pub tokens: UserPoolTokens,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOutData {
    pub last_known_username: Option<String>,
    /// Set when the refresh token could not be revoked; the local sign-out still happened.
    pub revoke_token_error: Option<String>,
    pub global_sign_out_error: Option<String>,
}

impl SignedOutData {
    pub fn is_partial(&self) -> bool {
        self.revoke_token_error.is_some() || self.global_sign_out_error.is_some()
    }
}

/// Result of associating a software token: the shared secret plus the session to continue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateSoftwareTokenData {
    pub secret_code: String,
    pub session: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeName {
    SoftwareTokenMfa,
    MfaSetup,
    Other(String),
}

impl ChallengeName {
    pub fn parse(name: &str) -> Self {
        match name {
            "SOFTWARE_TOKEN_MFA" => ChallengeName::SoftwareTokenMfa,
            "MFA_SETUP" => ChallengeName::MfaSetup,
            other => ChallengeName::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChallengeName::SoftwareTokenMfa => "SOFTWARE_TOKEN_MFA",
            ChallengeName::MfaSetup => "MFA_SETUP",
            ChallengeName::Other(name) => name,
        }
    }

    /// The provider-side answer key for this challenge.
    pub fn response_key(&self) -> &'static str {
        match self {
            ChallengeName::SoftwareTokenMfa => "SOFTWARE_TOKEN_MFA_CODE",
            ChallengeName::MfaSetup => "MFA_SETUP",
            ChallengeName::Other(_) => "ANSWER",
        }
    }
}

/// Who is signing in and how; carried through multi-step sign-ins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInContext {
    pub username: String,
    pub auth_flow: AuthFlowType,
}

/// A challenge the provider raised during sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub name: ChallengeName,
    pub context: SignInContext,
    pub session: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

/// Input to a password sign-in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInEventData {
    pub username: String,
    pub password: String,
    pub auth_flow: AuthFlowType,
}

impl SignInEventData {
    pub fn context(&self) -> SignInContext {
        SignInContext {
            username: self.username.clone(),
            auth_flow: self.auth_flow,
        }
    }
}

impl fmt::Debug for SignInEventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInEventData")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_flow", &self.auth_flow)
            .finish()
    }
}
