//! Capabilities injected into actions.
//!
//! The environment is built once and never mutated by the machine. Actions ask it for a
//! narrow sub-environment (user pool or identity pool); that lookup is fallible and is
//! the only checked error an action handles before starting work.

use super::config::{AuthConfiguration, IdentityPoolConfig, UserPoolConfig};
use super::data::{AwsCredentials, ChallengeName, DeviceMetadata, UserPoolTokens};
use super::error::{BuildError, EnvironmentError, ProviderError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitiateAuthRequest {
    pub username: String,
    pub password: String,
    pub auth_flow: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RespondToAuthChallengeRequest {
    pub challenge_name: ChallengeName,
    pub username: String,
    pub session: Option<String>,
    pub responses: BTreeMap<String, String>,
}

/// Tokens as returned on the wire; any field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthenticationResult {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Outcome of `initiate_auth` or `respond_to_auth_challenge`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthResponse {
    Authenticated(AuthenticationResult),
    Challenge {
        name: String,
        session: Option<String>,
        parameters: BTreeMap<String, String>,
    },
}

/// Who a software token is associated with or verified for.
#[derive(Clone, PartialEq, Eq)]
pub enum SoftwareTokenOwner {
    /// A sign-in stopped at an MFA setup challenge.
    Session(Option<String>),
    /// A signed-in user, identified by their access token.
    AccessToken(String),
}

impl fmt::Debug for SoftwareTokenOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(session) => f.debug_tuple("Session").field(session).finish(),
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"<redacted>").finish(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifySoftwareTokenRequest {
    pub owner: SoftwareTokenOwner,
    pub user_code: String,
    /// Label the provider shows for the enrolled authenticator.
    pub friendly_device_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssociateSoftwareTokenOutput {
    pub session: Option<String>,
    pub secret_code: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifySoftwareTokenOutput {
    pub session: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityCredentials {
    pub identity_id: String,
    pub credentials: AwsCredentials,
}

/// User-pool RPC surface.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn initiate_auth(
        &self,
        request: InitiateAuthRequest,
    ) -> Result<AuthResponse, ProviderError>;

    async fn respond_to_auth_challenge(
        &self,
        request: RespondToAuthChallengeRequest,
    ) -> Result<AuthResponse, ProviderError>;

    async fn associate_software_token(
        &self,
        owner: SoftwareTokenOwner,
    ) -> Result<AssociateSoftwareTokenOutput, ProviderError>;

    async fn verify_software_token(
        &self,
        request: VerifySoftwareTokenRequest,
    ) -> Result<VerifySoftwareTokenOutput, ProviderError>;

    async fn refresh_tokens(
        &self,
        refresh_token: String,
    ) -> Result<AuthenticationResult, ProviderError>;

    async fn revoke_token(&self, refresh_token: String) -> Result<(), ProviderError>;

    async fn global_sign_out(&self, access_token: String) -> Result<(), ProviderError>;
}

/// Identity-pool RPC surface.
#[async_trait]
pub trait IdentityPoolProvider: Send + Sync {
    async fn fetch_credentials(
        &self,
        tokens: UserPoolTokens,
    ) -> Result<IdentityCredentials, ProviderError>;
}

pub type IdentityProviderFactory =
    Arc<dyn Fn() -> Result<Arc<dyn IdentityProvider>, EnvironmentError> + Send + Sync>;

pub type IdentityPoolProviderFactory =
    Arc<dyn Fn() -> Result<Arc<dyn IdentityPoolProvider>, EnvironmentError> + Send + Sync>;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of remembered-device keys for a user.
pub trait DeviceMetadataSource: Send + Sync {
    fn device_metadata(&self, username: &str) -> DeviceMetadata;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoDeviceMetadata;

impl DeviceMetadataSource for NoDeviceMetadata {
    fn device_metadata(&self, _username: &str) -> DeviceMetadata {
        DeviceMetadata::NoData
    }
}

impl<F> DeviceMetadataSource for F
where
    F: Fn(&str) -> DeviceMetadata + Send + Sync,
{
    fn device_metadata(&self, username: &str) -> DeviceMetadata {
        self(username)
    }
}

pub struct UserPoolEnvironment {
    config: UserPoolConfig,
    factory: IdentityProviderFactory,
}

impl UserPoolEnvironment {
    pub fn config(&self) -> &UserPoolConfig {
        &self.config
    }

    /// Construct a provider client.
    pub fn client(&self) -> Result<Arc<dyn IdentityProvider>, EnvironmentError> {
        (self.factory)()
    }
}

pub struct IdentityPoolEnvironment {
    config: IdentityPoolConfig,
    factory: IdentityPoolProviderFactory,
}

impl IdentityPoolEnvironment {
    pub fn config(&self) -> &IdentityPoolConfig {
        &self.config
    }

    pub fn client(&self) -> Result<Arc<dyn IdentityPoolProvider>, EnvironmentError> {
        (self.factory)()
    }
}

/// Everything actions may reach outside the machine.
pub struct AuthEnvironment {
    configuration: AuthConfiguration,
    user_pool: Option<UserPoolEnvironment>,
    identity_pool: Option<IdentityPoolEnvironment>,
    clock: Arc<dyn Clock>,
    device_metadata: Arc<dyn DeviceMetadataSource>,
}

impl AuthEnvironment {
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    pub fn configuration(&self) -> &AuthConfiguration {
        &self.configuration
    }

    pub fn user_pool_environment(&self) -> Result<&UserPoolEnvironment, EnvironmentError> {
        self.user_pool
            .as_ref()
            .ok_or(EnvironmentError::UserPoolNotConfigured)
    }

    pub fn identity_pool_environment(
        &self,
    ) -> Result<&IdentityPoolEnvironment, EnvironmentError> {
        self.identity_pool
            .as_ref()
            .ok_or(EnvironmentError::IdentityPoolNotConfigured)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn device_metadata(&self, username: &str) -> DeviceMetadata {
        self.device_metadata.device_metadata(username)
    }
}

impl fmt::Debug for AuthEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEnvironment")
            .field("configuration", &self.configuration)
            .field("user_pool", &self.user_pool.is_some())
            .field("identity_pool", &self.identity_pool.is_some())
            .finish()
    }
}

/// Builder for [`AuthEnvironment`].
#[derive(Default)]
pub struct EnvironmentBuilder {
    configuration: AuthConfiguration,
    user_pool_factory: Option<IdentityProviderFactory>,
    identity_pool_factory: Option<IdentityPoolProviderFactory>,
    clock: Option<Arc<dyn Clock>>,
    device_metadata: Option<Arc<dyn DeviceMetadataSource>>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configuration(mut self, configuration: AuthConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn user_pool_client<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn IdentityProvider>, EnvironmentError> + Send + Sync + 'static,
    {
        self.user_pool_factory = Some(Arc::new(factory));
        self
    }

    pub fn identity_pool_client<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn IdentityPoolProvider>, EnvironmentError>
            + Send
            + Sync
            + 'static,
    {
        self.identity_pool_factory = Some(Arc::new(factory));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn device_metadata(mut self, source: impl DeviceMetadataSource + 'static) -> Self {
        self.device_metadata = Some(Arc::new(source));
        self
    }

    /// Validate the configuration and pair each configured pool with its client factory.
    ///
    /// A factory without a matching pool configuration is ignored.
    pub fn build(self) -> Result<AuthEnvironment, BuildError> {
        self.configuration.validate()?;

        let user_pool = match (&self.configuration.user_pool, self.user_pool_factory) {
            (Some(config), Some(factory)) => Some(UserPoolEnvironment {
                config: config.clone(),
                factory,
            }),
            (Some(_), None) => return Err(BuildError::MissingUserPoolClient),
            (None, _) => None,
        };

        let identity_pool = match (&self.configuration.identity_pool, self.identity_pool_factory)
        {
            (Some(config), Some(factory)) => Some(IdentityPoolEnvironment {
                config: config.clone(),
                factory,
            }),
            (Some(_), None) => return Err(BuildError::MissingIdentityPoolClient),
            (None, _) => None,
        };

        Ok(AuthEnvironment {
            configuration: self.configuration,
            user_pool,
            identity_pool,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            device_metadata: self
                .device_metadata
                .unwrap_or_else(|| Arc::new(NoDeviceMetadata)),
        })
    }
}
