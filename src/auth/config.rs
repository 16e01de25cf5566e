//! Static configuration for the user pool and identity pool.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfiguration {
    #[serde(default)]
    pub user_pool: Option<UserPoolConfig>,
    #[serde(default)]
    pub identity_pool: Option<IdentityPoolConfig>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPoolConfig {
    pub pool_id: String,
    pub app_client_id: String,
    #[serde(default)]
    pub app_client_secret: Option<String>,
    pub region: String,
}

impl std::fmt::Debug for UserPoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPoolConfig")
            .field("pool_id", &self.pool_id)
            .field("app_client_id", &self.app_client_id)
            .field(
                "app_client_secret",
                &self.app_client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPoolConfig {
    pub pool_id: String,
    pub region: String,
}

impl AuthConfiguration {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let configuration: Self = serde_json::from_str(json)?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(user_pool) = &self.user_pool {
            require("userPool.poolId", &user_pool.pool_id)?;
            require("userPool.appClientId", &user_pool.app_client_id)?;
            require("userPool.region", &user_pool.region)?;
        }
        if let Some(identity_pool) = &self.identity_pool {
            require("identityPool.poolId", &identity_pool.pool_id)?;
            require("identityPool.region", &identity_pool.region)?;
        }
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingField(field))
    } else {
        Ok(())
    }
}
