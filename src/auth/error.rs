//! Error types for the authentication domain.
//!
//! Errors that end up inside a state snapshot (`AuthError`, `SignInError`) are plain
//! values: cloneable, comparable and serializable, carrying messages instead of sources.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-facing error, also stored in the `Error` sub-states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum AuthError {
    /// The operation was invoked while the machine was in an unsuitable state.
    #[error("Invalid state: {message} ({recovery})")]
    InvalidState { message: String, recovery: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Sign in failed: {0}")]
    SignIn(SignInError),

    /// A task's await loop ended without reaching any terminal state.
    #[error("Flow could not be completed: {0}")]
    FlowIncomplete(String),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AuthError {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        AuthError::InvalidState {
            message: message.into(),
            recovery: "Make sure the auth flow is in a valid state before calling this API"
                .to_string(),
        }
    }
}

/// Errors produced while a sign-in flow is in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum SignInError {
    /// The provider answered, but without fields the flow needs.
    #[error("Invalid service response: {0}")]
    InvalidServiceResponse(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Code mismatch: {0}")]
    CodeMismatch(String),

    #[error("Code expired: {0}")]
    CodeExpired(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Any failure outside the sign-in vocabulary, wrapped.
    #[error("Service error: {0}")]
    Service(String),
}

impl From<SignInError> for AuthError {
    fn from(error: SignInError) -> Self {
        match error {
            SignInError::NotAuthorized(message) => AuthError::NotAuthorized(message),
            SignInError::Configuration(message) => AuthError::Configuration(message),
            SignInError::Service(message) => AuthError::Service(message),
            other => AuthError::SignIn(other),
        }
    }
}

/// Failure reported by an identity-provider RPC.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("NotAuthorizedException: {0}")]
    NotAuthorized(String),

    #[error("UserNotFoundException: {0}")]
    UserNotFound(String),

    #[error("CodeMismatchException: {0}")]
    CodeMismatch(String),

    #[error("ExpiredCodeException: {0}")]
    ExpiredCode(String),

    #[error("InvalidParameterException: {0}")]
    InvalidParameter(String),

    #[error("TooManyRequestsException: {0}")]
    Throttled(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{code}: {message}")]
    Service { code: String, message: String },
}

impl ProviderError {
    /// Classify into the sign-in vocabulary.
    ///
    /// Errors the sign-in flow understands map onto their typed variant; anything else
    /// is wrapped into [`SignInError::Service`].
    pub fn into_sign_in_error(self) -> SignInError {
        match self {
            ProviderError::NotAuthorized(message) => SignInError::NotAuthorized(message),
            ProviderError::UserNotFound(message) => SignInError::UserNotFound(message),
            ProviderError::CodeMismatch(message) => SignInError::CodeMismatch(message),
            ProviderError::ExpiredCode(message) => SignInError::CodeExpired(message),
            ProviderError::InvalidParameter(message) => SignInError::InvalidParameter(message),
            other => SignInError::Service(other.to_string()),
        }
    }

    pub fn into_auth_error(self) -> AuthError {
        match self {
            ProviderError::NotAuthorized(message) => AuthError::NotAuthorized(message),
            ProviderError::InvalidParameter(message) => AuthError::Validation(message),
            other => AuthError::Service(other.to_string()),
        }
    }
}

/// A sub-environment could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("user pool is not configured")]
    UserPoolNotConfigured,

    #[error("identity pool is not configured")]
    IdentityPoolNotConfigured,

    #[error("could not construct {client} client: {reason}")]
    ClientConstruction { client: &'static str, reason: String },
}

impl From<EnvironmentError> for SignInError {
    fn from(error: EnvironmentError) -> Self {
        SignInError::Configuration(error.to_string())
    }
}

impl From<EnvironmentError> for AuthError {
    fn from(error: EnvironmentError) -> Self {
        AuthError::Configuration(error.to_string())
    }
}

/// An environment could not be assembled.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("user pool is configured but no user pool client factory was supplied")]
    MissingUserPoolClient,

    #[error("identity pool is configured but no identity pool client factory was supplied")]
    MissingIdentityPoolClient,

    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),
}

/// Configuration could not be parsed or is incomplete.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing or empty field `{0}`")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_domain_errors_stay_typed() {
        let error = ProviderError::CodeMismatch("bad code".into()).into_sign_in_error();
        assert_eq!(error, SignInError::CodeMismatch("bad code".into()));

        let error = ProviderError::NotAuthorized("nope".into()).into_sign_in_error();
        assert_eq!(error, SignInError::NotAuthorized("nope".into()));
    }

    #[test]
    fn other_provider_errors_are_wrapped() {
        let error = ProviderError::Throttled("slow down".into()).into_sign_in_error();
        assert_eq!(
            error,
            SignInError::Service("TooManyRequestsException: slow down".into())
        );

        let error = ProviderError::Service {
            code: "InternalErrorException".into(),
            message: "boom".into(),
        }
        .into_sign_in_error();
        assert!(matches!(error, SignInError::Service(m) if m.contains("boom")));
    }

    #[test]
    fn environment_errors_become_configuration_errors() {
        let error: SignInError = EnvironmentError::UserPoolNotConfigured.into();
        assert_eq!(
            error,
            SignInError::Configuration("user pool is not configured".into())
        );
    }

    #[test]
    fn sign_in_errors_convert_to_auth_errors() {
        assert_eq!(
            AuthError::from(SignInError::Service("x".into())),
            AuthError::Service("x".into())
        );
        assert_eq!(
            AuthError::from(SignInError::CodeExpired("old".into())),
            AuthError::SignIn(SignInError::CodeExpired("old".into()))
        );
    }

    #[test]
    fn auth_error_serializes() {
        let error = AuthError::invalid_state("sign in could not be completed");
        let json = serde_json::to_string(&error).unwrap();
        let back: AuthError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, back);
    }
}
