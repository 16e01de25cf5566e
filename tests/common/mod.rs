//! Shared fixtures for integration tests: scripted provider clients, a recording
//! dispatcher and ready-made auth data.

#![allow(dead_code)]

use async_trait::async_trait;
use authflow::auth::config::{AuthConfiguration, IdentityPoolConfig, UserPoolConfig};
use authflow::auth::data::{
    AuthFlowType, AwsCredentials, Credentials, DeviceMetadata, SignInMethod, SignedInData,
    UserPoolTokens,
};
use authflow::auth::environment::{
    AssociateSoftwareTokenOutput, AuthResponse, AuthenticationResult, FixedClock,
    IdentityCredentials, IdentityPoolProvider, IdentityProvider, InitiateAuthRequest,
    RespondToAuthChallengeRequest, SoftwareTokenOwner, VerifySoftwareTokenOutput,
    VerifySoftwareTokenRequest,
};
use authflow::auth::{
    AuthEnvironment, AuthEvent, AuthResolver, AuthState, AuthStateMachine, AuthenticationState,
    AuthorizationState, ProviderError,
};
use authflow::engine::{EventDispatcher, StateMachine, StateStream};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("authflow=debug")
        .with_test_writer()
        .try_init();
}

pub fn instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 24, 12, 0, 0).unwrap()
}

/// Queue of canned responses for one provider method.
pub struct Script<T> {
    responses: Mutex<VecDeque<Result<T, ProviderError>>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Script<T> {
    pub fn push(&self, response: Result<T, ProviderError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn next(&self, method: &str) -> Result<T, ProviderError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::Service {
                    code: "Unscripted".into(),
                    message: method.to_string(),
                })
            })
    }
}

/// User-pool client that answers from scripts and records every call.
#[derive(Default)]
pub struct MockProvider {
    pub initiate_auth: Script<AuthResponse>,
    pub respond_to_auth_challenge: Script<AuthResponse>,
    pub associate_software_token: Script<AssociateSoftwareTokenOutput>,
    pub verify_software_token: Script<VerifySoftwareTokenOutput>,
    pub refresh_tokens: Script<AuthenticationResult>,
    pub revoke_token: Script<()>,
    pub global_sign_out: Script<()>,
    calls: Mutex<Vec<&'static str>>,
    challenge_requests: Mutex<Vec<RespondToAuthChallengeRequest>>,
    software_token_owners: Mutex<Vec<SoftwareTokenOwner>>,
    verify_requests: Mutex<Vec<VerifySoftwareTokenRequest>>,
}

impl MockProvider {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn challenge_requests(&self) -> Vec<RespondToAuthChallengeRequest> {
        self.challenge_requests.lock().unwrap().clone()
    }

    pub fn software_token_owners(&self) -> Vec<SoftwareTokenOwner> {
        self.software_token_owners.lock().unwrap().clone()
    }

    pub fn verify_requests(&self) -> Vec<VerifySoftwareTokenRequest> {
        self.verify_requests.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn initiate_auth(
        &self,
        _request: InitiateAuthRequest,
    ) -> Result<AuthResponse, ProviderError> {
        self.record("initiate_auth");
        self.initiate_auth.next("initiate_auth")
    }

    async fn respond_to_auth_challenge(
        &self,
        request: RespondToAuthChallengeRequest,
    ) -> Result<AuthResponse, ProviderError> {
        self.record("respond_to_auth_challenge");
        self.challenge_requests.lock().unwrap().push(request);
        self.respond_to_auth_challenge
            .next("respond_to_auth_challenge")
    }

    async fn associate_software_token(
        &self,
        owner: SoftwareTokenOwner,
    ) -> Result<AssociateSoftwareTokenOutput, ProviderError> {
        self.record("associate_software_token");
        self.software_token_owners.lock().unwrap().push(owner);
        self.associate_software_token
            .next("associate_software_token")
    }

    async fn verify_software_token(
        &self,
        request: VerifySoftwareTokenRequest,
    ) -> Result<VerifySoftwareTokenOutput, ProviderError> {
        self.record("verify_software_token");
        self.verify_requests.lock().unwrap().push(request);
        self.verify_software_token.next("verify_software_token")
    }

    async fn refresh_tokens(
        &self,
        _refresh_token: String,
    ) -> Result<AuthenticationResult, ProviderError> {
        self.record("refresh_tokens");
        self.refresh_tokens.next("refresh_tokens")
    }

    async fn revoke_token(&self, _refresh_token: String) -> Result<(), ProviderError> {
        self.record("revoke_token");
        self.revoke_token.next("revoke_token")
    }

    async fn global_sign_out(&self, _access_token: String) -> Result<(), ProviderError> {
        self.record("global_sign_out");
        self.global_sign_out.next("global_sign_out")
    }
}

#[derive(Default)]
pub struct MockIdentityPool {
    pub fetch_credentials: Script<IdentityCredentials>,
}

#[async_trait]
impl IdentityPoolProvider for MockIdentityPool {
    async fn fetch_credentials(
        &self,
        _tokens: UserPoolTokens,
    ) -> Result<IdentityCredentials, ProviderError> {
        self.fetch_credentials.next("fetch_credentials")
    }
}

/// Dispatcher that only records what actions send.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<AuthEvent>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventDispatcher<AuthEvent> for RecordingDispatcher {
    async fn send(&self, event: AuthEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn user_pool_config() -> UserPoolConfig {
    UserPoolConfig {
        pool_id: "us-east-1_test".into(),
        app_client_id: "client".into(),
        app_client_secret: None,
        region: "us-east-1".into(),
    }
}

/// Environment with a user pool and, when `identity_pool` is given, an identity pool.
pub fn environment(
    provider: &Arc<MockProvider>,
    identity_pool: Option<&Arc<MockIdentityPool>>,
) -> AuthEnvironment {
    let configuration = AuthConfiguration {
        user_pool: Some(user_pool_config()),
        identity_pool: identity_pool.map(|_| IdentityPoolConfig {
            pool_id: "us-east-1:pool".into(),
            region: "us-east-1".into(),
        }),
    };
    let provider = Arc::clone(provider);
    let mut builder = AuthEnvironment::builder()
        .configuration(configuration)
        .clock(FixedClock(instant()))
        .user_pool_client(move || Ok(Arc::clone(&provider) as Arc<dyn IdentityProvider>));
    if let Some(pool) = identity_pool {
        let pool = Arc::clone(pool);
        builder = builder
            .identity_pool_client(move || Ok(Arc::clone(&pool) as Arc<dyn IdentityPoolProvider>));
    }
    builder.build().unwrap()
}

pub fn machine(
    authn: AuthenticationState,
    authz: AuthorizationState,
    environment: AuthEnvironment,
) -> AuthStateMachine {
    StateMachine::new(AuthState::Configured(authn, authz), AuthResolver, environment)
}

pub fn tokens(tag: &str) -> UserPoolTokens {
    UserPoolTokens::new(
        format!("{tag}-id"),
        format!("{tag}-access"),
        format!("{tag}-refresh"),
        None,
        instant(),
    )
}

pub fn signed_in(tag: &str) -> SignedInData {
    SignedInData {
        username: Some("alice".into()),
        signed_in_date: instant(),
        sign_in_method: SignInMethod::ApiBased(AuthFlowType::UserSrp),
        device_metadata: DeviceMetadata::NoData,
        tokens: tokens(tag),
    }
}

pub fn aws_credentials(tag: &str) -> AwsCredentials {
    AwsCredentials {
        access_key_id: format!("{tag}-key"),
        secret_access_key: format!("{tag}-secret"),
        session_token: format!("{tag}-session"),
        expiration: instant() + chrono::Duration::hours(1),
    }
}

pub fn identity(tag: &str) -> IdentityCredentials {
    IdentityCredentials {
        identity_id: format!("{tag}-identity"),
        credentials: aws_credentials(tag),
    }
}

pub fn credentials(tag: &str) -> Credentials {
    Credentials::UserPoolAndIdentityPool {
        tokens: tokens(tag),
        identity_id: format!("{tag}-identity"),
        credentials: aws_credentials(tag),
    }
}

pub fn authenticated(tag: &str) -> AuthResponse {
    AuthResponse::Authenticated(AuthenticationResult {
        id_token: Some(format!("{tag}-id")),
        access_token: Some(format!("{tag}-access")),
        refresh_token: Some(format!("{tag}-refresh")),
        expires_in: None,
    })
}

/// Next state from a listener, failing the test instead of hanging.
pub async fn next_state(states: &mut StateStream<AuthState>) -> Option<AuthState> {
    tokio::time::timeout(Duration::from_secs(2), states.next())
        .await
        .expect("timed out waiting for a state")
}
