//! Authenticator enrollment for users who are already signed in.

mod common;

use authflow::auth::data::{SignedInData, SignedOutData, UserPoolTokens};
use authflow::auth::environment::{
    AssociateSoftwareTokenOutput, SoftwareTokenOwner, VerifySoftwareTokenOutput,
    VerifySoftwareTokenRequest,
};
use authflow::auth::task::{AssociateSoftwareTokenTask, VerifySoftwareTokenTask};
use authflow::auth::{
    AuthError, AuthState, AuthStateMachine, AuthenticationState, AuthorizationState,
    ProviderError, SignInError,
};
use common::*;
use std::sync::Arc;

fn signed_in_machine(provider: &Arc<MockProvider>) -> AuthStateMachine {
    machine(
        AuthenticationState::SignedIn(signed_in("a")),
        AuthorizationState::SessionEstablished(credentials("a")),
        environment(provider, None),
    )
}

#[tokio::test]
async fn signed_in_user_enrolls_an_authenticator() {
    init_tracing();
    let provider = Arc::new(MockProvider::default());
    provider
        .associate_software_token
        .push(Ok(AssociateSoftwareTokenOutput {
            session: None,
            secret_code: Some("SECRET".into()),
        }));
    provider
        .verify_software_token
        .push(Ok(VerifySoftwareTokenOutput { session: None }));
    let machine = signed_in_machine(&provider);
    let before = machine.current_state();

    let details = AssociateSoftwareTokenTask::new(machine.clone())
        .execute()
        .await
        .unwrap();
    assert_eq!(details.secret_code, "SECRET");
    assert_eq!(details.username.as_deref(), Some("alice"));

    VerifySoftwareTokenTask::new("123456", machine.clone())
        .with_friendly_device_name("phone")
        .execute()
        .await
        .unwrap();

    assert_eq!(
        provider.software_token_owners(),
        vec![SoftwareTokenOwner::AccessToken("a-access".into())]
    );
    assert_eq!(
        provider.verify_requests(),
        vec![VerifySoftwareTokenRequest {
            owner: SoftwareTokenOwner::AccessToken("a-access".into()),
            user_code: "123456".into(),
            friendly_device_name: Some("phone".into()),
        }]
    );
    assert_eq!(machine.current_state(), before);
    assert!(machine.history().is_empty());
}

#[tokio::test]
async fn wrong_code_keeps_its_classification() {
    let provider = Arc::new(MockProvider::default());
    provider
        .verify_software_token
        .push(Err(ProviderError::CodeMismatch("wrong code".into())));
    let machine = signed_in_machine(&provider);

    let error = VerifySoftwareTokenTask::new("000000", machine)
        .execute()
        .await
        .unwrap_err();
    assert_eq!(
        error,
        AuthError::SignIn(SignInError::CodeMismatch("wrong code".into()))
    );
}

#[tokio::test]
async fn association_without_a_secret_is_rejected() {
    let provider = Arc::new(MockProvider::default());
    provider
        .associate_software_token
        .push(Ok(AssociateSoftwareTokenOutput::default()));

    let error = AssociateSoftwareTokenTask::new(signed_in_machine(&provider))
        .execute()
        .await
        .unwrap_err();
    assert_eq!(
        error,
        AuthError::Service("Unable to retrieve associate software token response".into())
    );
}

#[tokio::test]
async fn signed_out_user_cannot_enroll() {
    let provider = Arc::new(MockProvider::default());
    let machine = machine(
        AuthenticationState::SignedOut(SignedOutData::default()),
        AuthorizationState::Configured,
        environment(&provider, None),
    );

    let error = AssociateSoftwareTokenTask::new(machine.clone())
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(error, AuthError::InvalidState { .. }), "{error:?}");

    let error = VerifySoftwareTokenTask::new("123456", machine)
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(error, AuthError::InvalidState { .. }), "{error:?}");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn expired_access_token_is_not_sent() {
    let provider = Arc::new(MockProvider::default());
    let expired = SignedInData {
        tokens: UserPoolTokens::new("a-id", "a-access", "a-refresh", Some(0), instant()),
        ..signed_in("a")
    };
    let machine = machine(
        AuthenticationState::SignedInWithTokens(expired),
        AuthorizationState::SessionEstablished(credentials("a")),
        environment(&provider, None),
    );

    let error = AssociateSoftwareTokenTask::new(machine)
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(error, AuthError::SessionExpired(_)), "{error:?}");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn empty_code_is_rejected_before_any_call() {
    let provider = Arc::new(MockProvider::default());
    let machine = signed_in_machine(&provider);

    let error = VerifySoftwareTokenTask::new("  ", machine.clone())
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(error, AuthError::Validation(_)));
    assert!(provider.calls().is_empty());
    assert!(matches!(machine.current_state(), AuthState::Configured(..)));
}
