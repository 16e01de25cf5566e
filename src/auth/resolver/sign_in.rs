use super::software_token::SoftwareTokenSetupResolver;
use crate::auth::action::{AssociateSoftwareToken, AuthAction, VerifySignInChallenge};
use crate::auth::data::{AuthChallenge, ChallengeName};
use crate::auth::error::SignInError;
use crate::auth::event::{AuthEvent, SignInEvent};
use crate::auth::state::{SignInState, SoftwareTokenSetupState};
use crate::engine::Resolution;

/// Resolves progress inside `AuthenticationState::SigningIn`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignInResolver;

impl SignInResolver {
    pub fn resolve(
        &self,
        state: &SignInState,
        event: &AuthEvent,
    ) -> Resolution<SignInState, AuthAction> {
        match (state, event) {
            (
                SignInState::ResolvingTotpSetup(setup, context),
                AuthEvent::SetupSoftwareToken(event),
            ) => SoftwareTokenSetupResolver
                .resolve(setup, context, event)
                .map_state(|setup| SignInState::ResolvingTotpSetup(setup, context.clone())),
            (_, AuthEvent::SignIn(event)) => self.resolve_sign_in(state, event),
            _ => Resolution::unchanged(state),
        }
    }

    fn resolve_sign_in(
        &self,
        state: &SignInState,
        event: &SignInEvent,
    ) -> Resolution<SignInState, AuthAction> {
        match (state, event) {
            (_, SignInEvent::ReceivedChallenge(challenge)) if awaits_challenge(state) => {
                received_challenge(challenge)
            }

            (SignInState::ResolvingChallenge(challenge), SignInEvent::ConfirmSignIn { answer }) => {
                Resolution::with_action(
                    SignInState::VerifyingChallenge(challenge.clone()),
                    AuthAction::VerifySignInChallenge(VerifySignInChallenge {
                        challenge: challenge.clone(),
                        answer: answer.clone(),
                    }),
                )
            }

            (SignInState::Error(_), SignInEvent::ThrowAuthError(_)) => Resolution::unchanged(state),

            (
                SignInState::ResolvingTotpSetup(setup, context),
                SignInEvent::ThrowAuthError(error),
            ) => Resolution::to(SignInState::ResolvingTotpSetup(
                setup_failed(setup, error),
                context.clone(),
            )),

            (_, SignInEvent::ThrowAuthError(error)) => {
                Resolution::to(SignInState::Error(error.clone()))
            }

            _ => Resolution::unchanged(state),
        }
    }
}

fn awaits_challenge(state: &SignInState) -> bool {
    matches!(
        state,
        SignInState::SigningInWithPassword(_)
            | SignInState::VerifyingChallenge(_)
            | SignInState::ResolvingTotpSetup(
                SoftwareTokenSetupState::RespondingToAuthChallenge { .. },
                _
            )
    )
}

fn received_challenge(challenge: &AuthChallenge) -> Resolution<SignInState, AuthAction> {
    match challenge.name {
        ChallengeName::MfaSetup => Resolution::with_action(
            SignInState::ResolvingTotpSetup(
                SoftwareTokenSetupState::AssociatingSoftwareToken {
                    session: challenge.session.clone(),
                },
                challenge.context.clone(),
            ),
            AuthAction::AssociateSoftwareToken(AssociateSoftwareToken {
                session: challenge.session.clone(),
            }),
        ),
        _ => Resolution::to(SignInState::ResolvingChallenge(challenge.clone())),
    }
}

/// Keeps the association while one exists so the user can retry the code.
fn setup_failed(setup: &SoftwareTokenSetupState, error: &SignInError) -> SoftwareTokenSetupState {
    let association = match setup {
        SoftwareTokenSetupState::WaitingForAnswer(data)
        | SoftwareTokenSetupState::Verifying(data, _) => Some(data.clone()),
        SoftwareTokenSetupState::Error(association, _) => association.clone(),
        _ => None,
    };
    SoftwareTokenSetupState::Error(association, error.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::data::{AssociateSoftwareTokenData, AuthFlowType, SignInContext};
    use std::collections::BTreeMap;

    fn context() -> SignInContext {
        SignInContext {
            username: "alice".into(),
            auth_flow: AuthFlowType::UserSrp,
        }
    }

    fn challenge(name: ChallengeName) -> AuthChallenge {
        AuthChallenge {
            name,
            context: context(),
            session: Some("session-1".into()),
            parameters: BTreeMap::new(),
        }
    }

    fn association() -> AssociateSoftwareTokenData {
        AssociateSoftwareTokenData {
            secret_code: "JBSWY3DPEHPK3PXP".into(),
            session: "session-2".into(),
        }
    }

    #[test]
    fn mfa_setup_challenge_starts_association() {
        let state = SignInState::VerifyingChallenge(challenge(ChallengeName::SoftwareTokenMfa));
        let event: AuthEvent =
            SignInEvent::ReceivedChallenge(challenge(ChallengeName::MfaSetup)).into();
        let resolution = SignInResolver.resolve(&state, &event);
        assert_eq!(
            resolution.new_state,
            SignInState::ResolvingTotpSetup(
                SoftwareTokenSetupState::AssociatingSoftwareToken {
                    session: Some("session-1".into())
                },
                context()
            )
        );
        assert_eq!(
            resolution.action,
            Some(AuthAction::AssociateSoftwareToken(AssociateSoftwareToken {
                session: Some("session-1".into())
            }))
        );
    }

    #[test]
    fn other_challenges_wait_for_an_answer() {
        let state = SignInState::SigningInWithPassword(crate::auth::data::SignInEventData {
            username: "alice".into(),
            password: "pw".into(),
            auth_flow: AuthFlowType::UserSrp,
        });
        let event: AuthEvent =
            SignInEvent::ReceivedChallenge(challenge(ChallengeName::SoftwareTokenMfa)).into();
        let resolution = SignInResolver.resolve(&state, &event);
        assert_eq!(
            resolution.new_state,
            SignInState::ResolvingChallenge(challenge(ChallengeName::SoftwareTokenMfa))
        );
        assert!(resolution.action.is_none());
    }

    #[test]
    fn confirm_sends_answer_for_verification() {
        let state = SignInState::ResolvingChallenge(challenge(ChallengeName::SoftwareTokenMfa));
        let event: AuthEvent = SignInEvent::ConfirmSignIn {
            answer: "123456".into(),
        }
        .into();
        let resolution = SignInResolver.resolve(&state, &event);
        assert!(matches!(resolution.new_state, SignInState::VerifyingChallenge(_)));
        let Some(AuthAction::VerifySignInChallenge(VerifySignInChallenge { answer, .. })) =
            resolution.action
        else {
            panic!("expected a challenge verification");
        };
        assert_eq!(answer, "123456");
    }

    #[test]
    fn totp_error_keeps_the_association() {
        let state = SignInState::ResolvingTotpSetup(
            SoftwareTokenSetupState::Verifying(association(), "000000".into()),
            context(),
        );
        let error = SignInError::CodeMismatch("wrong code".into());
        let event: AuthEvent = SignInEvent::ThrowAuthError(error.clone()).into();
        let resolution = SignInResolver.resolve(&state, &event);
        assert_eq!(
            resolution.new_state,
            SignInState::ResolvingTotpSetup(
                SoftwareTokenSetupState::Error(Some(association()), error),
                context()
            )
        );
    }

    #[test]
    fn errors_elsewhere_fail_the_sign_in() {
        let state = SignInState::ResolvingChallenge(challenge(ChallengeName::SoftwareTokenMfa));
        let error = SignInError::Service("boom".into());
        let event: AuthEvent = SignInEvent::ThrowAuthError(error.clone()).into();
        let resolution = SignInResolver.resolve(&state, &event);
        assert_eq!(resolution.new_state, SignInState::Error(error));
    }

    #[test]
    fn confirm_outside_a_challenge_is_ignored() {
        let state = SignInState::Error(SignInError::Service("boom".into()));
        let event: AuthEvent = SignInEvent::ConfirmSignIn {
            answer: "1".into(),
        }
        .into();
        assert_eq!(
            SignInResolver.resolve(&state, &event),
            Resolution::unchanged(&state)
        );
    }
}
