use crate::auth::action::{AuthAction, CompleteTotpSetup, VerifySoftwareTokenSetup};
use crate::auth::data::SignInContext;
use crate::auth::event::SetupSoftwareTokenEvent;
use crate::auth::state::SoftwareTokenSetupState;
use crate::engine::Resolution;

/// Resolves software-token enrollment.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareTokenSetupResolver;

impl SoftwareTokenSetupResolver {
    pub fn resolve(
        &self,
        state: &SoftwareTokenSetupState,
        context: &SignInContext,
        event: &SetupSoftwareTokenEvent,
    ) -> Resolution<SoftwareTokenSetupState, AuthAction> {
        use SoftwareTokenSetupState as Setup;

        match (state, event) {
            (
                Setup::AssociatingSoftwareToken { .. },
                SetupSoftwareTokenEvent::WaitForAnswer(data),
            ) => Resolution::to(Setup::WaitingForAnswer(data.clone())),

            (
                Setup::WaitingForAnswer(data) | Setup::Error(Some(data), _),
                SetupSoftwareTokenEvent::VerifyChallengeAnswer { code },
            ) => Resolution::with_action(
                Setup::Verifying(data.clone(), code.clone()),
                AuthAction::VerifySoftwareTokenSetup(VerifySoftwareTokenSetup {
                    data: data.clone(),
                    code: code.clone(),
                }),
            ),

            (Setup::Verifying(..), SetupSoftwareTokenEvent::RespondToAuthChallenge { session }) => {
                Resolution::with_action(
                    Setup::RespondingToAuthChallenge {
                        session: session.clone(),
                    },
                    AuthAction::CompleteTotpSetup(CompleteTotpSetup {
                        context: context.clone(),
                        session: session.clone(),
                    }),
                )
            }

            _ => Resolution::unchanged(state),
        }
    }
}
