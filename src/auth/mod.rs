//! Authentication and authorization as one event-driven state machine.
//!
//! The composite [`AuthState`] pairs who the user is ([`AuthenticationState`]) with what
//! they may access ([`AuthorizationState`]). [`AuthResolver`] decides transitions,
//! [`AuthAction`]s talk to the identity provider through an [`AuthEnvironment`], and
//! the tasks in [`task`] drive whole flows for callers.
//!
//! # Example
//!
//! ```rust
//! use authflow::auth::event::{AuthEvent, ConfigureData};
//! use authflow::auth::{auth_state_machine, AuthEnvironment, AuthState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let environment = AuthEnvironment::builder().build().expect("empty configuration is valid");
//! let machine = auth_state_machine(environment);
//! machine.send(AuthEvent::Configure(ConfigureData::default())).await;
//!
//! assert!(matches!(machine.current_state(), AuthState::Configured(..)));
//! # }
//! ```

pub mod action;
pub mod config;
pub mod data;
pub mod environment;
pub mod error;
pub mod event;
pub mod resolver;
pub mod state;
pub mod task;

pub use action::AuthAction;
pub use config::{AuthConfiguration, IdentityPoolConfig, UserPoolConfig};
pub use environment::AuthEnvironment;
pub use error::{AuthError, EnvironmentError, ProviderError, SignInError};
pub use event::AuthEvent;
pub use resolver::AuthResolver;
pub use state::{
    AuthState, AuthenticationState, AuthorizationState, SignInState, SoftwareTokenSetupState,
};

use crate::engine::{MachineConfig, StateMachine};

/// The state machine behind every auth task.
pub type AuthStateMachine = StateMachine<AuthResolver>;

/// Start an auth machine in [`AuthState::NotConfigured`].
///
/// # Panics
///
/// Must be called from within a Tokio runtime.
pub fn auth_state_machine(environment: AuthEnvironment) -> AuthStateMachine {
    StateMachine::new(AuthState::NotConfigured, AuthResolver, environment)
}

/// Like [`auth_state_machine`], with explicit engine tunables.
pub fn auth_state_machine_with_config(
    environment: AuthEnvironment,
    config: MachineConfig,
) -> AuthStateMachine {
    StateMachine::with_config(AuthState::NotConfigured, AuthResolver, environment, config)
}
