//! Authflow: an event-driven authentication state machine
//!
//! Authflow keeps a "pure core, imperative shell" split. Resolvers are pure functions
//! from `(state, event)` to `(state, action?)`; actions perform the network calls and
//! report back with more events; one processing loop owns the state and publishes
//! every committed snapshot to any number of listeners.
//!
//! # Core Concepts
//!
//! - **State**: immutable snapshots implementing the [`State`] trait
//! - **Resolver**: total, side-effect free transition function
//! - **Action**: asynchronous side effect bound to a transition
//! - **Task**: caller-facing operation that sends an event and awaits a terminal state
//!
//! # Example
//!
//! ```rust
//! use authflow::auth::event::{AuthEvent, AuthenticationEvent, ConfigureData};
//! use authflow::auth::{auth_state_machine, AuthEnvironment, AuthenticationState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let machine = auth_state_machine(AuthEnvironment::builder().build().unwrap());
//! let mut states = machine.listen();
//!
//! machine.send(AuthEvent::Configure(ConfigureData::default())).await;
//! // Events that mean nothing in the current state are ignored and publish nothing.
//! machine.send(AuthenticationEvent::CancelSignIn.into()).await;
//!
//! let configured = states.next().await.unwrap();
//! assert_eq!(
//!     configured.authentication(),
//!     Some(&AuthenticationState::NotConfigured)
//! );
//! assert!(states.try_next().is_none());
//! # }
//! ```

pub mod auth;
pub mod checkpoint;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use crate::core::{Guard, State, StateHistory, StateTransition};
pub use crate::engine::{Action, EventDispatcher, MachineEvent, Resolution, Resolver, StateMachine};
