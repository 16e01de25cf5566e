//! Generic event-driven runtime.
//!
//! ```text
//! caller / action ── send(event) ──► queue ──► processing loop
//!                                               │ resolve(state, event)
//!                                               ├─► commit state ──► every StateStream
//!                                               └─► spawn action ──► execute(dispatcher, env)
//!                                                                      └─► send(event) ...
//! ```
//!
//! Resolvers decide, actions execute, and nothing but the loop writes the state.

mod action;
mod machine;
mod resolver;
mod stream;

pub use action::{Action, EventDispatcher};
pub use machine::{EnvironmentOf, MachineConfig, StateMachine};
pub use resolver::{MachineEvent, Resolution, Resolver};
pub use stream::StateStream;
