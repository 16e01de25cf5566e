//! Pure building blocks shared by the engine and the auth domain:
//! - the `State` trait implemented by every snapshot type
//! - `Guard` predicates over states
//! - bounded transition history

mod guard;
mod history;
mod state;

pub use guard::Guard;
pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
pub use state::State;
