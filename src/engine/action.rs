//! Asynchronous side effects and the dispatcher they report through.

use super::resolver::MachineEvent;
use async_trait::async_trait;
use std::fmt::Debug;

/// Ingress side of a state machine.
#[async_trait]
pub trait EventDispatcher<E: MachineEvent>: Send + Sync {
    /// Hand an event to the machine. Returns once the event has been processed and any
    /// resulting action scheduled, or immediately if the machine has stopped.
    async fn send(&self, event: E);
}

/// A unit of asynchronous work bound to a transition.
///
/// Actions never return a value and never fail: every outcome, including failure to
/// resolve the capabilities they need, is reported as events through the dispatcher.
#[async_trait]
pub trait Action: Debug + Send + Sync + 'static {
    type Event: MachineEvent;
    type Environment: Send + Sync + 'static;

    fn identifier(&self) -> &'static str;

    async fn execute(
        &self,
        dispatcher: &dyn EventDispatcher<Self::Event>,
        environment: &Self::Environment,
    );
}
