//! The state machine: one authoritative state, one processing loop.

use super::action::{Action, EventDispatcher};
use super::resolver::{MachineEvent, Resolution, Resolver};
use super::stream::StateStream;
use crate::core::{State, StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

/// Environment type consumed by a resolver's actions.
pub type EnvironmentOf<R> = <<R as Resolver>::Action as Action>::Environment;

/// Tunables for a [`StateMachine`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Number of committed transitions kept for diagnostics.
    pub history_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

enum Command<E> {
    Process {
        event: E,
        processed: oneshot::Sender<()>,
    },
    Shutdown,
}

struct Shared<S: State> {
    current: S,
    history: StateHistory<S>,
    sequence: u64,
    subscribers: Vec<mpsc::UnboundedSender<S>>,
    running: bool,
}

impl<S: State> Shared<S> {
    fn commit(&mut self, next: S, event: &'static str) {
        self.sequence += 1;
        let previous = std::mem::replace(&mut self.current, next.clone());
        self.history = std::mem::take(&mut self.history).record(StateTransition {
            from: previous,
            to: next.clone(),
            event: event.to_string(),
            sequence: self.sequence,
            timestamp: Utc::now(),
        });
        // Closed subscriptions are pruned on the way.
        self.subscribers
            .retain(|subscriber| subscriber.send(next.clone()).is_ok());
    }

    fn close(&mut self) {
        self.running = false;
        self.subscribers.clear();
    }
}

fn lock<S: State>(shared: &Mutex<Shared<S>>) -> MutexGuard<'_, Shared<S>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn dispatch<E: MachineEvent>(commands: &mpsc::UnboundedSender<Command<E>>, event: E) {
    let identifier = event.identifier();
    let (processed, done) = oneshot::channel();
    if commands.send(Command::Process { event, processed }).is_err() {
        warn!(event = identifier, "State machine stopped, dropping event");
        return;
    }
    if done.await.is_err() {
        warn!(event = identifier, "State machine stopped before processing event");
    }
}

/// Cloneable handle to a running state machine.
///
/// Every write to the state happens on a single processing loop, so commits are
/// linearizable. Readers get snapshots via [`current_state`](Self::current_state) or a
/// stream of commits via [`listen`](Self::listen).
pub struct StateMachine<R: Resolver> {
    commands: mpsc::UnboundedSender<Command<R::Event>>,
    shared: Arc<Mutex<Shared<R::State>>>,
    environment: Arc<EnvironmentOf<R>>,
}

impl<R: Resolver> Clone for StateMachine<R> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            shared: Arc::clone(&self.shared),
            environment: Arc::clone(&self.environment),
        }
    }
}

impl<R: Resolver> StateMachine<R> {
    /// Start a machine in `initial` with the default configuration.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime; the processing loop is spawned onto it.
    pub fn new(initial: R::State, resolver: R, environment: EnvironmentOf<R>) -> Self {
        Self::with_config(initial, resolver, environment, MachineConfig::default())
    }

    /// Start a machine with explicit tunables.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_config(
        initial: R::State,
        resolver: R,
        environment: EnvironmentOf<R>,
        config: MachineConfig,
    ) -> Self {
        let history = StateHistory::with_capacity(config.history_capacity);
        Self::start(initial, history, resolver, environment)
    }

    /// Start a machine that continues from a previously captured state and history.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn resume(
        current: R::State,
        history: StateHistory<R::State>,
        resolver: R,
        environment: EnvironmentOf<R>,
    ) -> Self {
        Self::start(current, history, resolver, environment)
    }

    fn start(
        initial: R::State,
        history: StateHistory<R::State>,
        resolver: R,
        environment: EnvironmentOf<R>,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let sequence = history.last().map_or(0, |transition| transition.sequence);
        let shared = Arc::new(Mutex::new(Shared {
            current: initial,
            history,
            sequence,
            subscribers: Vec::new(),
            running: true,
        }));
        let environment = Arc::new(environment);

        let processor = Processor {
            resolver,
            environment: Arc::clone(&environment),
            shared: Arc::clone(&shared),
            commands: commands.downgrade(),
            receiver,
        };
        tokio::spawn(processor.run());

        Self {
            commands,
            shared,
            environment,
        }
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> R::State {
        lock(&self.shared).current.clone()
    }

    /// Send an event and wait until it has been processed.
    ///
    /// Actions scheduled by the transition keep running after this returns.
    pub async fn send(&self, event: R::Event) {
        dispatch(&self.commands, event).await;
    }

    /// Subscribe to every state committed from now on.
    ///
    /// On a stopped machine the returned stream is already finished.
    pub fn listen(&self) -> StateStream<R::State> {
        let (subscriber, receiver) = mpsc::unbounded_channel();
        let mut shared = lock(&self.shared);
        if shared.running {
            shared.subscribers.push(subscriber);
        }
        StateStream::new(receiver)
    }

    /// Current state plus a stream of every state committed after it.
    ///
    /// Both are taken under one lock, so the stream never replays anything the returned
    /// state already reflects.
    pub fn observe(&self) -> (R::State, StateStream<R::State>) {
        let (subscriber, receiver) = mpsc::unbounded_channel();
        let mut shared = lock(&self.shared);
        if shared.running {
            shared.subscribers.push(subscriber);
        }
        (shared.current.clone(), StateStream::new(receiver))
    }

    /// Recently committed transitions, oldest first.
    pub fn history(&self) -> StateHistory<R::State> {
        lock(&self.shared).history.clone()
    }

    /// Current state and history read together.
    pub fn snapshot(&self) -> (R::State, StateHistory<R::State>) {
        let shared = lock(&self.shared);
        (shared.current.clone(), shared.history.clone())
    }

    pub fn environment(&self) -> &EnvironmentOf<R> {
        &self.environment
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).running
    }

    /// Stop processing after the events already queued.
    ///
    /// Listener streams end, later sends are dropped, in-flight actions run to
    /// completion but their events are discarded.
    pub fn shutdown(&self) {
        if self.commands.send(Command::Shutdown).is_err() {
            trace!("State machine already stopped");
        }
    }
}

#[async_trait]
impl<R: Resolver> EventDispatcher<R::Event> for StateMachine<R> {
    async fn send(&self, event: R::Event) {
        dispatch(&self.commands, event).await;
    }
}

/// Dispatcher handed to actions. Holds a sender, so the loop outlives its actions.
struct ActionDispatcher<E> {
    commands: mpsc::UnboundedSender<Command<E>>,
}

#[async_trait]
impl<E: MachineEvent> EventDispatcher<E> for ActionDispatcher<E> {
    async fn send(&self, event: E) {
        dispatch(&self.commands, event).await;
    }
}

struct Processor<R: Resolver> {
    resolver: R,
    environment: Arc<EnvironmentOf<R>>,
    shared: Arc<Mutex<Shared<R::State>>>,
    commands: mpsc::WeakUnboundedSender<Command<R::Event>>,
    receiver: mpsc::UnboundedReceiver<Command<R::Event>>,
}

impl<R: Resolver> Processor<R> {
    async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            match command {
                Command::Process { event, processed } => {
                    self.process(event);
                    // The sender may have stopped waiting.
                    let _ = processed.send(());
                }
                Command::Shutdown => {
                    debug!("State machine shutting down");
                    break;
                }
            }
        }
        lock(&self.shared).close();
    }

    fn process(&self, event: R::Event) {
        let identifier = event.identifier();
        let current = lock(&self.shared).current.clone();
        let Resolution { new_state, action } = self.resolver.resolve(&current, &event);

        if new_state != current {
            debug!(
                event = identifier,
                from = current.name(),
                to = new_state.name(),
                "Committing state"
            );
            lock(&self.shared).commit(new_state, identifier);
        } else {
            trace!(event = identifier, state = current.name(), "Event was a no-op");
        }

        if let Some(action) = action {
            self.schedule(action);
        }
    }

    fn schedule(&self, action: R::Action) {
        let Some(commands) = self.commands.upgrade() else {
            warn!(
                action = action.identifier(),
                "No handles left to report results, skipping action"
            );
            return;
        };
        debug!(action = action.identifier(), "Scheduling action");
        let dispatcher = ActionDispatcher { commands };
        let environment = Arc::clone(&self.environment);
        tokio::spawn(async move {
            action.execute(&dispatcher, environment.as_ref()).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Lamp {
        Off,
        On,
        Blinking,
    }

    impl State for Lamp {
        fn name(&self) -> &str {
            match self {
                Self::Off => "Off",
                Self::On => "On",
                Self::Blinking => "Blinking",
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Switch {
        Toggle,
        Blink,
        Blinked,
        Ignored,
    }

    impl MachineEvent for Switch {
        fn identifier(&self) -> &'static str {
            match self {
                Self::Toggle => "Switch.toggle",
                Self::Blink => "Switch.blink",
                Self::Blinked => "Switch.blinked",
                Self::Ignored => "Switch.ignored",
            }
        }
    }

    #[derive(Default)]
    struct Counter {
        runs: AtomicUsize,
    }

    #[derive(Debug)]
    struct BlinkAction;

    #[async_trait]
    impl Action for BlinkAction {
        type Event = Switch;
        type Environment = Counter;

        fn identifier(&self) -> &'static str {
            "BlinkAction"
        }

        async fn execute(&self, dispatcher: &dyn EventDispatcher<Switch>, environment: &Counter) {
            environment.runs.fetch_add(1, Ordering::SeqCst);
            dispatcher.send(Switch::Blinked).await;
        }
    }

    struct LampResolver;

    impl Resolver for LampResolver {
        type State = Lamp;
        type Event = Switch;
        type Action = BlinkAction;

        fn resolve(&self, state: &Lamp, event: &Switch) -> Resolution<Lamp, BlinkAction> {
            match (state, event) {
                (Lamp::Off, Switch::Toggle) => Resolution::to(Lamp::On),
                (Lamp::On, Switch::Toggle) => Resolution::to(Lamp::Off),
                (Lamp::On, Switch::Blink) => Resolution::with_action(Lamp::Blinking, BlinkAction),
                (Lamp::Blinking, Switch::Blinked) => Resolution::to(Lamp::On),
                _ => Resolution::unchanged(state),
            }
        }
    }

    fn machine() -> StateMachine<LampResolver> {
        StateMachine::new(Lamp::Off, LampResolver, Counter::default())
    }

    async fn next(stream: &mut StateStream<Lamp>) -> Option<Lamp> {
        timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("timed out waiting for state")
    }

    #[tokio::test]
    async fn send_returns_after_processing() {
        let machine = machine();
        assert_eq!(machine.current_state(), Lamp::Off);

        machine.send(Switch::Toggle).await;
        assert_eq!(machine.current_state(), Lamp::On);
    }

    #[tokio::test]
    async fn listeners_see_commits_in_order() {
        let machine = machine();
        let mut states = machine.listen();

        machine.send(Switch::Toggle).await;
        machine.send(Switch::Toggle).await;
        machine.send(Switch::Toggle).await;

        assert_eq!(next(&mut states).await, Some(Lamp::On));
        assert_eq!(next(&mut states).await, Some(Lamp::Off));
        assert_eq!(next(&mut states).await, Some(Lamp::On));
    }

    #[tokio::test]
    async fn observe_starts_after_the_returned_state() {
        let machine = machine();
        let mut early = machine.listen();
        machine.send(Switch::Toggle).await;
        machine.send(Switch::Toggle).await;

        let (current, mut states) = machine.observe();
        assert_eq!(current, Lamp::Off);
        assert!(states.try_next().is_none());
        assert_eq!(next(&mut early).await, Some(Lamp::On));

        machine.send(Switch::Toggle).await;
        assert_eq!(next(&mut states).await, Some(Lamp::On));

        machine.shutdown();
        assert_eq!(next(&mut states).await, None);
        let (_, mut late) = machine.observe();
        assert_eq!(next(&mut late).await, None);
    }

    #[tokio::test]
    async fn no_op_events_are_not_published() {
        let machine = machine();
        let mut states = machine.listen();

        machine.send(Switch::Ignored).await;
        machine.send(Switch::Blinked).await;
        assert_eq!(machine.current_state(), Lamp::Off);
        assert!(states.try_next().is_none());

        machine.send(Switch::Toggle).await;
        assert_eq!(next(&mut states).await, Some(Lamp::On));
        assert_eq!(machine.history().len(), 1);
    }

    #[tokio::test]
    async fn every_listener_sees_the_same_sequence() {
        let machine = machine();
        let mut first = machine.listen();
        let mut second = machine.listen();

        machine.send(Switch::Toggle).await;
        machine.send(Switch::Toggle).await;

        for stream in [&mut first, &mut second] {
            assert_eq!(next(stream).await, Some(Lamp::On));
            assert_eq!(next(stream).await, Some(Lamp::Off));
        }
    }

    #[tokio::test]
    async fn late_listener_only_sees_later_commits() {
        let machine = machine();
        machine.send(Switch::Toggle).await;

        let mut states = machine.listen();
        machine.send(Switch::Toggle).await;
        assert_eq!(next(&mut states).await, Some(Lamp::Off));
    }

    #[tokio::test]
    async fn actions_report_back_through_events() {
        let machine = machine();
        let mut states = machine.listen();

        machine.send(Switch::Toggle).await;
        machine.send(Switch::Blink).await;

        assert_eq!(next(&mut states).await, Some(Lamp::On));
        assert_eq!(next(&mut states).await, Some(Lamp::Blinking));
        assert_eq!(next(&mut states).await, Some(Lamp::On));
        assert_eq!(machine.environment().runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn history_records_event_identifiers() {
        let machine = machine();
        machine.send(Switch::Toggle).await;
        machine.send(Switch::Toggle).await;

        let history = machine.history();
        let events: Vec<&str> = history.transitions().map(|t| t.event.as_str()).collect();
        assert_eq!(events, vec!["Switch.toggle", "Switch.toggle"]);
        let sequences: Vec<u64> = history.transitions().map(|t| t.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[tokio::test]
    async fn history_respects_configured_capacity() {
        let machine = StateMachine::with_config(
            Lamp::Off,
            LampResolver,
            Counter::default(),
            MachineConfig {
                history_capacity: 2,
            },
        );
        for _ in 0..5 {
            machine.send(Switch::Toggle).await;
        }
        assert_eq!(machine.history().len(), 2);
    }

    #[tokio::test]
    async fn shutdown_ends_streams_and_drops_events() {
        let machine = machine();
        let mut states = machine.listen();

        machine.send(Switch::Toggle).await;
        machine.shutdown();

        assert_eq!(next(&mut states).await, Some(Lamp::On));
        assert_eq!(next(&mut states).await, None);

        timeout(Duration::from_secs(1), machine.send(Switch::Toggle))
            .await
            .expect("send after shutdown must not hang");
        assert_eq!(machine.current_state(), Lamp::On);
        assert!(!machine.is_running());

        let mut late = machine.listen();
        assert_eq!(next(&mut late).await, None);
    }

    #[tokio::test]
    async fn resumed_machine_continues_the_sequence() {
        let machine = machine();
        machine.send(Switch::Toggle).await;
        machine.send(Switch::Toggle).await;
        let (state, history) = machine.snapshot();
        machine.shutdown();

        let resumed = StateMachine::resume(state, history, LampResolver, Counter::default());
        resumed.send(Switch::Toggle).await;

        assert_eq!(resumed.current_state(), Lamp::On);
        let sequences: Vec<u64> = resumed.history().transitions().map(|t| t.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn machine_config_defaults_when_fields_missing() {
        let config: MachineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
    }
}
