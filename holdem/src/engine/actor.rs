//! Engine actor: the single consumer that owns a [`GameEngine`].

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Duration, Instant, MissedTickBehavior, interval},
};
use uuid::Uuid;

use super::{
    errors::EngineError,
    messages::{EngineEvent, EngineMessage, EngineResponse, StateChangeNotification},
    room::GameEngine,
};
use crate::game::entities::{Action, Chips, GameSnapshot, PlayerId, SeatIndex};

/// Engine handle for enqueueing events. Cheap to clone; every clone feeds
/// the same queue.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineMessage>,
    shutdown: Arc<watch::Sender<bool>>,
    room_id: Uuid,
}

impl EngineHandle {
    pub(crate) fn new(
        sender: mpsc::Sender<EngineMessage>,
        shutdown: Arc<watch::Sender<bool>>,
        room_id: Uuid,
    ) -> Self {
        Self {
            sender,
            shutdown,
            room_id,
        }
    }

    #[must_use]
    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    /// Enqueue a message without waiting. Never blocks: a full queue is
    /// reported as [`EngineError::QueueFull`].
    fn enqueue(&self, message: EngineMessage) -> Result<(), EngineError> {
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EngineError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => EngineError::EngineStopped,
        })
    }

    /// Enqueue an event and return immediately.
    pub fn submit(&self, event: EngineEvent) -> Result<(), EngineError> {
        self.enqueue(EngineMessage::Event(event))
    }

    /// Enqueue an event and wait for the engine's verdict on it.
    pub async fn request(&self, event: EngineEvent) -> Result<EngineResponse, EngineError> {
        let (response, rx) = oneshot::channel();
        self.enqueue(EngineMessage::Request { event, response })?;
        rx.await.map_err(|_| EngineError::EngineStopped)
    }

    pub fn player_join(
        &self,
        seat: SeatIndex,
        id: PlayerId,
        name: &str,
        chips: Option<Chips>,
    ) -> Result<(), EngineError> {
        self.submit(EngineEvent::PlayerJoined {
            seat,
            id,
            name: name.to_string(),
            chips,
        })
    }

    pub fn player_leave(&self, seat: SeatIndex) -> Result<(), EngineError> {
        self.submit(EngineEvent::PlayerLeft { seat })
    }

    pub fn ready(&self) -> Result<(), EngineError> {
        self.submit(EngineEvent::Ready)
    }

    pub fn start_game(&self) -> Result<(), EngineError> {
        self.submit(EngineEvent::StartGame)
    }

    pub fn player_action(&self, seat: SeatIndex, action: Action) -> Result<(), EngineError> {
        self.submit(EngineEvent::PlayerActed { seat, action })
    }

    /// Parses an action off the wire and enqueues it. Malformed input is
    /// rejected here and never reaches the engine.
    pub fn player_action_wire(
        &self,
        seat: SeatIndex,
        kind: &str,
        amount: Option<i64>,
    ) -> Result<(), EngineError> {
        let action = Action::from_wire(kind, amount)?;
        self.player_action(seat, action)
    }

    /// The public view of the room.
    pub async fn snapshot(&self) -> Result<Arc<GameSnapshot>, EngineError> {
        self.query_snapshot(None).await
    }

    /// The room as seen from `seat`, including its hole cards.
    pub async fn snapshot_for(&self, seat: SeatIndex) -> Result<Arc<GameSnapshot>, EngineError> {
        self.query_snapshot(Some(seat)).await
    }

    async fn query_snapshot(
        &self,
        viewer: Option<SeatIndex>,
    ) -> Result<Arc<GameSnapshot>, EngineError> {
        let (response, rx) = oneshot::channel();
        self.enqueue(EngineMessage::GetSnapshot { viewer, response })?;
        rx.await.map_err(|_| EngineError::EngineStopped)
    }

    /// Registers a subscriber and returns its notification stream. A slow
    /// subscriber misses notifications once `capacity` are buffered.
    pub fn subscribe(
        &self,
        id: u64,
        capacity: usize,
    ) -> Result<mpsc::Receiver<StateChangeNotification>, EngineError> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        self.enqueue(EngineMessage::Subscribe { id, sender })?;
        Ok(receiver)
    }

    pub fn unsubscribe(&self, id: u64) -> Result<(), EngineError> {
        self.enqueue(EngineMessage::Unsubscribe { id })
    }

    /// Stops the consumer loop. Events still queued are discarded.
    pub fn stop_engine(&self) {
        if self.shutdown.send(true).is_err() {
            debug!("room {} already stopped", self.room_id);
        }
    }
}

/// Engine actor owning the engine state
pub struct EngineActor {
    engine: GameEngine,

    /// Message inbox
    inbox: mpsc::Receiver<EngineMessage>,

    shutdown: watch::Receiver<bool>,
}

impl EngineActor {
    pub(crate) fn new(
        engine: GameEngine,
        inbox: mpsc::Receiver<EngineMessage>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            inbox,
            shutdown,
        }
    }

    /// Run the engine event loop until stopped or every handle is dropped.
    /// Returns the engine so its final state can be inspected.
    pub async fn run(mut self) -> GameEngine {
        info!(
            "room {} '{}' starting",
            self.engine.id(),
            self.engine.config().name
        );
        self.engine.step();

        // Checks the action clock.
        let mut tick_interval = interval(Duration::from_secs(1));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }

                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => break,
                    }
                }

                _ = tick_interval.tick() => {
                    self.engine.on_tick(Instant::now());
                }
            }
        }

        let dropped = self.inbox.len();
        if dropped > 0 {
            warn!("room {}: discarding {dropped} queued events", self.engine.id());
        }
        info!("room {} stopped", self.engine.id());
        self.engine
    }

    fn handle_message(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::Event(event) => {
                self.engine.handle(event);
            }

            EngineMessage::Request { event, response } => {
                let result = self.engine.handle(event);
                let _ = response.send(result);
            }

            EngineMessage::GetSnapshot { viewer, response } => {
                let _ = response.send(Arc::new(self.engine.snapshot(viewer)));
            }

            EngineMessage::Subscribe { id, sender } => {
                self.engine.subscribe(id, sender);
            }

            EngineMessage::Unsubscribe { id } => {
                self.engine.unsubscribe(id);
                debug!("room {}: {id} unsubscribed", self.engine.id());
            }
        }
    }
}
