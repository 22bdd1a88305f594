//! The room state machine.
//!
//! [`GameEngine::handle`] is the only way state changes. The actor calls it
//! for every queued event; synchronous callers such as tests
//! call it directly through the `&mut` wrappers below.

use log::{debug, info, warn};
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::Instant,
};
use uuid::Uuid;

use super::{
    actor::{EngineActor, EngineHandle},
    config::{ConfigError, EngineConfig},
    errors::EnginePhase,
    messages::{EngineEvent, EngineResponse, StateChangeNotification},
    states::{
        EngineState, Room, RoomState, WaitForNextRound, WaitForPlayerActions, WaitForPlayers,
    },
};
use crate::game::{
    Game, GameError, Table,
    entities::{Action, Chips, GameSnapshot, Player, PlayerId, SeatIndex},
};

#[derive(Debug)]
pub struct GameEngine {
    id: Uuid,
    config: EngineConfig,
    state: EngineState,
    subscribers: HashMap<u64, mpsc::Sender<StateChangeNotification>>,
    /// Seats to clear once the current hand ends.
    pending_removals: BTreeSet<SeatIndex>,
    /// Seat on the clock, the prompt that put it there and when.
    turn_started: Option<(SeatIndex, u64, Instant)>,
}

impl GameEngine {
    /// Creates an engine in the `RoomCreated` phase.
    ///
    /// # Errors
    ///
    /// Returns error if `config` fails validation.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = Table::new(config.max_players);
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            state: Room::new(table).into(),
            subscribers: HashMap::new(),
            pending_removals: BTreeSet::new(),
            turn_started: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> EnginePhase {
        self.state.phase()
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        self.state.table()
    }

    #[must_use]
    pub fn game(&self) -> Option<&Game> {
        self.state.game()
    }

    #[must_use]
    pub fn snapshot(&self, viewer: Option<SeatIndex>) -> GameSnapshot {
        self.state.snapshot(viewer)
    }

    /// Advances out of `RoomCreated`. Other phases only move on events.
    pub fn step(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            EngineState::RoomCreated(room) => {
                info!("room {} '{}' open for players", self.id, self.config.name);
                Room::<WaitForPlayers>::from(room).into()
            }
            state => state,
        };
    }

    /// Applies one event. Subscribers are notified after every successful
    /// transition; rejected events leave the state untouched.
    pub fn handle(&mut self, event: EngineEvent) -> EngineResponse {
        if self.phase() == EnginePhase::RoomCreated {
            self.step();
        }
        debug!("room {}: {event:?}", self.id);

        let player_list_changed = matches!(
            event,
            EngineEvent::PlayerJoined { .. } | EngineEvent::PlayerLeft { .. }
        );
        let state = std::mem::take(&mut self.state);
        let (state, response) = self.dispatch(state, event);
        self.state = state;

        if let Some(game) = self.state_game_mut() {
            for event in game.drain_events() {
                debug!("{event}");
            }
        }
        self.track_turn();

        match &response {
            EngineResponse::Success => {
                let snapshot = Arc::new(self.snapshot(None));
                let notification = if player_list_changed {
                    StateChangeNotification::PlayerListChanged(snapshot)
                } else if self.phase() == EnginePhase::WaitForNextRound {
                    StateChangeNotification::HandFinished(snapshot)
                } else {
                    StateChangeNotification::StateChanged(snapshot)
                };
                self.notify_state_change(notification);
            }
            rejected => warn!(
                "room {}: event dropped: {}",
                self.id,
                rejected.error_message().unwrap_or_default()
            ),
        }
        response
    }

    fn dispatch(&mut self, state: EngineState, event: EngineEvent) -> (EngineState, EngineResponse) {
        match (state, event) {
            (
                mut state,
                EngineEvent::PlayerJoined {
                    seat,
                    id,
                    name,
                    chips,
                },
            ) => {
                let response = self.seat_player(state.table_mut(), seat, id, &name, chips);
                (state, response)
            }

            (EngineState::WaitForPlayerActions(mut room), EngineEvent::PlayerLeft { seat }) => {
                if room.table.player(seat).is_none() {
                    let error = GameError::SeatEmpty(seat).to_string();
                    return (room.into(), EngineResponse::Error(error));
                }
                let result = room.state.game.forfeit(&mut room.table, seat);
                self.pending_removals.insert(seat);
                let response = respond(result);
                (self.after_action(room), response)
            }

            (mut state, EngineEvent::PlayerLeft { seat }) => {
                let response = match state.table_mut().remove_player(seat) {
                    Ok(player) => {
                        info!("{} left the table with ${}", player.name, player.chips);
                        EngineResponse::Success
                    }
                    Err(e) => EngineResponse::Error(e.to_string()),
                };
                (state, response)
            }

            (
                EngineState::WaitForPlayers(mut room),
                EngineEvent::Ready | EngineEvent::StartGame,
            ) => {
                let mut game = room
                    .state
                    .game
                    .take()
                    .unwrap_or_else(|| Game::new(self.config.game_settings()));
                match game.start_hand(&mut room.table) {
                    Ok(()) => (self.after_action(room.deal(game)), EngineResponse::Success),
                    Err(e) => {
                        room.state.game = Some(game);
                        (room.into(), respond(Err(e)))
                    }
                }
            }

            (EngineState::WaitForNextRound(room), EngineEvent::StartGame) => {
                let mut room = Room::<WaitForPlayerActions>::from(room);
                match room.state.game.start_hand(&mut room.table) {
                    Ok(()) => (self.after_action(room), EngineResponse::Success),
                    Err(e) => {
                        info!("room {}: can't deal the next hand ({e})", self.id);
                        let room = Room::<WaitForNextRound>::from(room);
                        (Room::<WaitForPlayers>::from(room).into(), respond(Err(e)))
                    }
                }
            }

            (
                EngineState::WaitForPlayerActions(mut room),
                EngineEvent::PlayerActed { seat, action },
            ) => {
                let result = room.state.game.handle_actions(&mut room.table, seat, action);
                let response = respond(result);
                (self.after_action(room), response)
            }

            (EngineState::WaitForPlayerActions(mut room), EngineEvent::TimedOut { seat }) => {
                let Some(action) = room.state.game.timeout_action(&room.table, seat) else {
                    return (room.into(), EngineResponse::NotYourTurn);
                };
                info!("room {}: seat {seat} timed out, auto-{action}", self.id);
                let result = room.state.game.handle_actions(&mut room.table, seat, action);
                let response = respond(result);
                (self.after_action(room), response)
            }

            (state, _) => {
                let phase = state.phase();
                (state, EngineResponse::WrongPhase(phase))
            }
        }
    }

    fn seat_player(
        &self,
        table: &mut Table,
        seat: SeatIndex,
        id: PlayerId,
        name: &str,
        chips: Option<Chips>,
    ) -> EngineResponse {
        if table.seat_of(id).is_some() {
            warn!("player {id} is already seated");
            return EngineResponse::SeatTaken(seat);
        }
        let chips = chips.unwrap_or(self.config.starting_stack);
        match table.add_player(seat, Player::new(id, name, chips)) {
            Ok(()) => {
                info!("{name} joined room {} at seat {seat}", self.id);
                EngineResponse::Success
            }
            Err(GameError::SeatOccupied(seat)) => EngineResponse::SeatTaken(seat),
            Err(e) => EngineResponse::Error(e.to_string()),
        }
    }

    /// Leaves the betting phase once the hand is over and clears any seats
    /// whose players left during it.
    fn after_action(
        &mut self,
        mut room: Room<WaitForPlayerActions>,
    ) -> EngineState {
        if !room.state.game.is_hand_over() {
            return room.into();
        }
        for seat in std::mem::take(&mut self.pending_removals) {
            match room.table.remove_player(seat) {
                Ok(player) => info!("{} left the table with ${}", player.name, player.chips),
                Err(e) => warn!("removing seat {seat} after the hand: {e}"),
            }
        }
        info!(
            "room {}: hand #{} finished",
            self.id,
            room.state.game.hand_number()
        );
        Room::<WaitForNextRound>::from(room).into()
    }

    fn state_game_mut(&mut self) -> Option<&mut Game> {
        match &mut self.state {
            EngineState::WaitForPlayerActions(room) => Some(&mut room.state.game),
            EngineState::WaitForNextRound(room) => Some(&mut room.state.game),
            EngineState::WaitForPlayers(room) => room.state.game.as_mut(),
            EngineState::RoomCreated(_) => None,
        }
    }

    /// Restarts the action clock for every new prompt, including a seat
    /// that closes one round and opens the next.
    fn track_turn(&mut self) {
        let turn = self
            .game()
            .and_then(|game| Some((game.to_act()?, game.prompt_count())));
        match (turn, self.turn_started) {
            (Some(turn), Some((seat, prompt, _))) if turn == (seat, prompt) => {}
            (Some((seat, prompt)), _) => {
                self.turn_started = Some((seat, prompt, Instant::now()));
            }
            (None, _) => self.turn_started = None,
        }
    }

    /// The seat whose action clock has run out at `now`, if any.
    #[must_use]
    pub fn overdue_actor(&self, now: Instant) -> Option<SeatIndex> {
        let timeout = self.config.action_timeout()?;
        let (seat, _, since) = self.turn_started?;
        (now.duration_since(since) >= timeout).then_some(seat)
    }

    /// Issues a timeout for the seat on the clock, if it's overdue.
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(seat) = self.overdue_actor(now) {
            self.handle(EngineEvent::TimedOut { seat });
        }
    }

    pub fn subscribe(&mut self, id: u64, sender: mpsc::Sender<StateChangeNotification>) {
        self.subscribers.insert(id, sender);
        debug!("subscriber {id} added to room {}", self.id);
    }

    pub fn unsubscribe(&mut self, id: u64) {
        self.subscribers.remove(&id);
        debug!("subscriber {id} removed from room {}", self.id);
    }

    /// Broadcast state change notification to all subscribers
    fn notify_state_change(&mut self, notification: StateChangeNotification) {
        self.subscribers.retain(|id, sender| {
            match sender.try_send(notification.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("subscriber {id} channel full, dropping notification");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("subscriber {id} disconnected, removing");
                    false
                }
            }
        });
    }

    pub fn player_join(
        &mut self,
        seat: SeatIndex,
        id: PlayerId,
        name: &str,
        chips: Option<Chips>,
    ) -> EngineResponse {
        self.handle(EngineEvent::PlayerJoined {
            seat,
            id,
            name: name.to_string(),
            chips,
        })
    }

    pub fn player_leave(&mut self, seat: SeatIndex) -> EngineResponse {
        self.handle(EngineEvent::PlayerLeft { seat })
    }

    pub fn ready(&mut self) -> EngineResponse {
        self.handle(EngineEvent::Ready)
    }

    pub fn start_game(&mut self) -> EngineResponse {
        self.handle(EngineEvent::StartGame)
    }

    pub fn player_action(&mut self, seat: SeatIndex, action: Action) -> EngineResponse {
        self.handle(EngineEvent::PlayerActed { seat, action })
    }

    /// Moves the engine onto its own task and returns a handle to it. The
    /// task hands the engine back when it stops.
    #[must_use]
    pub fn start_engine(self) -> (JoinHandle<GameEngine>, EngineHandle) {
        let (sender, inbox) = mpsc::channel(self.config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = EngineHandle::new(sender, Arc::new(shutdown_tx), self.id);
        let actor = EngineActor::new(self, inbox, shutdown_rx);
        (tokio::spawn(actor.run()), handle)
    }
}

fn respond(result: Result<(), GameError>) -> EngineResponse {
    match result {
        Ok(()) => EngineResponse::Success,
        Err(GameError::OutOfTurnAction) => EngineResponse::NotYourTurn,
        Err(GameError::NotEnoughPlayers) => EngineResponse::NotEnoughPlayers,
        Err(GameError::HandNotInProgress) => {
            EngineResponse::WrongPhase(EnginePhase::WaitForNextRound)
        }
        Err(e) if e.is_structural() => EngineResponse::Error(e.to_string()),
        Err(e) => EngineResponse::InvalidAction(e.to_string()),
    }
}
