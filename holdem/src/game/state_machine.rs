//! One hand of hold'em from blinds to showdown.
//!
//! [`Game`] owns the per-hand state (deck, board, pot, betting) while the
//! [`Table`] it's handed owns the players. Every entry point validates before
//! mutating, so a rejected action leaves both untouched. Structural failures
//! (deck exhaustion, an illegal status transition) abort the hand and refund
//! every contribution.

use log::{debug, error, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashSet, VecDeque},
    iter,
};

use super::{
    constants::{BOARD_SIZE, DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, HOLE_CARDS},
    entities::{
        Action, ActionChoice, ActionChoices, Blinds, Card, Chips, Deck, GameEvent, GameSnapshot,
        NEEDS_TO_ACT, Player, PlayerStatus, Pot, Round, SeatIndex, SeatView,
    },
    errors::GameError,
    functional::{self, HandStrength},
    table::{ButtonPositions, Table},
};

/// Stakes and RNG configuration for a run of hands.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Players below this stack sit out.
    pub min_stack: Chips,
    /// Fixed seed for reproducible deals.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            min_stack: DEFAULT_BIG_BLIND,
            seed: None,
        }
    }
}

impl GameSettings {
    #[must_use]
    pub fn blinds(&self) -> Blinds {
        Blinds {
            small: self.small_blind,
            big: self.big_blind,
        }
    }
}

/// Per-hand state, rebuilt by [`Game::reset_for_new_game`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameState {
    pub round: Round,
    /// Highest total wager in the current betting round.
    pub current_bet: Chips,
    /// Smallest legal raise increment; the last raise size, initially the
    /// big blind.
    pub min_raise: Chips,
    /// Players who can still win the pot.
    pub contesting: usize,
    pub button: Option<SeatIndex>,
    pub community: Vec<Card>,
    pub pot: Pot,
    pub to_act: Option<SeatIndex>,
    pub hand_over: bool,
    /// Whether the hand reached a showdown and hole cards are public.
    pub revealed: bool,
}

/// A validated action, sized against the actor's stack.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Wager {
    Fold,
    Check,
    Call(Chips),
    Raise { total: Chips, raise_by: Chips },
    AllIn,
}

#[derive(Debug)]
pub struct Game {
    settings: GameSettings,
    state: GameState,
    deck: Deck,
    rng: StdRng,
    hand_number: u64,
    /// Bumped every time a seat is put on the clock.
    prompts: u64,
    events: VecDeque<GameEvent>,
}

impl Game {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        let rng = settings
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let state = GameState {
            min_raise: settings.big_blind,
            hand_over: true,
            ..Default::default()
        };
        Self {
            settings,
            state,
            deck: Deck::default(),
            rng,
            hand_number: 0,
            prompts: 0,
            events: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    #[must_use]
    pub fn is_hand_over(&self) -> bool {
        self.state.hand_over
    }

    #[must_use]
    pub fn to_act(&self) -> Option<SeatIndex> {
        self.state.to_act
    }

    /// Counts prompts so a seat acting twice in a row gets a fresh turn.
    #[must_use]
    pub fn prompt_count(&self) -> u64 {
        self.prompts
    }

    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clears every player's hand state and rebuilds the per-hand state.
    pub fn prepare_new_game(&mut self, table: &mut Table) {
        for player in table.players_mut() {
            player.reset();
        }
        self.reset_for_new_game();
    }

    /// Rebuilds the per-hand state. The button and the pot history carry over.
    pub fn reset_for_new_game(&mut self) {
        let pot = std::mem::take(&mut self.state.pot);
        if !pot.is_empty() {
            error!("resetting with ${} still in the pot", pot.total());
        }
        self.state = GameState {
            min_raise: self.settings.big_blind,
            button: self.state.button,
            pot,
            hand_over: true,
            ..Default::default()
        };
    }

    /// Zeroes round bets and gives everyone still able to act a fresh turn.
    pub fn reset_for_new_betting_round(&mut self, table: &mut Table) -> Result<(), GameError> {
        self.state.current_bet = 0;
        self.state.min_raise = self.settings.big_blind;
        for player in table.players_mut() {
            player.current_bet = 0;
            if matches!(
                player.status(),
                PlayerStatus::Checked
                    | PlayerStatus::Called
                    | PlayerStatus::Raised
                    | PlayerStatus::SmallBlind
                    | PlayerStatus::BigBlind
            ) {
                player.set_status(PlayerStatus::Playing)?;
            }
        }
        Ok(())
    }

    /// Shuffles and cuts a fresh deck and deals the next hand.
    pub fn start_hand(&mut self, table: &mut Table) -> Result<(), GameError> {
        let mut deck = Deck::default();
        deck.shuffle(&mut self.rng);
        let at = self.rng.random_range(0..deck.remaining());
        deck.cut(at);
        self.start_hand_with_deck(table, deck)
    }

    /// Deals the next hand from `deck` as is.
    pub fn start_hand_with_deck(&mut self, table: &mut Table, deck: Deck) -> Result<(), GameError> {
        self.prepare_new_game(table);
        if !table.check_players_readiness(self.settings.min_stack) {
            return Err(GameError::NotEnoughPlayers);
        }
        for player in table.players_mut() {
            if player.status() == PlayerStatus::Active {
                player.set_status(PlayerStatus::Playing)?;
            }
        }

        let from = self
            .state
            .button
            .unwrap_or_else(|| table.number_of_slots().saturating_sub(1));
        let positions = table
            .determine_next_button_position(from)
            .ok_or_else(|| GameError::InternalStateError("no seat for the button".into()))?;

        self.deck = deck;
        self.hand_number += 1;
        self.state.button = Some(positions.dealer);
        self.state.contesting = table.count_with(|p| p.status() == PlayerStatus::Playing);
        self.state.round = Round::PreFlop;
        self.state.hand_over = false;
        info!(
            "hand #{} starting with {} players, button on seat {}",
            self.hand_number, self.state.contesting, positions.dealer
        );
        self.events.push_back(GameEvent::HandStarted {
            hand_number: self.hand_number,
            dealer: positions.dealer,
        });

        self.guard(table, |game, table| game.deal_preflop(table, positions))
    }

    fn deal_preflop(&mut self, table: &mut Table, positions: ButtonPositions) -> Result<(), GameError> {
        let small = self.post_blind(
            table,
            positions.small_blind,
            self.settings.small_blind,
            PlayerStatus::SmallBlind,
        )?;
        let big = self.post_blind(
            table,
            positions.big_blind,
            self.settings.big_blind,
            PlayerStatus::BigBlind,
        )?;
        self.state.current_bet = small.max(big);
        self.events.push_back(GameEvent::RoundStarted(Round::PreFlop));

        // One card at a time, starting left of the button.
        let order: Vec<SeatIndex> = table
            .seats_after(positions.dealer)
            .chain(iter::once(positions.dealer))
            .filter(|&seat| table.player(seat).is_some_and(|p| p.status().is_contesting()))
            .collect();
        for _ in 0..HOLE_CARDS {
            for &seat in &order {
                let card = self.deck.deal_card()?;
                seat_mut(table, seat)?.receive_card(card)?;
            }
        }

        self.continue_from(table, positions.big_blind)
    }

    fn post_blind(
        &mut self,
        table: &mut Table,
        seat: SeatIndex,
        amount: Chips,
        status: PlayerStatus,
    ) -> Result<Chips, GameError> {
        let player = seat_mut(table, seat)?;
        player.set_status(status)?;
        let paid = player.bet(amount);
        if player.chips == 0 {
            player.set_status(PlayerStatus::AllIn)?;
        }
        debug!("{} posts ${paid}", player.name);
        self.state.pot.add(seat, paid);
        self.events
            .push_back(GameEvent::BlindPosted { seat, amount: paid });
        Ok(paid)
    }

    /// Applies `action` for `seat`. Anything but the prompted seat playing one
    /// of its suggestions is rejected without touching state. A raise the
    /// stack can't cover is played as an all-in even when it isn't offered.
    pub fn handle_actions(
        &mut self,
        table: &mut Table,
        seat: SeatIndex,
        action: Action,
    ) -> Result<(), GameError> {
        if self.state.hand_over {
            return Err(GameError::HandNotInProgress);
        }
        if self.state.to_act != Some(seat) {
            warn!("seat {seat} acted out of turn ({action})");
            return Err(GameError::OutOfTurnAction);
        }
        let player = table.player(seat).ok_or(GameError::SeatEmpty(seat))?;
        if player.status() != PlayerStatus::WaitForAct {
            warn!("seat {seat} is {} and can't act", player.status());
            return Err(GameError::OutOfTurnAction);
        }
        let offered = player.suggestions.contains(&action)
            || (matches!(action, Action::Raise(_)) && player.suggestions.contains(&Action::AllIn));
        if !offered {
            warn!(
                "{} tried to {action}; choices are {}",
                player.name, player.suggestions
            );
            return Err(GameError::InvalidAction);
        }
        let wager = self.resolve(player, &action)?;
        self.guard(table, |game, table| game.act(table, seat, wager, action))
    }

    /// Folds a player who's leaving. A no-op between hands or for seats
    /// that already lost their claim to the pot.
    pub fn forfeit(&mut self, table: &mut Table, seat: SeatIndex) -> Result<(), GameError> {
        if self.state.hand_over {
            return Ok(());
        }
        let status = table
            .player(seat)
            .map(Player::status)
            .ok_or(GameError::SeatEmpty(seat))?;
        if !status.is_contesting() {
            return Ok(());
        }
        if self.state.to_act == Some(seat) {
            return self.guard(table, |game, table| {
                game.act(table, seat, Wager::Fold, Action::Fold)
            });
        }
        self.guard(table, |game, table| {
            seat_mut(table, seat)?.set_status(PlayerStatus::Folded)?;
            game.state.contesting = game.state.contesting.saturating_sub(1);
            game.events.push_back(GameEvent::Acted {
                seat,
                action: Action::Fold,
                paid: 0,
            });
            if game.state.contesting <= 1 {
                game.award_uncontested(table)?;
            }
            Ok(())
        })
    }

    /// The action played on behalf of a seat whose clock ran out.
    #[must_use]
    pub fn timeout_action(&self, table: &Table, seat: SeatIndex) -> Option<Action> {
        if self.state.hand_over || self.state.to_act != Some(seat) {
            return None;
        }
        let player = table.player(seat)?;
        if player.suggestions.contains(&Action::Check) {
            Some(Action::Check)
        } else {
            Some(Action::Fold)
        }
    }

    /// Runs `f`, aborting the hand if it fails structurally.
    fn guard<F>(&mut self, table: &mut Table, f: F) -> Result<(), GameError>
    where
        F: FnOnce(&mut Self, &mut Table) -> Result<(), GameError>,
    {
        let result = f(self, table);
        if let Err(e) = &result {
            if e.is_structural() {
                self.abort_hand(table, e.clone());
            }
        }
        result
    }

    fn resolve(&self, player: &Player, action: &Action) -> Result<Wager, GameError> {
        let to_call = self.state.current_bet.saturating_sub(player.current_bet);
        match action {
            Action::Fold => Ok(Wager::Fold),
            Action::Check if to_call == 0 => Ok(Wager::Check),
            Action::Check => Err(GameError::InvalidAction),
            Action::Call if to_call == 0 => Err(GameError::InvalidAction),
            Action::Call if player.chips <= to_call => Ok(Wager::AllIn),
            Action::Call => Ok(Wager::Call(to_call)),
            Action::Raise(amount) => {
                let raise_by = amount.unwrap_or(self.state.min_raise);
                let total = to_call.saturating_add(raise_by);
                if total >= player.chips {
                    Ok(Wager::AllIn)
                } else if raise_by < self.state.min_raise {
                    Err(GameError::RaiseTooSmall {
                        amount: raise_by,
                        min_raise: self.state.min_raise,
                    })
                } else {
                    Ok(Wager::Raise { total, raise_by })
                }
            }
            Action::AllIn if player.chips == 0 => Err(GameError::InvalidAction),
            Action::AllIn => Ok(Wager::AllIn),
        }
    }

    fn act(
        &mut self,
        table: &mut Table,
        seat: SeatIndex,
        wager: Wager,
        action: Action,
    ) -> Result<(), GameError> {
        let standing_bet = self.state.current_bet;
        let player = seat_mut(table, seat)?;
        let status = match wager {
            Wager::Fold => PlayerStatus::Folded,
            Wager::Check => PlayerStatus::Checked,
            Wager::Call(_) => PlayerStatus::Called,
            Wager::Raise { .. } => PlayerStatus::Raised,
            Wager::AllIn => PlayerStatus::AllIn,
        };
        player.set_status(status)?;
        let paid = match wager {
            Wager::Fold | Wager::Check => 0,
            Wager::Call(amount) => player.bet(amount),
            Wager::Raise { total, .. } => player.bet(total),
            Wager::AllIn => player.bet(player.chips),
        };
        player.suggestions.clear();
        let new_bet = player.current_bet;
        info!("{} {action} (${paid})", player.name);

        self.state.pot.add(seat, paid);
        self.state.to_act = None;
        if status == PlayerStatus::Folded {
            self.state.contesting = self.state.contesting.saturating_sub(1);
        }
        let reopens = match wager {
            Wager::Raise { raise_by, .. } => {
                self.state.min_raise = raise_by;
                true
            }
            Wager::AllIn if new_bet > standing_bet => {
                // A short all-in doesn't shrink the minimum raise.
                self.state.min_raise = self.state.min_raise.max(new_bet - standing_bet);
                true
            }
            _ => false,
        };
        if reopens {
            self.state.current_bet = new_bet;
            reopen_round(table, seat)?;
        }
        self.events.push_back(GameEvent::Acted { seat, action, paid });

        if self.state.contesting <= 1 {
            return self.award_uncontested(table);
        }
        self.continue_from(table, seat)
    }

    /// The next seat owing an action after `from`. `None` once the round is
    /// settled, including when nobody is left to bet against.
    fn next_actor(&self, table: &Table, from: SeatIndex) -> Option<SeatIndex> {
        let seat = table.find_next_playable_player(from, NEEDS_TO_ACT)?;
        let owes = table
            .player(seat)
            .is_some_and(|p| p.current_bet < self.state.current_bet);
        let able = table.count_with(|p| p.status().can_act());
        (owes || able > 1).then_some(seat)
    }

    fn continue_from(&mut self, table: &mut Table, from: SeatIndex) -> Result<(), GameError> {
        match self.next_actor(table, from) {
            Some(seat) => self.prompt(table, seat),
            None => self.advance_round(table),
        }
    }

    fn prompt(&mut self, table: &mut Table, seat: SeatIndex) -> Result<(), GameError> {
        let (current_bet, min_raise) = (self.state.current_bet, self.state.min_raise);
        let player = seat_mut(table, seat)?;
        let suggestions = suggestions_for(player, current_bet, min_raise);
        player.set_status(PlayerStatus::WaitForAct)?;
        debug!("{} to act: {suggestions}", player.name);
        player.suggestions = suggestions;
        self.state.to_act = Some(seat);
        self.prompts += 1;
        Ok(())
    }

    /// Moves through the remaining rounds until someone has to act. With
    /// nobody able to bet, the board runs out straight to showdown.
    fn advance_round(&mut self, table: &mut Table) -> Result<(), GameError> {
        while let Some(round) = self.state.round.next() {
            self.state.round = round;
            self.reset_for_new_betting_round(table)?;
            self.events.push_back(GameEvent::RoundStarted(round));
            if round == Round::Showdown {
                return self.showdown(table);
            }

            self.deck.burn()?;
            for _ in 0..round.cards_to_reveal() {
                let card = self.deck.deal_card()?;
                self.state.community.push(card);
            }
            debug!("{round}: {}", render_cards(&self.state.community));

            let dealer = self
                .state
                .button
                .ok_or_else(|| GameError::InternalStateError("button not set".into()))?;
            if let Some(seat) = self.next_actor(table, dealer) {
                return self.prompt(table, seat);
            }
        }
        Err(GameError::InternalStateError(
            "advanced past showdown".into(),
        ))
    }

    fn showdown(&mut self, table: &mut Table) -> Result<(), GameError> {
        if self.state.community.len() != BOARD_SIZE {
            return Err(GameError::InternalStateError(format!(
                "showdown with {} community cards",
                self.state.community.len()
            )));
        }
        self.state.revealed = true;
        let mut contenders = HashSet::new();
        for player in table.players_mut() {
            if player.status().is_contesting() {
                let strength = player.hand.evaluate(&self.state.community);
                info!("{} shows {}", player.name, strength);
                contenders.insert(player.seat);
            }
        }

        for side_pot in self.state.pot.side_pots(&contenders) {
            let strengths: Vec<&HandStrength> = side_pot
                .eligible
                .iter()
                .map(|&seat| {
                    table
                        .player(seat)
                        .and_then(|p| p.hand.strength())
                        .ok_or_else(|| {
                            GameError::InternalStateError(format!("seat {seat} has no hand"))
                        })
                })
                .collect::<Result<_, _>>()?;
            let winners: Vec<SeatIndex> = functional::argmax(&strengths)
                .into_iter()
                .map(|i| side_pot.eligible[i])
                .collect();
            self.distribute(table, &winners, side_pot.amount)?;
        }
        self.finish_hand(table);
        Ok(())
    }

    fn award_uncontested(&mut self, table: &mut Table) -> Result<(), GameError> {
        let winner = table
            .players()
            .find(|p| p.status().is_contesting())
            .map(|p| p.seat)
            .ok_or_else(|| GameError::InternalStateError("everyone folded".into()))?;
        let amount = self.state.pot.total();
        self.distribute(table, &[winner], amount)?;
        self.state.round = Round::Showdown;
        self.finish_hand(table);
        Ok(())
    }

    /// Splits `amount` evenly between `winners`. Odd chips go one at a time to
    /// winners in seat order starting left of the button.
    fn distribute(
        &mut self,
        table: &mut Table,
        winners: &[SeatIndex],
        amount: Chips,
    ) -> Result<(), GameError> {
        if winners.is_empty() {
            return Err(GameError::InternalStateError("pot with no winner".into()));
        }
        let n = table.number_of_slots();
        let button = self.state.button.unwrap_or(0) % n.max(1);
        let mut ordered = winners.to_vec();
        ordered.sort_by_key(|&seat| (seat + n - button - 1) % n);

        let share = amount / ordered.len() as Chips;
        let mut remainder = amount % ordered.len() as Chips;
        for seat in ordered {
            let mut won = share;
            if remainder > 0 {
                won += 1;
                remainder -= 1;
            }
            let player = seat_mut(table, seat)?;
            player.award(won);
            info!("{} won ${won}", player.name);
            self.events
                .push_back(GameEvent::PotAwarded { seat, amount: won });
        }
        Ok(())
    }

    fn finish_hand(&mut self, table: &mut Table) {
        let total = self.state.pot.reset_pot(self.hand_number);
        debug!("hand #{} finished, ${total} awarded", self.hand_number);
        self.state.hand_over = true;
        self.state.to_act = None;
        for player in table.players_mut() {
            player.suggestions.clear();
        }
    }

    /// Refunds every contribution and puts everyone back to idle.
    pub fn abort_hand(&mut self, table: &mut Table, reason: GameError) {
        error!("aborting hand #{}: {reason}", self.hand_number);
        for (seat, amount) in self.state.pot.drain_contributions() {
            match table.player_mut(seat) {
                Some(player) => player.award(amount),
                None => error!("can't refund ${amount} to empty seat {seat}"),
            }
        }
        for player in table.players_mut() {
            player.reset();
        }
        self.state.community.clear();
        self.state.current_bet = 0;
        self.state.to_act = None;
        self.state.contesting = 0;
        self.state.hand_over = true;
        self.state.revealed = false;
        self.events.push_back(GameEvent::HandAborted(reason));
    }

    /// The game as seen from `viewer`'s seat. Other players' hole cards are
    /// hidden until a showdown.
    #[must_use]
    pub fn snapshot(&self, table: &Table, viewer: Option<SeatIndex>) -> GameSnapshot {
        GameSnapshot {
            hand_number: self.hand_number,
            round: (self.hand_number > 0).then_some(self.state.round),
            pot: self.state.pot.total(),
            current_bet: self.state.current_bet,
            min_raise: self.state.min_raise,
            community: self.state.community.clone(),
            button: self.state.button,
            to_act: self.state.to_act,
            hand_over: self.state.hand_over,
            seats: seat_views(table, viewer, &self.state.community, self.state.revealed),
        }
    }
}

/// A snapshot of a table with no hand dealt yet.
#[must_use]
pub fn table_snapshot(table: &Table, viewer: Option<SeatIndex>) -> GameSnapshot {
    GameSnapshot {
        hand_over: true,
        seats: seat_views(table, viewer, &[], false),
        ..Default::default()
    }
}

fn seat_views(
    table: &Table,
    viewer: Option<SeatIndex>,
    community: &[Card],
    revealed: bool,
) -> Vec<SeatView> {
    table
        .players()
        .map(|player| {
            let shown = viewer == Some(player.seat)
                || (revealed && player.status().is_contesting());
            let hole = player.hand.hole_cards();
            let cards = (shown && !hole.is_empty()).then(|| hole.to_vec());
            let rank = cards.as_ref().map(|cards| {
                let all: Vec<Card> = cards.iter().chain(community).copied().collect();
                functional::best_of(&all).1.rank
            });
            SeatView {
                seat: player.seat,
                id: player.id,
                name: player.name.clone(),
                chips: player.chips,
                current_bet: player.current_bet,
                status: player.status(),
                suggestions: player.suggestions.iter().copied().collect(),
                cards,
                rank,
            }
        })
        .collect()
}

/// Legal choices for a player facing `current_bet`.
fn suggestions_for(player: &Player, current_bet: Chips, min_raise: Chips) -> ActionChoices {
    let to_call = current_bet.saturating_sub(player.current_bet);
    let mut choices = Vec::with_capacity(4);
    if to_call == 0 {
        choices.push(ActionChoice::Check);
    } else {
        choices.push(ActionChoice::Fold);
        choices.push(ActionChoice::Call(to_call.min(player.chips)));
    }
    if player.chips > to_call.saturating_add(min_raise) {
        choices.push(ActionChoice::Raise(min_raise));
    }
    if player.chips > 0 {
        choices.push(ActionChoice::AllIn);
    }
    ActionChoices::from(choices)
}

/// Gives everyone who already acted this round another turn after a raise.
fn reopen_round(table: &mut Table, raiser: SeatIndex) -> Result<(), GameError> {
    for player in table.players_mut() {
        if player.seat != raiser
            && matches!(
                player.status(),
                PlayerStatus::Checked | PlayerStatus::Called | PlayerStatus::Raised
            )
        {
            player.set_status(PlayerStatus::Playing)?;
        }
    }
    Ok(())
}

fn seat_mut(table: &mut Table, seat: SeatIndex) -> Result<&mut Player, GameError> {
    table.player_mut(seat).ok_or(GameError::SeatEmpty(seat))
}

fn render_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
