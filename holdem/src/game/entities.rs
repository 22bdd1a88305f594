use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap, HashSet},
    fmt,
    hash::{Hash, Hasher},
    mem::discriminant,
};

use super::{
    constants::{self, ACE, JACK, KING, QUEEN},
    errors::GameError,
    functional::Rank,
    hand::Hand,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Club, Self::Spade, Self::Diamond, Self::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Card rank. Deuce is 2 and the ace is always 14; the wheel straight is
/// special-cased by the evaluator.
pub type Value = u8;

/// A card is a tuple of a value (2..=14) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            ACE => "A".to_string(),
            KING => "K".to_string(),
            QUEEN => "Q".to_string(),
            JACK => "J".to_string(),
            v => v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

/// A 52-card deck dealt from the top through a cursor.
///
/// The cursor only moves forward between shuffles, so a card can't be dealt
/// twice within one shuffle.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    dealt: usize,
}

impl Default for Deck {
    fn default() -> Self {
        let cards = (2..=ACE)
            .flat_map(|value| Suit::ALL.into_iter().map(move |suit| Card(value, suit)))
            .collect();
        Self { cards, dealt: 0 }
    }
}

impl Deck {
    /// A deck that deals `cards` in order. Used for replaying hands.
    #[must_use]
    pub fn stacked(cards: Vec<Card>) -> Self {
        Self { cards, dealt: 0 }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.dealt = 0;
    }

    /// Moves the top `at` cards to the bottom. Only valid before the first
    /// card of a shuffle is dealt.
    pub fn cut(&mut self, at: usize) {
        if self.dealt != 0 {
            log::warn!("refusing to cut a deck with {} cards already dealt", self.dealt);
            return;
        }
        if !self.cards.is_empty() {
            let len = self.cards.len();
            self.cards.rotate_left(at % len);
        }
    }

    pub fn deal_card(&mut self) -> Result<Card, GameError> {
        let card = *self.cards.get(self.dealt).ok_or(GameError::DeckExhausted)?;
        self.dealt += 1;
        Ok(card)
    }

    pub fn burn(&mut self) -> Result<(), GameError> {
        self.deal_card().map(|_| ())
    }

    #[must_use]
    pub fn dealt(&self) -> usize {
        self.dealt
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.dealt
    }
}

/// Type alias for whole chips. Stacks and bets never go negative.
pub type Chips = u32;

/// Stable seat identifier; turn order comes from modulo arithmetic over the
/// table's slot count, never from iteration order.
pub type SeatIndex = usize;

pub type PlayerId = u64;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let username: String = s
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .take(constants::MAX_NAME_LENGTH)
            .collect();
        Self(username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}/{}", self.small, self.big)
    }
}

/// Where a seated player is in the hand lifecycle.
///
/// `Playing`, `SmallBlind` and `BigBlind` mean the player still contests the
/// hand and owes an action this betting round. `Checked`, `Called` and
/// `Raised` mean they've acted and are waiting for the round to close or be
/// re-opened by a raise.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum PlayerStatus {
    /// Seated but not dealt into the current hand.
    Active,
    /// Seated without enough chips to play.
    SatOut,
    Playing,
    SmallBlind,
    BigBlind,
    WaitForAct,
    Checked,
    Called,
    Raised,
    AllIn,
    Folded,
}

/// Statuses that still owe an action in the current betting round.
pub const NEEDS_TO_ACT: &[PlayerStatus] = &[
    PlayerStatus::Playing,
    PlayerStatus::SmallBlind,
    PlayerStatus::BigBlind,
];

/// Statuses of players who can still make decisions this hand.
pub const CAN_ACT: &[PlayerStatus] = &[
    PlayerStatus::Playing,
    PlayerStatus::SmallBlind,
    PlayerStatus::BigBlind,
    PlayerStatus::WaitForAct,
    PlayerStatus::Checked,
    PlayerStatus::Called,
    PlayerStatus::Raised,
];

/// Statuses of players who can still win the pot.
pub const CONTESTING: &[PlayerStatus] = &[
    PlayerStatus::Playing,
    PlayerStatus::SmallBlind,
    PlayerStatus::BigBlind,
    PlayerStatus::WaitForAct,
    PlayerStatus::Checked,
    PlayerStatus::Called,
    PlayerStatus::Raised,
    PlayerStatus::AllIn,
];

impl PlayerStatus {
    #[must_use]
    pub fn is_contesting(self) -> bool {
        CONTESTING.contains(&self)
    }

    #[must_use]
    pub fn can_act(self) -> bool {
        CAN_ACT.contains(&self)
    }

    /// The transition table for player statuses. Every status change goes
    /// through [`Player::set_status`], which consults this.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use PlayerStatus::*;
        match (self, next) {
            (from, to) if from == to => true,
            (_, Active) => true,
            (Active, Playing | SatOut) => true,
            (SatOut, Playing) => true,
            (Playing, SmallBlind | BigBlind | WaitForAct | AllIn | Folded) => true,
            (SmallBlind | BigBlind, Playing | WaitForAct | AllIn | Folded) => true,
            (WaitForAct, Checked | Called | Raised | AllIn | Folded) => true,
            (Checked | Called | Raised, Playing | Folded) => true,
            // Leaving mid-hand forfeits an all-in player's claim.
            (AllIn, Folded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Active => "active",
            Self::SatOut => "sat out",
            Self::Playing => "playing",
            Self::SmallBlind => "small blind",
            Self::BigBlind => "big blind",
            Self::WaitForAct => "to act",
            Self::Checked => "check",
            Self::Called => "call",
            Self::Raised => "raise",
            Self::AllIn => "all-in",
            Self::Folded => "folded",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: Username,
    pub seat: SeatIndex,
    pub chips: Chips,
    /// Chips put in during the current betting round.
    pub current_bet: Chips,
    pub hand: Hand,
    pub suggestions: ActionChoices,
    status: PlayerStatus,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<Username>, chips: Chips) -> Self {
        Self {
            id,
            name: name.into(),
            seat: 0,
            chips,
            current_bet: 0,
            hand: Hand::default(),
            suggestions: ActionChoices::default(),
            status: PlayerStatus::Active,
        }
    }

    #[must_use]
    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn set_status(&mut self, next: PlayerStatus) -> Result<(), GameError> {
        if !self.status.can_transition_to(next) {
            log::error!(
                "seat {} ({}): illegal status transition {} -> {}",
                self.seat,
                self.name,
                self.status,
                next
            );
            return Err(GameError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn receive_card(&mut self, card: Card) -> Result<(), GameError> {
        self.hand.receive(card)
    }

    /// Moves up to `amount` chips from the stack into the current bet and
    /// returns how much was actually paid.
    pub fn bet(&mut self, amount: Chips) -> Chips {
        let paid = amount.min(self.chips);
        self.chips -= paid;
        self.current_bet += paid;
        paid
    }

    pub fn award(&mut self, amount: Chips) {
        self.chips += amount;
    }

    /// Clears everything tied to the previous hand.
    pub fn reset(&mut self) {
        self.status = PlayerStatus::Active;
        self.hand.reset();
        self.current_bet = 0;
        self.suggestions.clear();
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    AllIn,
    Call,
    Check,
    Fold,
    /// Raise by this many chips on top of the call. `None` is a minimum raise.
    Raise(Option<Chips>),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AllIn => write!(f, "all-ins"),
            Self::Call => write!(f, "calls"),
            Self::Check => write!(f, "checks"),
            Self::Fold => write!(f, "folds"),
            Self::Raise(Some(amount)) => write!(f, "raises ${amount}"),
            Self::Raise(None) => write!(f, "min-raises"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub enum ActionChoice {
    AllIn,
    /// Chips needed to call.
    Call(Chips),
    Check,
    Fold,
    /// Minimum raise increment on top of the call.
    Raise(Chips),
}

impl ActionChoice {
    fn index(self) -> usize {
        match self {
            Self::AllIn => 0,
            Self::Call(_) => 1,
            Self::Check => 2,
            Self::Fold => 3,
            Self::Raise(_) => 4,
        }
    }
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "all-in".to_string(),
            Self::Call(amount) => format!("call (== ${amount})"),
            Self::Check => "check".to_string(),
            Self::Fold => "fold".to_string(),
            Self::Raise(amount) => format!("raise (>= ${amount})"),
        };
        write!(f, "{repr}")
    }
}

// Choices compare by variant only. The amounts are informational; bet sizing
// is validated when the action is applied.
impl Eq for ActionChoice {}

impl Hash for ActionChoice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
    }
}

impl PartialEq for ActionChoice {
    fn eq(&self, other: &Self) -> bool {
        discriminant(self) == discriminant(other)
    }
}

impl Ord for ActionChoice {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index().cmp(&other.index())
    }
}

impl PartialOrd for ActionChoice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&Action> for ActionChoice {
    fn from(value: &Action) -> Self {
        match value {
            Action::AllIn => Self::AllIn,
            Action::Call => Self::Call(0),
            Action::Check => Self::Check,
            Action::Fold => Self::Fold,
            Action::Raise(_) => Self::Raise(0),
        }
    }
}

/// The legal actions offered to the seat whose turn it is.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionChoices(pub BTreeSet<ActionChoice>);

impl ActionChoices {
    #[must_use]
    pub fn contains(&self, action: &Action) -> bool {
        self.0.contains(&ActionChoice::from(action))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionChoice> {
        self.0.iter()
    }
}

impl fmt::Display for ActionChoices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let choices: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        match choices.split_last() {
            None => Ok(()),
            Some((last, [])) => write!(f, "{last}"),
            Some((last, rest)) => write!(f, "{}, or {last}", rest.join(", ")),
        }
    }
}

impl<I> From<I> for ActionChoices
where
    I: IntoIterator<Item = ActionChoice>,
{
    fn from(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Betting rounds of a single hand, in order.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Round {
    #[default]
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Round {
    /// The round that follows this one; `None` once the hand is at showdown.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::PreFlop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => Some(Self::Showdown),
            Self::Showdown => None,
        }
    }

    /// Community cards revealed when entering this round.
    #[must_use]
    pub fn cards_to_reveal(self) -> usize {
        match self {
            Self::Flop => 3,
            Self::Turn | Self::River => 1,
            Self::PreFlop | Self::Showdown => 0,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}

/// A finished hand's pot, kept for the hand history.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PotRecord {
    pub hand_number: u64,
    pub total: Chips,
    pub archived_at: DateTime<Utc>,
}

/// One layer of the pot and the seats that can win it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SidePot {
    pub amount: Chips,
    pub eligible: Vec<SeatIndex>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pot {
    total: Chips,
    // Map seat indices to their investment in the pot this hand.
    contributions: HashMap<SeatIndex, Chips>,
    history: Vec<PotRecord>,
}

impl Pot {
    pub fn add(&mut self, seat: SeatIndex, amount: Chips) {
        if amount == 0 {
            return;
        }
        *self.contributions.entry(seat).or_default() += amount;
        self.total += amount;
    }

    #[must_use]
    pub fn total(&self) -> Chips {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    #[must_use]
    pub fn contribution(&self, seat: SeatIndex) -> Chips {
        self.contributions.get(&seat).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn history(&self) -> &[PotRecord] {
        &self.history
    }

    /// Archives the current total into the history and zeroes the pot.
    pub fn reset_pot(&mut self, hand_number: u64) -> Chips {
        let total = self.total;
        self.history.push(PotRecord {
            hand_number,
            total,
            archived_at: Utc::now(),
        });
        self.total = 0;
        self.contributions.clear();
        total
    }

    /// Empties the pot without archiving and hands back every seat's
    /// contribution so it can be refunded.
    pub fn drain_contributions(&mut self) -> Vec<(SeatIndex, Chips)> {
        self.total = 0;
        let mut refunds: Vec<_> = self.contributions.drain().collect();
        refunds.sort_unstable();
        refunds
    }

    /// Splits the pot into layers by contribution level.
    ///
    /// Every contributor pays into each layer up to their contribution, but
    /// only `contenders` can win a layer. A layer nobody can win is merged into
    /// the layer below it.
    #[must_use]
    pub fn side_pots(&self, contenders: &HashSet<SeatIndex>) -> Vec<SidePot> {
        let mut levels: Vec<Chips> = self
            .contributions
            .iter()
            .filter(|(seat, _)| contenders.contains(seat))
            .map(|(_, &amount)| amount)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut pots: Vec<SidePot> = Vec::with_capacity(levels.len());
        let mut previous = 0;
        for (i, &level) in levels.iter().enumerate() {
            // The top layer also sweeps up anything folded players put in
            // above the highest contender.
            let ceiling = if i + 1 == levels.len() {
                Chips::MAX
            } else {
                level
            };
            let amount = self
                .contributions
                .values()
                .map(|&c| c.min(ceiling).saturating_sub(previous))
                .sum();
            let mut eligible: Vec<SeatIndex> = self
                .contributions
                .iter()
                .filter(|(seat, c)| **c >= level && contenders.contains(seat))
                .map(|(&seat, _)| seat)
                .collect();
            eligible.sort_unstable();
            previous = level;
            if amount > 0 {
                pots.push(SidePot { amount, eligible });
            }
        }
        pots
    }
}

/// Things that happened during a hand, drained by the engine for logging.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    HandStarted { hand_number: u64, dealer: SeatIndex },
    BlindPosted { seat: SeatIndex, amount: Chips },
    Acted { seat: SeatIndex, action: Action, paid: Chips },
    RoundStarted(Round),
    PotAwarded { seat: SeatIndex, amount: Chips },
    HandAborted(GameError),
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandStarted {
                hand_number,
                dealer,
            } => write!(f, "hand #{hand_number} started, button on seat {dealer}"),
            Self::BlindPosted { seat, amount } => write!(f, "seat {seat} posts ${amount}"),
            Self::Acted { seat, action, paid } => write!(f, "seat {seat} {action} (${paid})"),
            Self::RoundStarted(round) => write!(f, "{round}"),
            Self::PotAwarded { seat, amount } => write!(f, "seat {seat} won ${amount}"),
            Self::HandAborted(error) => write!(f, "hand aborted: {error}"),
        }
    }
}

/// What one seat looks like to a viewer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatView {
    pub seat: SeatIndex,
    pub id: PlayerId,
    pub name: Username,
    pub chips: Chips,
    pub current_bet: Chips,
    pub status: PlayerStatus,
    pub suggestions: Vec<ActionChoice>,
    /// Hole cards, only present for the viewer's own seat or at showdown.
    pub cards: Option<Vec<Card>>,
    pub rank: Option<Rank>,
}

/// Serializable state handed to the transport after every transition.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub hand_number: u64,
    pub round: Option<Round>,
    pub pot: Chips,
    pub current_bet: Chips,
    pub min_raise: Chips,
    pub community: Vec<Card>,
    pub button: Option<SeatIndex>,
    pub to_act: Option<SeatIndex>,
    pub hand_over: bool,
    pub seats: Vec<SeatView>,
}

impl GameSnapshot {
    #[must_use]
    pub fn seat(&self, seat: SeatIndex) -> Option<&SeatView> {
        self.seats.iter().find(|view| view.seat == seat)
    }

    /// Sum of every seat's stack plus the pot.
    #[must_use]
    pub fn total_chips(&self) -> u64 {
        self.seats.iter().map(|s| u64::from(s.chips)).sum::<u64>() + u64::from(self.pot)
    }
}
