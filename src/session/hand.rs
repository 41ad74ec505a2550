use super::Participant;
use super::Player;
use crate::Chips;
use crate::HandId;
use crate::Position;
use crate::action::Legal;
use crate::cards::Card;
use crate::cards::Street;
use crate::protocol::Flag;
use std::collections::BTreeMap;
use tokio::time::Instant;

/// Game-logic faults. Each one arms the fold override rather than
/// aborting anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    SmallBlindMissing,
    HeadsUpDealerMismatch {
        dealer: Position,
        small_blind: Position,
    },
    NoHeroCards,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::SmallBlindMissing => write!(f, "small blind seat unknown"),
            Self::HeadsUpDealerMismatch {
                dealer,
                small_blind,
            } => write!(
                f,
                "heads-up small blind {} is not the dealer {}",
                small_blind, dealer
            ),
            Self::NoHeroCards => write!(f, "hero hole cards missing"),
        }
    }
}

impl std::error::Error for Fault {}

/// The latest action request addressed to the hero.
#[derive(Debug, Clone, Copy)]
pub struct Request {
    /// Backend timestamp, echoed in our reply.
    pub timestamp: i64,
    /// Local receipt.
    pub received: Instant,
}

/// Forced bets seen for the coming hand. Blinds may be echoed before the
/// hand itself is announced, so the table keeps one of these around and
/// hands it over at hand start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forced {
    pub posted: Vec<Position>,
    pub small_blind: Option<Position>,
    /// Chips already taken from table stacks by those posts.
    pub paid: BTreeMap<Position, Chips>,
}

impl Forced {
    pub fn post(&mut self, seat: Position, chips: Chips) {
        if !self.posted.contains(&seat) {
            self.posted.push(seat);
        }
        *self.paid.entry(seat).or_default() += chips;
    }
}

/// Everything known about the hand the hero is playing.
#[derive(Debug, Clone)]
pub struct Hand {
    id: HandId,
    street: Street,
    dealer: Position,
    forced: Forced,
    seats: Vec<Position>,
    participants: BTreeMap<Position, Participant>,
    departed: BTreeMap<Position, Chips>,
    board: Vec<Card>,
    hole: Option<Vec<Card>>,
    shown: BTreeMap<Position, Vec<Card>>,
    legal: Legal,
    awaiting: bool,
    request: Option<Request>,
    fold: bool,
}

impl Hand {
    /// A hand announced by the backend. Participants snapshot the
    /// table's current view of their seats.
    pub fn new(
        id: HandId,
        dealer: Position,
        seats: &[Position],
        players: &BTreeMap<Position, Player>,
    ) -> Self {
        let mut seats = seats.to_vec();
        seats.sort_unstable();
        seats.dedup();
        let participants = seats
            .iter()
            .map(|seat| {
                let player = players.get(seat).cloned().unwrap_or_default();
                (*seat, Participant::from(&player))
            })
            .collect();
        Self {
            id,
            street: Street::None,
            dealer,
            forced: Forced::default(),
            seats,
            participants,
            departed: BTreeMap::new(),
            board: Vec::new(),
            hole: None,
            shown: BTreeMap::new(),
            legal: Legal::default(),
            awaiting: false,
            request: None,
            fold: false,
        }
    }

    /// A hand we attached to midway. Nothing about it is trustworthy,
    /// so it only exists to fold out of.
    pub fn attached(id: HandId) -> Self {
        let mut hand = Self::new(id, 0, &[], &BTreeMap::new());
        hand.arm();
        hand
    }

    pub fn id(&self) -> HandId {
        self.id
    }
    pub fn street(&self) -> Street {
        self.street
    }
    pub fn small_blind(&self) -> Option<Position> {
        self.forced.small_blind
    }
    pub fn posted(&self) -> &[Position] {
        &self.forced.posted
    }
    pub fn board(&self) -> &[Card] {
        &self.board
    }
    pub fn hole(&self) -> Option<&[Card]> {
        self.hole.as_deref()
    }
    pub fn shown(&self) -> &BTreeMap<Position, Vec<Card>> {
        &self.shown
    }
    pub fn legal(&self) -> &Legal {
        &self.legal
    }
    pub fn request(&self) -> Option<Request> {
        self.request
    }
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }
    pub fn is_armed(&self) -> bool {
        self.fold
    }
    pub fn participant(&self, seat: Position) -> Option<&Participant> {
        self.participants.get(&seat)
    }
    pub fn is_participant(&self, seat: Position) -> bool {
        self.participants.contains_key(&seat)
    }

    pub fn advance(&mut self, street: Street) {
        self.street = street;
    }
    pub fn set_dealer(&mut self, dealer: Position) {
        self.dealer = dealer;
    }

    /// Takes over forced bets collected before the hand was announced.
    /// Participant snapshots were taken after those chips left the table,
    /// so they are credited back to the starting stacks.
    pub fn absorb(&mut self, forced: Forced) {
        for seat in forced.posted {
            let chips = forced.paid.get(&seat).copied().unwrap_or_default();
            if let Some(participant) = self.participants.get_mut(&seat) {
                participant.stack += chips;
            }
            self.forced.post(seat, chips);
        }
        if forced.small_blind.is_some() {
            self.forced.small_blind = forced.small_blind;
        }
    }
    pub fn post(&mut self, seat: Position, chips: Chips) {
        self.forced.post(seat, chips);
    }
    pub fn mark_small_blind(&mut self, seat: Position) {
        self.forced.small_blind = Some(seat);
    }

    /// Returns false if the seat is not in this hand.
    pub fn restack(&mut self, seat: Position, stack: Chips) -> bool {
        match self.participants.get_mut(&seat) {
            Some(participant) => {
                participant.current = stack;
                true
            }
            None => false,
        }
    }
    /// Drops a seat from the live participants. It still appears in
    /// showdown accounting as an original participant.
    pub fn remove(&mut self, seat: Position) {
        if let Some(participant) = self.participants.remove(&seat) {
            self.departed.insert(seat, participant.contributed());
        }
    }
    /// The hero's cards are dealt once per hand; later deals are ignored.
    pub fn deal(&mut self, hero: Position, cards: Vec<Card>) -> bool {
        if self.hole.is_some() {
            return false;
        }
        if let Some(participant) = self.participants.get_mut(&hero) {
            participant.cards = Some(cards.clone());
        }
        self.hole = Some(cards);
        true
    }
    pub fn lay(&mut self, cards: &[Card]) {
        self.board.extend_from_slice(cards);
    }
    pub fn show(&mut self, seat: Position, cards: Vec<Card>) {
        if let Some(participant) = self.participants.get_mut(&seat) {
            participant.cards = Some(cards.clone());
            self.shown.insert(seat, cards);
        }
    }

    /// A fresh action request for the hero replaces whatever came before.
    pub fn ask(&mut self, legal: Legal, timestamp: i64) {
        self.legal = legal;
        self.awaiting = true;
        self.request = Some(Request {
            timestamp,
            received: Instant::now(),
        });
    }
    /// The hero acted, by our hand or its own.
    pub fn acted(&mut self) {
        self.awaiting = false;
    }

    pub fn arm(&mut self) {
        self.fold = true;
    }
    /// Consumes the fold override if it is armed and the current
    /// request lets the hero fold or call.
    pub fn disarm(&mut self) -> bool {
        let ready = self.fold
            && self.awaiting
            && (self.legal.contains(Flag::Fold) || self.legal.contains(Flag::Call));
        if ready {
            self.fold = false;
        }
        ready
    }

    /// Heads-up play requires the dealer to post the small blind.
    pub fn check_heads_up(&self, dealt: usize) -> Result<(), Fault> {
        match self.forced.small_blind {
            Some(small_blind) if dealt == 2 && small_blind != self.dealer => {
                Err(Fault::HeadsUpDealerMismatch {
                    dealer: self.dealer,
                    small_blind,
                })
            }
            _ => Ok(()),
        }
    }

    /// Original participants in acting order, starting at the small blind.
    pub fn rotation(&self) -> Result<Vec<Position>, Fault> {
        let small_blind = self.forced.small_blind.ok_or(Fault::SmallBlindMissing)?;
        let start = self
            .seats
            .iter()
            .position(|seat| *seat == small_blind)
            .ok_or(Fault::SmallBlindMissing)?;
        Ok(self.seats[start..]
            .iter()
            .chain(self.seats[..start].iter())
            .copied()
            .collect())
    }

    /// Chips each original participant put in, in acting order. Falls back
    /// to seat order when the small blind is unknown.
    pub fn contributions(&self) -> Vec<(Position, Chips)> {
        let order = self.rotation().unwrap_or_else(|_| self.seats.clone());
        order
            .into_iter()
            .map(|seat| {
                let contributed = self
                    .participants
                    .get(&seat)
                    .map(Participant::contributed)
                    .or_else(|| self.departed.get(&seat).copied())
                    .unwrap_or_default();
                (seat, contributed)
            })
            .collect()
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "hand {} {} dealer {} seats {:?}",
            self.id, self.street, self.dealer, self.seats
        )
    }
}
