use crate::Chips;
use crate::Position;
use crate::cards::Card;
use crate::protocol::Pot;
use serde::Serialize;
use std::collections::BTreeMap;

/// One participant's line in the `showdown` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub pid: Position,
    pub payoff: Chips,
    /// Accumulated rake attributed to this seat, zero or negative.
    pub rake: Chips,
    pub showdown_cards: Vec<Card>,
}

impl Outcome {
    /// Settles a hand for every participant in `roster`.
    ///
    /// `roster` pairs each original participant (ordered from the small blind)
    /// with the chips it put into the pot. A pot's rake is split evenly among
    /// its winners, odd chips going to the earliest listed winner. Winners are
    /// paid their gross share minus their contribution and their rake; losers
    /// are charged their listed loss; seats absent from every pot forfeit what
    /// they contributed. Cards come from the pot listing when present,
    /// otherwise from `shown`.
    pub fn settle(
        roster: &[(Position, Chips)],
        pots: &[Pot],
        shown: &BTreeMap<Position, Vec<Card>>,
    ) -> Vec<Outcome> {
        let mut won = BTreeMap::<Position, Chips>::new();
        let mut lost = BTreeMap::<Position, Chips>::new();
        let mut rake = BTreeMap::<Position, Chips>::new();
        let mut cards = BTreeMap::<Position, Vec<Card>>::new();
        for pot in pots {
            log::debug!(
                "[showdown] pot {} rake {} to {} winner(s)",
                pot.amount,
                pot.rake,
                pot.winners.len()
            );
            let n = pot.winners.len() as Chips;
            for (i, winner) in pot.winners.iter().enumerate() {
                let share = pot.rake / n + if (i as Chips) < pot.rake % n { 1 } else { 0 };
                *won.entry(winner.seat).or_default() += winner.chips;
                *rake.entry(winner.seat).or_default() -= share;
                if let Some(known) = Card::known(&winner.cards) {
                    cards.insert(winner.seat, known);
                }
            }
            for loser in pot.losers.iter() {
                *lost.entry(loser.seat).or_default() += loser.chips;
                if let Some(known) = Card::known(&loser.cards) {
                    cards.entry(loser.seat).or_insert(known);
                }
            }
        }
        roster
            .iter()
            .map(|(seat, contributed)| {
                let rake = rake.get(seat).copied().unwrap_or_default();
                let payoff = match (won.get(seat), lost.get(seat)) {
                    (Some(won), _) => won - contributed + rake,
                    (None, Some(lost)) => -lost,
                    (None, None) => -contributed,
                };
                Outcome {
                    pid: *seat,
                    payoff,
                    rake,
                    showdown_cards: cards
                        .get(seat)
                        .or_else(|| shown.get(seat))
                        .cloned()
                        .unwrap_or_default(),
                }
            })
            .collect()
    }
}
