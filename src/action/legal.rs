use crate::Chips;
use crate::protocol::Flag;
use crate::protocol::Offer;
use std::collections::BTreeMap;

/// Numeric constraint attached to one legal action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// No amount involved (fold, check, sit-out).
    Free,
    /// Exactly this many chips (call).
    Fixed(Chips),
    /// Any amount within bounds (bet, raise-to).
    Range { min: Chips, max: Chips },
}

impl Constraint {
    pub fn min(&self) -> Option<Chips> {
        match self {
            Self::Free => None,
            Self::Fixed(chips) => Some(*chips),
            Self::Range { min, .. } => Some(*min),
        }
    }
    pub fn max(&self) -> Option<Chips> {
        match self {
            Self::Free => None,
            Self::Fixed(chips) => Some(*chips),
            Self::Range { max, .. } => Some(*max),
        }
    }
}

impl From<&Offer> for Constraint {
    fn from(offer: &Offer) -> Self {
        match (offer.min, offer.max, offer.chip) {
            (Some(min), Some(max), _) => Self::Range { min, max },
            (Some(min), None, _) => Self::Range { min, max: min },
            (None, Some(max), _) => Self::Range { min: max, max },
            (None, None, Some(chip)) => Self::Fixed(chip),
            (None, None, None) => Self::Free,
        }
    }
}

/// The set of actions the backend currently allows the hero.
/// Replaced wholesale on every action request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Legal(BTreeMap<Flag, Constraint>);

impl Legal {
    pub fn contains(&self, flag: Flag) -> bool {
        self.0.contains_key(&flag)
    }
    pub fn get(&self, flag: Flag) -> Option<Constraint> {
        self.0.get(&flag).copied()
    }
}

impl From<&[Offer]> for Legal {
    fn from(offers: &[Offer]) -> Self {
        Self(
            offers
                .iter()
                .map(|offer| (offer.flag, Constraint::from(offer)))
                .collect(),
        )
    }
}

impl FromIterator<(Flag, Constraint)> for Legal {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (Flag, Constraint)>,
    {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for Legal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = self
            .0
            .iter()
            .map(|(flag, constraint)| match constraint {
                Constraint::Free => flag.to_string(),
                Constraint::Fixed(chips) => format!("{} {}", flag, chips),
                Constraint::Range { min, max } => format!("{} {}..{}", flag, min, max),
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{}]", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(flag: Flag, chip: Option<Chips>, min: Option<Chips>, max: Option<Chips>) -> Offer {
        Offer {
            flag,
            chip,
            min,
            max,
        }
    }

    #[test]
    fn constraints_from_offers() {
        let offers = [
            offer(Flag::Fold, None, None, None),
            offer(Flag::Call, Some(40), None, None),
            offer(Flag::Raise, None, Some(80), Some(1000)),
        ];
        let legal = Legal::from(&offers[..]);
        assert_eq!(legal.get(Flag::Fold), Some(Constraint::Free));
        assert_eq!(legal.get(Flag::Call), Some(Constraint::Fixed(40)));
        assert_eq!(
            legal.get(Flag::Raise),
            Some(Constraint::Range { min: 80, max: 1000 })
        );
        assert!(!legal.contains(Flag::Check));
    }

    #[test]
    fn half_open_ranges_collapse() {
        let offers = [offer(Flag::Bet, None, Some(20), None)];
        let legal = Legal::from(&offers[..]);
        assert_eq!(legal.get(Flag::Bet).and_then(|c| c.max()), Some(20));
    }

    #[test]
    fn displays_constraints() {
        let legal = [
            (Flag::Check, Constraint::Free),
            (Flag::Bet, Constraint::Range { min: 2, max: 50 }),
        ]
        .into_iter()
        .collect::<Legal>();
        assert_eq!(legal.to_string(), "[CHECK, BET 2..50]");
    }
}
