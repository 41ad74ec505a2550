use super::Legal;
use crate::Chips;
use crate::protocol::Flag;

/// Abstract decision produced by the decision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggestion {
    Fold,
    Check,
    Call,
    Bet(Chips),
    Raise(Chips),
    AllIn,
}

/// Concrete backend action ready to be framed as a `Selection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Play {
    pub flag: Flag,
    pub chip: Option<Chips>,
}

impl Play {
    pub fn new(flag: Flag, chip: Option<Chips>) -> Self {
        Self { flag, chip }
    }
    pub fn fold() -> Self {
        Self::new(Flag::Fold, None)
    }
    pub fn check() -> Self {
        Self::new(Flag::Check, None)
    }
}

impl Suggestion {
    /// Resolves this suggestion against the hero's current legal actions.
    /// None means there is nothing sensible to send.
    pub fn translate(self, legal: &Legal) -> Option<Play> {
        match self {
            Self::Fold if legal.contains(Flag::Check) => Some(Play::check()),
            Self::Fold => Some(Play::fold()),
            Self::Check => Some(Play::check()),
            Self::Call => match legal.get(Flag::Call) {
                Some(constraint) => Some(Play::new(Flag::Call, constraint.min())),
                None if legal.contains(Flag::Check) => Some(Play::check()),
                None => None,
            },
            Self::Bet(amount) => match legal.get(Flag::Bet) {
                Some(c) if c.min().is_some_and(|min| amount < min) => Self::Fold.translate(legal),
                Some(c) => Some(Play::new(Flag::Bet, Some(clamp(amount, c.max())))),
                None if legal.contains(Flag::Raise) => Self::Raise(amount).translate(legal),
                None => Self::Fold.translate(legal),
            },
            Self::Raise(amount) => match legal.get(Flag::Raise) {
                None => Self::Bet(amount).translate(legal),
                Some(c) if c.min().is_some_and(|min| amount < min) => Self::Fold.translate(legal),
                Some(c) => Some(Play::new(Flag::Raise, Some(clamp(amount, c.max())))),
            },
            Self::AllIn => legal
                .get(Flag::Raise)
                .map(|c| Play::new(Flag::Raise, c.max()))
                .or_else(|| legal.get(Flag::Bet).map(|c| Play::new(Flag::Bet, c.max())))
                .or_else(|| legal.get(Flag::Call).map(|c| Play::new(Flag::Call, c.min())))
                .or_else(|| {
                    log::warn!("all-in suggested but nothing aggressive is legal in {}", legal);
                    None
                }),
        }
    }
}

fn clamp(amount: Chips, max: Option<Chips>) -> Chips {
    max.map_or(amount, |max| amount.min(max))
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Fold => write!(f, "fold"),
            Self::Check => write!(f, "check"),
            Self::Call => write!(f, "call"),
            Self::Bet(amount) => write!(f, "bet {}", amount),
            Self::Raise(amount) => write!(f, "raise {}", amount),
            Self::AllIn => write!(f, "all-in"),
        }
    }
}

impl std::fmt::Display for Play {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.chip {
            Some(chip) => write!(f, "{} {}", self.flag, chip),
            None => write!(f, "{}", self.flag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Constraint;

    fn legal(entries: &[(Flag, Constraint)]) -> Legal {
        entries.iter().copied().collect()
    }
    fn facing_bet() -> Legal {
        legal(&[
            (Flag::Fold, Constraint::Free),
            (Flag::Call, Constraint::Fixed(40)),
            (Flag::Raise, Constraint::Range { min: 80, max: 1000 }),
        ])
    }
    fn unopened() -> Legal {
        legal(&[
            (Flag::Fold, Constraint::Free),
            (Flag::Check, Constraint::Free),
            (Flag::Bet, Constraint::Range { min: 20, max: 500 }),
        ])
    }

    #[test]
    fn fold_becomes_check_when_free() {
        assert_eq!(Suggestion::Fold.translate(&unopened()), Some(Play::check()));
        assert_eq!(Suggestion::Fold.translate(&facing_bet()), Some(Play::fold()));
    }

    #[test]
    fn call_ignores_suggested_amount() {
        assert_eq!(
            Suggestion::Call.translate(&facing_bet()),
            Some(Play::new(Flag::Call, Some(40)))
        );
    }

    #[test]
    fn call_without_call_checks() {
        assert_eq!(Suggestion::Call.translate(&unopened()), Some(Play::check()));
    }

    #[test]
    fn undersized_bet_folds() {
        assert_eq!(Suggestion::Bet(10).translate(&unopened()), Some(Play::check()));
        assert_eq!(Suggestion::Raise(50).translate(&facing_bet()), Some(Play::fold()));
    }

    #[test]
    fn oversized_amounts_clamp_to_max() {
        assert_eq!(
            Suggestion::Bet(900).translate(&unopened()),
            Some(Play::new(Flag::Bet, Some(500)))
        );
        assert_eq!(
            Suggestion::Raise(5000).translate(&facing_bet()),
            Some(Play::new(Flag::Raise, Some(1000)))
        );
    }

    #[test]
    fn raise_without_raise_bets() {
        assert_eq!(
            Suggestion::Raise(100).translate(&unopened()),
            Some(Play::new(Flag::Bet, Some(100)))
        );
    }

    #[test]
    fn bet_without_bet_raises() {
        assert_eq!(
            Suggestion::Bet(120).translate(&facing_bet()),
            Some(Play::new(Flag::Raise, Some(120)))
        );
    }

    #[test]
    fn all_in_prefers_raise_then_bet_then_call() {
        assert_eq!(
            Suggestion::AllIn.translate(&facing_bet()),
            Some(Play::new(Flag::Raise, Some(1000)))
        );
        assert_eq!(
            Suggestion::AllIn.translate(&unopened()),
            Some(Play::new(Flag::Bet, Some(500)))
        );
        let short = legal(&[
            (Flag::Fold, Constraint::Free),
            (Flag::Call, Constraint::Fixed(300)),
        ]);
        assert_eq!(
            Suggestion::AllIn.translate(&short),
            Some(Play::new(Flag::Call, Some(300)))
        );
        let passive = legal(&[(Flag::Check, Constraint::Free)]);
        assert_eq!(Suggestion::AllIn.translate(&passive), None);
    }

    #[test]
    fn translation_table() {
        let empty = Legal::default();
        let facing = facing_bet();
        let unopened = unopened();
        let check_only = legal(&[(Flag::Check, Constraint::Free)]);
        let fold_only = legal(&[(Flag::Fold, Constraint::Free)]);
        let raise_only = legal(&[
            (Flag::Fold, Constraint::Free),
            (Flag::Raise, Constraint::Range { min: 80, max: 1000 }),
        ]);
        let short = legal(&[
            (Flag::Fold, Constraint::Free),
            (Flag::Call, Constraint::Fixed(300)),
        ]);
        let bet = |chips| Some(Play::new(Flag::Bet, Some(chips)));
        let raise = |chips| Some(Play::new(Flag::Raise, Some(chips)));
        let call = |chips| Some(Play::new(Flag::Call, Some(chips)));
        let cases = [
            (Suggestion::Fold, &empty, Some(Play::fold())),
            (Suggestion::Fold, &check_only, Some(Play::check())),
            (Suggestion::Fold, &facing, Some(Play::fold())),
            (Suggestion::Check, &empty, Some(Play::check())),
            (Suggestion::Check, &facing, Some(Play::check())),
            (Suggestion::Call, &empty, None),
            (Suggestion::Call, &fold_only, None),
            (Suggestion::Call, &check_only, Some(Play::check())),
            (Suggestion::Call, &short, call(300)),
            (Suggestion::Bet(0), &empty, Some(Play::fold())),
            (Suggestion::Bet(250), &unopened, bet(250)),
            (Suggestion::Bet(10), &unopened, Some(Play::check())),
            (Suggestion::Bet(900), &unopened, bet(500)),
            (Suggestion::Bet(250), &raise_only, raise(250)),
            (Suggestion::Bet(50), &raise_only, Some(Play::fold())),
            (Suggestion::Bet(250), &short, Some(Play::fold())),
            (Suggestion::Raise(0), &empty, Some(Play::fold())),
            (Suggestion::Raise(250), &facing, raise(250)),
            (Suggestion::Raise(50), &facing, Some(Play::fold())),
            (Suggestion::Raise(250), &unopened, bet(250)),
            (Suggestion::Raise(250), &check_only, Some(Play::check())),
            (Suggestion::Raise(250), &short, Some(Play::fold())),
            (Suggestion::AllIn, &facing, raise(1000)),
            (Suggestion::AllIn, &unopened, bet(500)),
            (Suggestion::AllIn, &short, call(300)),
            (Suggestion::AllIn, &check_only, None),
            (Suggestion::AllIn, &empty, None),
        ];
        for (suggestion, set, expected) in cases {
            assert_eq!(
                suggestion.translate(set),
                expected,
                "{} against {}",
                suggestion,
                set
            );
        }
    }
}
