use super::rank::Rank;
use super::suit::Suit;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Wire code the backend uses for a card the hero cannot see.
pub const HIDDEN: u8 = 0xFF;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    /// Decodes a dealt hand. None when any card is hidden or malformed,
    /// which is how foreign hands show up in hole-card payloads.
    pub fn known(codes: &[u8]) -> Option<Vec<Card>> {
        codes
            .iter()
            .map(|n| Card::try_from(*n).ok())
            .collect::<Option<Vec<_>>>()
            .filter(|cards| !cards.is_empty())
    }
}

/// u8 isomorphism
/// each card is mapped to its location in a sorted deck 0-51
/// Ts
/// 35
impl From<Card> for u8 {
    fn from(c: Card) -> u8 {
        u8::from(c.suit) + u8::from(c.rank) * 4
    }
}
impl TryFrom<u8> for Card {
    type Error = u8;
    fn try_from(n: u8) -> std::result::Result<Self, u8> {
        Ok(Self {
            rank: Rank::try_from(n / 4).map_err(|_| n)?,
            suit: Suit::try_from(n % 4).map_err(|_| n)?,
        })
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// decision service expects two-character strings like "Ah"
impl serde::Serialize for Card {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijective_u8() {
        let card = Card::try_from(35).unwrap();
        assert_eq!(card.to_string(), "Ts");
        assert_eq!(u8::from(card), 35);
    }

    #[test]
    fn sentinel_is_not_a_card() {
        assert!(Card::try_from(HIDDEN).is_err());
        assert!(Card::try_from(52).is_err());
    }

    #[test]
    fn known_rejects_partially_hidden_hands() {
        assert_eq!(Card::known(&[51, 50]).map(|c| c.len()), Some(2));
        assert!(Card::known(&[51, HIDDEN]).is_none());
        assert!(Card::known(&[HIDDEN, HIDDEN]).is_none());
        assert!(Card::known(&[]).is_none());
    }

    #[test]
    fn serializes_as_string() {
        let card = Card::try_from(51).unwrap();
        assert_eq!(serde_json::to_string(&card).unwrap(), "\"As\"");
    }
}
