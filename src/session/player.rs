use crate::Chips;
use crate::cards::Card;

/// What the table shows about one physical seat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Player {
    pub pid: Option<String>,
    pub name: String,
    pub country: String,
    pub stack: Chips,
}

/// A seat's view within one hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub country: String,
    /// Stack when the hand started.
    pub stack: Chips,
    /// Stack after the latest action.
    pub current: Chips,
    pub cards: Option<Vec<Card>>,
}

impl Participant {
    /// Chips this seat has put in so far.
    pub fn contributed(&self) -> Chips {
        (self.stack - self.current).max(0)
    }
}

impl From<&Player> for Participant {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            country: player.country.clone(),
            stack: player.stack,
            current: player.stack,
            cards: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contribution_tracks_stack_delta() {
        let player = Player {
            stack: 1000,
            ..Player::default()
        };
        let mut participant = Participant::from(&player);
        assert_eq!(participant.contributed(), 0);
        participant.current = 850;
        assert_eq!(participant.contributed(), 150);
        participant.current = 1200;
        assert_eq!(participant.contributed(), 0);
    }
}
