//! Mini games that are always offered, whatever the schedule says.

use crate::models::MiniGame;

pub struct DefaultMiniGame {
    pub display: &'static str,
    pub value: &'static str,
    pub tip_key: &'static str,
}

pub const DEFAULT_MINI_GAMES: &[DefaultMiniGame] = &[
    DefaultMiniGame {
        display: "Season Store",
        value: "SS@Store@Begin",
        tip_key: "MiniGameNameSsStoreTip",
    },
    DefaultMiniGame {
        display: "Green Ticket Store",
        value: "GreenTicket@Store@Begin",
        tip_key: "MiniGameNameGreenTicketStoreTip",
    },
    DefaultMiniGame {
        display: "Yellow Ticket Store",
        value: "YellowTicket@Store@Begin",
        tip_key: "MiniGameNameYellowTicketStoreTip",
    },
    DefaultMiniGame {
        display: "Reclamation Algorithm Store",
        value: "RA@Store@Begin",
        tip_key: "MiniGameNameRAStoreTip",
    },
    DefaultMiniGame {
        display: "Secret Front",
        value: "MiniGame@SecretFront",
        tip_key: "MiniGame@SecretFrontTip",
    },
];

impl DefaultMiniGame {
    /// Unbounded, so always open
    pub fn to_mini_game(&self) -> MiniGame {
        MiniGame {
            display: self.display.to_string(),
            value: self.value.to_string(),
            start: None,
            end: None,
            tip: None,
            tip_key: Some(self.tip_key.to_string()),
            is_unsupported: false,
        }
    }
}

/// Document entries first, then every default whose task code the document
/// did not already provide.
pub fn with_defaults(published: Vec<MiniGame>) -> Vec<MiniGame> {
    let mut games = published;
    let defaults: Vec<MiniGame> = DEFAULT_MINI_GAMES
        .iter()
        .filter(|d| !games.iter().any(|g| g.value == d.value))
        .map(DefaultMiniGame::to_mini_game)
        .collect();
    games.extend(defaults);
    games
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only() {
        let games = with_defaults(Vec::new());
        assert_eq!(games.len(), DEFAULT_MINI_GAMES.len());
        assert_eq!(games[0].value, "SS@Store@Begin");
        assert!(games.iter().all(|g| g.start.is_none() && g.end.is_none()));
    }

    #[test]
    fn test_document_entry_wins_and_comes_first() {
        let published = MiniGame {
            display: "Secret Front (event)".to_string(),
            tip: Some("Limited run".to_string()),
            ..DEFAULT_MINI_GAMES[4].to_mini_game()
        };
        let games = with_defaults(vec![published]);

        assert_eq!(games.len(), DEFAULT_MINI_GAMES.len());
        assert_eq!(games[0].display, "Secret Front (event)");
        assert_eq!(
            games
                .iter()
                .filter(|g| g.value == "MiniGame@SecretFront")
                .count(),
            1
        );
    }
}
