//! Player records and per-round bookkeeping for the Swiss engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::roster::{EntrantId, Registrant};

/// Board side assigned for one round. `None` marks a bye round: the player
/// sat out and no side was ever assigned.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Color {
    White,
    Black,
    None,
}

impl Color {
    /// The side the opponent receives. A bye has no opposite.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
            Self::None => Self::None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::White => "w",
            Self::Black => "b",
            Self::None => "-",
        };
        write!(f, "{repr}")
    }
}

/// Result of a match, stated from the first participant's point of view when
/// attached to a match, and from the player's own point of view when stored
/// in a result history.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

impl MatchResult {
    /// The same result seen from the other side of the board.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Win => Self::Loss,
            Self::Loss => Self::Win,
            Self::Draw => Self::Draw,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Win => "1-0",
            Self::Loss => "0-1",
            Self::Draw => "½-½",
        };
        write!(f, "{repr}")
    }
}

/// A Swiss tournament player.
///
/// `opponents` and `color_history` each gain one entry per paired round; a
/// bye appends [`Color::None`] and a synthetic [`MatchResult::Win`] but no
/// opponent entry. An id appears twice in `opponents` only through the
/// last-resort rematch fallback.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Player {
    pub id: EntrantId,
    pub name: String,
    pub rating: Option<u32>,
    /// Cumulative score: win 1, draw 0.5, loss 0.
    pub points: f64,
    /// Buchholz cut-1: opponents' score sum minus the weakest opponent.
    pub buc1: f64,
    /// Buchholz total: sum of all opponents' scores.
    pub buc_t: f64,
    pub opponents: Vec<EntrantId>,
    pub color_history: Vec<Color>,
    pub result_history: Vec<MatchResult>,
}

impl Player {
    #[must_use]
    pub fn new(id: EntrantId, name: impl Into<String>, rating: Option<u32>) -> Self {
        Self {
            id,
            name: name.into(),
            rating,
            points: 0.0,
            buc1: 0.0,
            buc_t: 0.0,
            opponents: Vec::new(),
            color_history: Vec::new(),
            result_history: Vec::new(),
        }
    }

    /// Side assigned in the most recent round, if any round has been played.
    #[must_use]
    pub fn last_color(&self) -> Option<Color> {
        self.color_history.last().copied()
    }

    /// Whether this player has already faced `opponent`.
    #[must_use]
    pub fn has_faced(&self, opponent: EntrantId) -> bool {
        self.opponents.contains(&opponent)
    }
}

/// Build the initial player list from a roster, ranked by rating (highest
/// first, unrated last). Ids follow roster order and stay stable afterward.
#[must_use]
pub fn initialize_players(roster: &[Registrant]) -> Vec<Player> {
    let mut players: Vec<Player> = roster
        .iter()
        .enumerate()
        .map(|(index, entry)| Player::new(index as EntrantId + 1, &entry.name, entry.rating))
        .collect();
    players.sort_by(|a, b| b.rating.unwrap_or(0).cmp(&a.rating.unwrap_or(0)));
    players
}
