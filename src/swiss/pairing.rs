//! Per-round Swiss pairing.
//!
//! Pairing is a pure function over a cloned player list: the caller's players
//! are never touched. Randomness comes from an injected RNG and the pairing
//! attempt is bounded by an injected [`Deadline`], so both the fallback
//! shuffle and the convergence failure are reproducible in tests.

use log::warn;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::player::{Color, MatchResult, Player};
use crate::error::TournamentError;
use crate::roster::EntrantId;

/// Default wall-clock budget for one pairing attempt.
pub const DEFAULT_PAIRING_BUDGET: Duration = Duration::from_secs(3);

/// Wall-clock bound for a pairing attempt, injected by the caller.
#[derive(Clone, Copy, Debug)]
pub enum Deadline {
    Never,
    At(Instant),
}

impl Deadline {
    /// Deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self::At(Instant::now() + budget)
    }

    #[must_use]
    pub fn expired(&self) -> bool {
        match self {
            Self::Never => false,
            Self::At(instant) => Instant::now() >= *instant,
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::after(DEFAULT_PAIRING_BUDGET)
    }
}

/// One Swiss pairing. A missing second participant is a bye; bye matches are
/// born with their synthetic win already recorded.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SwissMatch {
    pub player1: EntrantId,
    pub player2: Option<EntrantId>,
    pub player1_color: Color,
    pub player2_color: Option<Color>,
    /// Result from `player1`'s point of view.
    pub result: Option<MatchResult>,
}

impl SwissMatch {
    #[must_use]
    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }
}

/// An ordered list of matches. Rounds are numbered from 0 by their position
/// in the aggregate.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SwissRound {
    pub matches: Vec<SwissMatch>,
}

/// Pair round 0 from the rating-ranked player list: consecutive pairs, first
/// player takes white. An odd leftover receives an immediate bye.
///
/// Returns the new round plus a cloned, updated player list.
#[must_use]
pub fn generate_first_round(players: &[Player]) -> (SwissRound, Vec<Player>) {
    let mut cloned = players.to_vec();
    let mut matches = Vec::with_capacity(cloned.len().div_ceil(2));

    for pair in cloned.chunks_mut(2) {
        match pair {
            [p1, p2] => {
                matches.push(SwissMatch {
                    player1: p1.id,
                    player2: Some(p2.id),
                    player1_color: Color::White,
                    player2_color: Some(Color::Black),
                    result: None,
                });
                p1.color_history.push(Color::White);
                p2.color_history.push(Color::Black);
                p1.opponents.push(p2.id);
                p2.opponents.push(p1.id);
            }
            [lone] => {
                matches.push(bye_match(lone));
            }
            _ => unreachable!("chunks_mut(2) yields one or two players"),
        }
    }

    (SwissRound { matches }, cloned)
}

/// Pair the next Swiss round.
///
/// Players are sorted by (points, Buchholz total) descending. The top player
/// scans the remainder for the first opponent it has not already faced; if
/// none exists the scan is retried once against a shuffled view, and failing
/// that the first remaining player is accepted as a last-resort rematch.
/// Colors alternate from each player's most recent side. A single leftover
/// receives a bye. The whole attempt is bounded by `deadline`.
pub fn generate_swiss_round(
    players: &[Player],
    rng: &mut impl Rng,
    deadline: Deadline,
) -> Result<(SwissRound, Vec<Player>), TournamentError> {
    let mut by_id: HashMap<EntrantId, Player> =
        players.iter().map(|p| (p.id, p.clone())).collect();

    let mut queue: Vec<EntrantId> = players.iter().map(|p| p.id).collect();
    queue.sort_by(|a, b| {
        let pa = &by_id[a];
        let pb = &by_id[b];
        pb.points
            .total_cmp(&pa.points)
            .then(pb.buc_t.total_cmp(&pa.buc_t))
    });

    let mut matches = Vec::with_capacity(queue.len() / 2 + 1);
    let mut unmatched: Vec<EntrantId> = Vec::new();

    while !queue.is_empty() {
        if deadline.expired() {
            return Err(TournamentError::PairingTimeout);
        }

        let id = queue.remove(0);

        let mut picked = {
            let player = &by_id[&id];
            queue.iter().position(|&candidate| !player.has_faced(candidate))
        };

        if picked.is_none() {
            // Retry against a shuffled view before giving up on a fresh opponent.
            let mut shuffled = queue.clone();
            shuffled.shuffle(rng);
            let player = &by_id[&id];
            if let Some(found) = shuffled.into_iter().find(|&c| !player.has_faced(c)) {
                picked = queue.iter().position(|&c| c == found);
            }
        }

        if picked.is_none() && !queue.is_empty() {
            warn!("player {id} has faced every remaining player, accepting a rematch");
            picked = Some(0);
        }

        match picked {
            Some(index) => {
                let opponent = queue.remove(index);
                let p1_color = match by_id[&id].last_color() {
                    Some(Color::White) => Color::Black,
                    _ => Color::White,
                };
                let p2_color = p1_color.opposite();

                matches.push(SwissMatch {
                    player1: id,
                    player2: Some(opponent),
                    player1_color: p1_color,
                    player2_color: Some(p2_color),
                    result: None,
                });

                if let Some(p1) = by_id.get_mut(&id) {
                    p1.opponents.push(opponent);
                    p1.color_history.push(p1_color);
                }
                if let Some(p2) = by_id.get_mut(&opponent) {
                    p2.opponents.push(id);
                    p2.color_history.push(p2_color);
                }
            }
            None => unmatched.push(id),
        }
    }

    if let Some(bye_id) = unmatched.pop() {
        if let Some(player) = by_id.get_mut(&bye_id) {
            matches.push(bye_match(player));
        }
    }

    // Rebuild the list in the caller's order from the single source of truth.
    let updated = players
        .iter()
        .map(|p| by_id.remove(&p.id).unwrap_or_else(|| p.clone()))
        .collect();

    Ok((SwissRound { matches }, updated))
}

/// Award a bye: one point, a synthetic win, and the bye color sentinel. The
/// match result is set at generation time, never left pending.
fn bye_match(player: &mut Player) -> SwissMatch {
    player.points += 1.0;
    player.result_history.push(MatchResult::Win);
    player.color_history.push(Color::None);
    SwissMatch {
        player1: player.id,
        player2: None,
        player1_color: Color::None,
        player2_color: None,
        result: Some(MatchResult::Win),
    }
}
