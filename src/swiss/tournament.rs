//! The Swiss tournament aggregate.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::pairing::{self, Deadline, SwissRound};
use super::player::{MatchResult, Player, initialize_players};
use crate::error::TournamentError;
use crate::roster::{EntrantId, Registrant};

/// A Swiss tournament: the full player set plus the rounds generated so far.
///
/// Every operation consumes `&self` and returns a new aggregate; the caller
/// owns storage, replay, and undo.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SwissTournament {
    pub players: Vec<Player>,
    pub rounds: Vec<SwissRound>,
}

impl SwissTournament {
    /// Start a tournament: rank the roster by rating and pair round 0.
    pub fn start(roster: &[Registrant]) -> Result<Self, TournamentError> {
        if roster.len() < 2 {
            return Err(TournamentError::NotEnoughParticipants {
                required: 2,
                actual: roster.len(),
            });
        }
        let players = initialize_players(roster);
        let (round, players) = pairing::generate_first_round(&players);
        Ok(Self {
            players,
            rounds: vec![round],
        })
    }

    /// Number of rounds a Swiss event needs: `ceil(log2(players))`.
    #[must_use]
    pub fn rounds_needed(player_count: usize) -> u32 {
        if player_count <= 1 {
            return 0;
        }
        player_count.next_power_of_two().trailing_zeros()
    }

    /// All generated rounds have been produced.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rounds.len() as u32 >= Self::rounds_needed(self.players.len())
    }

    /// Pair and append the next round.
    pub fn generate_next_round(
        &self,
        rng: &mut impl Rng,
        deadline: Deadline,
    ) -> Result<Self, TournamentError> {
        let (round, players) = pairing::generate_swiss_round(&self.players, rng, deadline)?;
        debug!(
            "paired swiss round {} with {} matches",
            self.rounds.len(),
            round.matches.len()
        );
        let mut rounds = self.rounds.clone();
        rounds.push(round);
        Ok(Self { players, rounds })
    }

    /// Apply per-match results for one round and recompute tie-breaks.
    ///
    /// `results` is indexed by match position; `None` entries leave a match
    /// unscored. Referencing a round that does not exist returns the
    /// aggregate unchanged.
    #[must_use]
    pub fn apply_results(&self, round_index: usize, results: &[Option<MatchResult>]) -> Self {
        let Some(round) = self.rounds.get(round_index) else {
            return self.clone();
        };

        let mut by_id: HashMap<EntrantId, Player> =
            self.players.iter().map(|p| (p.id, p.clone())).collect();

        let mut updated_matches = round.matches.clone();
        for (index, m) in updated_matches.iter_mut().enumerate() {
            let result = results.get(index).copied().flatten();
            if m.is_bye() {
                continue;
            }
            if let Some(scored) = result {
                if let Some(p1) = by_id.get_mut(&m.player1) {
                    p1.points += score(scored);
                    p1.result_history.push(scored);
                }
                if let Some(p2) = m.player2.and_then(|id| by_id.get_mut(&id)) {
                    let mirrored = scored.reversed();
                    p2.points += score(mirrored);
                    p2.result_history.push(mirrored);
                }
            }
            m.result = result;
        }

        let mut players: Vec<Player> = self
            .players
            .iter()
            .map(|p| by_id.get(&p.id).cloned().unwrap_or_else(|| p.clone()))
            .collect();

        let mut rounds = self.rounds.clone();
        rounds[round_index] = SwissRound {
            matches: updated_matches,
        };

        recalculate_buchholz(&mut players, &rounds);

        Self { players, rounds }
    }

    /// Players ordered by score, then Buchholz total, then cut-1.
    #[must_use]
    pub fn standings(&self) -> Vec<&Player> {
        let mut standings: Vec<&Player> = self.players.iter().collect();
        standings.sort_by(|a, b| {
            b.points
                .total_cmp(&a.points)
                .then(b.buc_t.total_cmp(&a.buc_t))
                .then(b.buc1.total_cmp(&a.buc1))
                .then(a.id.cmp(&b.id))
        });
        standings
    }
}

/// Points earned by a result: win 1, draw 0.5, loss 0.
fn score(result: MatchResult) -> f64 {
    match result {
        MatchResult::Win => 1.0,
        MatchResult::Draw => 0.5,
        MatchResult::Loss => 0.0,
    }
}

/// Recompute both Buchholz values for every player from the full match set.
///
/// Always a full rebuild, never incremental: recomputing from scratch after
/// each round keeps repeated applications from drifting.
pub fn recalculate_buchholz(players: &mut [Player], rounds: &[SwissRound]) {
    let points: HashMap<EntrantId, f64> = players.iter().map(|p| (p.id, p.points)).collect();

    for player in players.iter_mut() {
        let mut opponent_points: Vec<f64> = Vec::new();
        for round in rounds {
            for m in &round.matches {
                let Some(player2) = m.player2 else { continue };
                if m.player1 == player.id {
                    if let Some(score) = points.get(&player2) {
                        opponent_points.push(*score);
                    }
                } else if player2 == player.id {
                    if let Some(score) = points.get(&m.player1) {
                        opponent_points.push(*score);
                    }
                }
            }
        }

        player.buc_t = opponent_points.iter().sum();
        player.buc1 = if opponent_points.len() > 1 {
            let weakest = opponent_points.iter().copied().fold(f64::MAX, f64::min);
            player.buc_t - weakest
        } else {
            player.buc_t
        };
    }
}
