//! Double-elimination bracket for power-of-two fields.
//!
//! Winner-bracket losers drop into the loser bracket along precomputed
//! routes; a second loss eliminates. The loser-bracket shapes for sizes 4
//! and 8 are enumerated explicitly (they are not a uniform halving); larger
//! fields are rejected until the general shape is derived.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Slot;
use crate::error::TournamentError;
use crate::roster::EntrantId;

/// A seeded playoff participant.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeTeam {
    pub id: EntrantId,
    pub name: String,
    pub seed: u32,
}

/// Outcome of a bracket match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Winner {
    Team1,
    Team2,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Team1 => "team1",
            Self::Team2 => "team2",
        };
        write!(f, "{repr}")
    }
}

/// A bracket match; empty slots are waiting on upstream results.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeMatch {
    pub team1: Option<EntrantId>,
    pub team2: Option<EntrantId>,
    pub result: Option<Winner>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeRound {
    pub matches: Vec<DeMatch>,
}

/// Downstream slot a routed team lands in.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum DeTarget {
    Winner {
        round: usize,
        match_index: usize,
        slot: Slot,
    },
    Loser {
        round: usize,
        match_index: usize,
        slot: Slot,
    },
    GrandFinal {
        slot: Slot,
    },
}

/// Routing for one match. `on_loss` is absent once a loss eliminates.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeRouting {
    pub on_win: Option<DeTarget>,
    pub on_loss: Option<DeTarget>,
}

/// Addresses a match for result entry.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum DeLocation {
    Winner { round: usize, match_index: usize },
    Loser { round: usize, match_index: usize },
    GrandFinal,
    GrandFinalReset,
}

/// A double-elimination bracket aggregate.
///
/// Routing tables are built once at construction and never mutated; results
/// and routed slots are the only state that changes afterward.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DoubleElimBracket {
    pub teams: Vec<DeTeam>,
    pub winner_rounds: Vec<DeRound>,
    pub loser_rounds: Vec<DeRound>,
    pub grand_final: DeMatch,
    /// Second grand final, present only after the caller starts a reset.
    pub grand_final_reset: Option<DeMatch>,
    pub reset_enabled: bool,
    pub winner_routing: Vec<Vec<DeRouting>>,
    pub loser_routing: Vec<Vec<DeRouting>>,
}

impl DoubleElimBracket {
    /// Build a bracket from teams ordered by seed (seed 1 first).
    ///
    /// Round 0 pairs seed 1 against seed N, seed 2 against seed N-1, and so
    /// on. The field must be a power of two between 4 and 8.
    pub fn build(teams: Vec<DeTeam>, reset_enabled: bool) -> Result<Self, TournamentError> {
        let q = teams.len();
        if q < 4 {
            return Err(TournamentError::NotEnoughParticipants {
                required: 4,
                actual: q,
            });
        }
        if !q.is_power_of_two() {
            return Err(TournamentError::NotPowerOfTwo { actual: q });
        }
        if q > 8 {
            return Err(TournamentError::UnsupportedBracketSize { actual: q });
        }

        let first_round = DeRound {
            matches: (0..q / 2)
                .map(|i| DeMatch {
                    team1: Some(teams[i].id),
                    team2: Some(teams[q - 1 - i].id),
                    result: None,
                })
                .collect(),
        };

        let mut winner_rounds = vec![first_round];
        let mut size = q / 2;
        while size > 1 {
            size /= 2;
            winner_rounds.push(DeRound {
                matches: vec![DeMatch::default(); size],
            });
        }

        let (loser_rounds, winner_routing, loser_routing) = if q == 4 {
            routing_for_4()
        } else {
            routing_for_8()
        };

        debug!(
            "built double elimination bracket: {} teams, {} winner rounds, {} loser rounds",
            q,
            winner_rounds.len(),
            loser_rounds.len()
        );

        Ok(Self {
            teams,
            winner_rounds,
            loser_rounds,
            grand_final: DeMatch::default(),
            grand_final_reset: None,
            reset_enabled,
            winner_routing,
            loser_routing,
        })
    }

    /// The match addressed by `location`, if it exists.
    #[must_use]
    pub fn match_at(&self, location: DeLocation) -> Option<&DeMatch> {
        match location {
            DeLocation::Winner { round, match_index } => self
                .winner_rounds
                .get(round)
                .and_then(|r| r.matches.get(match_index)),
            DeLocation::Loser { round, match_index } => self
                .loser_rounds
                .get(round)
                .and_then(|r| r.matches.get(match_index)),
            DeLocation::GrandFinal => Some(&self.grand_final),
            DeLocation::GrandFinalReset => self.grand_final_reset.as_ref(),
        }
    }

    /// Record a result: mark the match and propagate winner and loser to
    /// their precomputed targets. Locations that do not exist, or results
    /// naming an empty slot, leave the bracket unchanged.
    #[must_use]
    pub fn record_result(&self, location: DeLocation, result: Winner) -> Self {
        let Some(m) = self.match_at(location) else {
            return self.clone();
        };
        let (winner, loser) = match result {
            Winner::Team1 => (m.team1, m.team2),
            Winner::Team2 => (m.team2, m.team1),
        };
        let Some(winner) = winner else {
            return self.clone();
        };

        let mut next = self.clone();
        let routing = next.routing_at(location);
        match location {
            DeLocation::Winner { round, match_index } => {
                next.winner_rounds[round].matches[match_index].result = Some(result);
            }
            DeLocation::Loser { round, match_index } => {
                next.loser_rounds[round].matches[match_index].result = Some(result);
            }
            DeLocation::GrandFinal => {
                next.grand_final.result = Some(result);
                info!("grand final decided for {result}");
            }
            DeLocation::GrandFinalReset => {
                if let Some(reset) = next.grand_final_reset.as_mut() {
                    reset.result = Some(result);
                }
                info!("grand final reset decided for {result}");
            }
        }

        if let Some(target) = routing.on_win {
            next.place(target, winner);
        }
        if let (Some(target), Some(loser)) = (routing.on_loss, loser) {
            next.place(target, loser);
        }
        next
    }

    /// Start the optional bracket-reset match. Available only when enabled,
    /// after the loser-bracket champion wins the first grand final.
    pub fn start_reset(&self) -> Result<Self, TournamentError> {
        if !self.reset_enabled
            || self.grand_final.result != Some(Winner::Team2)
            || self.grand_final_reset.is_some()
        {
            return Err(TournamentError::BracketResetUnavailable);
        }
        let mut next = self.clone();
        next.grand_final_reset = Some(DeMatch {
            team1: self.grand_final.team1,
            team2: self.grand_final.team2,
            result: None,
        });
        Ok(next)
    }

    /// The (possibly reset) grand final has a result.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match &self.grand_final_reset {
            Some(reset) => reset.result.is_some(),
            None => self.grand_final.result.is_some(),
        }
    }

    /// Winner of the deciding grand final.
    #[must_use]
    pub fn champion(&self) -> Option<&DeTeam> {
        let deciding = self.grand_final_reset.as_ref().unwrap_or(&self.grand_final);
        let id = match deciding.result? {
            Winner::Team1 => deciding.team1?,
            Winner::Team2 => deciding.team2?,
        };
        self.teams.iter().find(|t| t.id == id)
    }

    fn routing_at(&self, location: DeLocation) -> DeRouting {
        match location {
            DeLocation::Winner { round, match_index } => self
                .winner_routing
                .get(round)
                .and_then(|r| r.get(match_index))
                .copied()
                .unwrap_or_default(),
            DeLocation::Loser { round, match_index } => self
                .loser_routing
                .get(round)
                .and_then(|r| r.get(match_index))
                .copied()
                .unwrap_or_default(),
            DeLocation::GrandFinal | DeLocation::GrandFinalReset => DeRouting::default(),
        }
    }

    fn place(&mut self, target: DeTarget, team: EntrantId) {
        let (slot_match, slot) = match target {
            DeTarget::Winner {
                round,
                match_index,
                slot,
            } => (
                self.winner_rounds
                    .get_mut(round)
                    .and_then(|r| r.matches.get_mut(match_index)),
                slot,
            ),
            DeTarget::Loser {
                round,
                match_index,
                slot,
            } => (
                self.loser_rounds
                    .get_mut(round)
                    .and_then(|r| r.matches.get_mut(match_index)),
                slot,
            ),
            DeTarget::GrandFinal { slot } => (Some(&mut self.grand_final), slot),
        };
        if let Some(m) = slot_match {
            match slot {
                Slot::First => m.team1 = Some(team),
                Slot::Second => m.team2 = Some(team),
            }
        }
    }
}

type LoserShape = (Vec<DeRound>, Vec<Vec<DeRouting>>, Vec<Vec<DeRouting>>);

fn to_winner(round: usize, match_index: usize, slot: Slot) -> Option<DeTarget> {
    Some(DeTarget::Winner {
        round,
        match_index,
        slot,
    })
}

fn to_loser(round: usize, match_index: usize, slot: Slot) -> Option<DeTarget> {
    Some(DeTarget::Loser {
        round,
        match_index,
        slot,
    })
}

fn to_grand_final(slot: Slot) -> Option<DeTarget> {
    Some(DeTarget::GrandFinal { slot })
}

/// Size 4: one loser round absorbing both round-0 losers, then a loser
/// final against the winner-bracket runner-up.
fn routing_for_4() -> LoserShape {
    let loser_rounds = vec![
        DeRound {
            matches: vec![DeMatch::default()],
        },
        DeRound {
            matches: vec![DeMatch::default()],
        },
    ];
    let winner_routing = vec![
        (0..2)
            .map(|m| DeRouting {
                on_win: to_winner(1, 0, Slot::from_parity(m)),
                on_loss: to_loser(0, 0, Slot::from_parity(m)),
            })
            .collect(),
        vec![DeRouting {
            on_win: to_grand_final(Slot::First),
            on_loss: to_loser(1, 0, Slot::First),
        }],
    ];
    let loser_routing = vec![
        vec![DeRouting {
            on_win: to_loser(1, 0, Slot::Second),
            on_loss: None,
        }],
        vec![DeRouting {
            on_win: to_grand_final(Slot::Second),
            on_loss: None,
        }],
    ];
    (loser_rounds, winner_routing, loser_routing)
}

/// Size 8: two loser rounds of two matches, then two single-match rounds.
/// Winner-bracket semifinal losers enter loser round 1; the winner-bracket
/// final loser waits for the loser-bracket survivor in round 3.
fn routing_for_8() -> LoserShape {
    let loser_rounds = vec![
        DeRound {
            matches: vec![DeMatch::default(); 2],
        },
        DeRound {
            matches: vec![DeMatch::default(); 2],
        },
        DeRound {
            matches: vec![DeMatch::default()],
        },
        DeRound {
            matches: vec![DeMatch::default()],
        },
    ];
    let winner_routing = vec![
        (0..4)
            .map(|m| DeRouting {
                on_win: to_winner(1, m / 2, Slot::from_parity(m)),
                on_loss: to_loser(0, m / 2, Slot::from_parity(m)),
            })
            .collect(),
        (0..2)
            .map(|m| DeRouting {
                on_win: to_winner(2, 0, Slot::from_parity(m)),
                on_loss: to_loser(1, m, Slot::First),
            })
            .collect(),
        vec![DeRouting {
            on_win: to_grand_final(Slot::First),
            on_loss: to_loser(3, 0, Slot::First),
        }],
    ];
    let loser_routing = vec![
        (0..2)
            .map(|m| DeRouting {
                on_win: to_loser(1, m, Slot::Second),
                on_loss: None,
            })
            .collect(),
        (0..2)
            .map(|m| DeRouting {
                on_win: to_loser(2, 0, Slot::from_parity(m)),
                on_loss: None,
            })
            .collect(),
        vec![DeRouting {
            on_win: to_loser(3, 0, Slot::Second),
            on_loss: None,
        }],
        vec![DeRouting {
            on_win: to_grand_final(Slot::Second),
            on_loss: None,
        }],
    ];
    (loser_rounds, winner_routing, loser_routing)
}
