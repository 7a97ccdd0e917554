//! Single-elimination bracket with bye-aware construction.

use log::debug;
use serde::{Deserialize, Serialize};

use super::Slot;
use crate::error::TournamentError;
use crate::roster::{EntrantId, Registrant};
use crate::swiss::MatchResult;

/// A bracket participant.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Entrant {
    pub id: EntrantId,
    pub name: String,
    pub rating: Option<u32>,
}

/// A bracket match. Either slot may be empty: not yet decided in later
/// rounds, or a bye in round 0.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ElimMatch {
    pub player1: Option<EntrantId>,
    pub player2: Option<EntrantId>,
    /// Result from `player1`'s point of view; draws have no meaning here.
    pub result: Option<MatchResult>,
}

impl ElimMatch {
    fn empty() -> Self {
        Self {
            player1: None,
            player2: None,
            result: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BracketRound {
    pub matches: Vec<ElimMatch>,
}

/// Downstream slot that receives a match winner.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SlotRef {
    pub round: usize,
    pub match_index: usize,
    pub slot: Slot,
}

/// A single-elimination bracket aggregate.
///
/// `routing[round][match]` names the slot the winner advances to; `None`
/// marks the final. The table is built once at construction and never
/// mutated afterward.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SingleElimBracket {
    pub entrants: Vec<Entrant>,
    pub rounds: Vec<BracketRound>,
    pub routing: Vec<Vec<Option<SlotRef>>>,
}

impl SingleElimBracket {
    /// Build the bracket: consecutive round-0 pairs, an odd leftover
    /// bye-advanced straight into round 1, and empty rounds sized by halving
    /// while carrying bye-advancement counts for non-power-of-two fields.
    pub fn build(roster: &[Registrant]) -> Result<Self, TournamentError> {
        let n = roster.len();
        if n < 2 {
            return Err(TournamentError::NotEnoughParticipants {
                required: 2,
                actual: n,
            });
        }

        let entrants: Vec<Entrant> = roster
            .iter()
            .enumerate()
            .map(|(index, entry)| Entrant {
                id: index as EntrantId + 1,
                name: entry.name.clone(),
                rating: entry.rating,
            })
            .collect();

        let pairs = n / 2;
        let bye_player = if n % 2 == 1 {
            Some(entrants[2 * pairs].id)
        } else {
            None
        };

        let first_round = BracketRound {
            matches: (0..pairs)
                .map(|i| ElimMatch {
                    player1: Some(entrants[2 * i].id),
                    player2: Some(entrants[2 * i + 1].id),
                    result: None,
                })
                .collect(),
        };

        // Advancers per round: winners plus anyone bye-advanced past it.
        let mut round_sizes = vec![pairs];
        let mut advancing = pairs + usize::from(bye_player.is_some());
        while advancing > 1 {
            let matches = advancing / 2;
            let byes = advancing - 2 * matches;
            round_sizes.push(matches);
            advancing = matches + byes;
        }

        let mut rounds = vec![first_round];
        for &count in &round_sizes[1..] {
            rounds.push(BracketRound {
                matches: vec![ElimMatch::empty(); count],
            });
        }

        if let Some(bye) = bye_player {
            if let Some(target) = rounds.get_mut(1).and_then(|r| r.matches.first_mut()) {
                debug!("entrant {bye} bye-advanced into round 1");
                target.player1 = Some(bye);
            }
        }

        // Open slots in later rounds, in bracket order; winners fill them in
        // the same order their matches appear.
        let mut open_slots: Vec<SlotRef> = Vec::new();
        for (round, scheduled) in rounds.iter().enumerate().skip(1) {
            for (match_index, m) in scheduled.matches.iter().enumerate() {
                if m.player1.is_none() {
                    open_slots.push(SlotRef {
                        round,
                        match_index,
                        slot: Slot::First,
                    });
                }
                if m.player2.is_none() {
                    open_slots.push(SlotRef {
                        round,
                        match_index,
                        slot: Slot::Second,
                    });
                }
            }
        }

        let last_round = rounds.len() - 1;
        let mut routing: Vec<Vec<Option<SlotRef>>> = rounds
            .iter()
            .map(|r| vec![None; r.matches.len()])
            .collect();
        let mut next_open = open_slots.into_iter();
        for round in 0..last_round {
            for match_index in 0..rounds[round].matches.len() {
                routing[round][match_index] = Some(next_open.next().unwrap_or(SlotRef {
                    round: last_round,
                    match_index: 0,
                    slot: Slot::Second,
                }));
            }
        }

        Ok(Self {
            entrants,
            rounds,
            routing,
        })
    }

    /// Record a result and advance the winner into its routed slot. A match
    /// without a routing target is the final. Out-of-range indices or a
    /// result that names no winner (a draw, or a loss in a bye match) leave
    /// the bracket unchanged.
    #[must_use]
    pub fn record_result(&self, round: usize, match_index: usize, result: MatchResult) -> Self {
        let Some(m) = self.rounds.get(round).and_then(|r| r.matches.get(match_index)) else {
            return self.clone();
        };
        let winner = match result {
            MatchResult::Win => m.player1,
            MatchResult::Loss => m.player2,
            MatchResult::Draw => None,
        };
        let Some(winner) = winner else {
            return self.clone();
        };

        let mut next = self.clone();
        next.rounds[round].matches[match_index].result = Some(result);

        if let Some(target) = self.routing[round][match_index] {
            if let Some(slot_match) = next
                .rounds
                .get_mut(target.round)
                .and_then(|r| r.matches.get_mut(target.match_index))
            {
                match target.slot {
                    Slot::First => slot_match.player1 = Some(winner),
                    Slot::Second => slot_match.player2 = Some(winner),
                }
            }
        }
        next
    }

    /// The final has a result.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.final_match().is_some_and(|m| m.result.is_some())
    }

    /// Winner of the final, once it has one.
    #[must_use]
    pub fn champion(&self) -> Option<&Entrant> {
        let final_match = self.final_match()?;
        let id = match final_match.result? {
            MatchResult::Win => final_match.player1?,
            MatchResult::Loss => final_match.player2?,
            MatchResult::Draw => return None,
        };
        self.entrants.iter().find(|e| e.id == id)
    }

    fn final_match(&self) -> Option<&ElimMatch> {
        self.rounds.last()?.matches.first()
    }
}
