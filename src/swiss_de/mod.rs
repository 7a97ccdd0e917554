//! Swiss → double-elimination orchestrator.
//!
//! Teams play Swiss rounds grouped by win-loss record until everyone has
//! reached the win threshold or the loss threshold; qualifiers are ranked by
//! Buchholz, seeded, and handed to the double-elimination builder. The
//! aggregate walks `Setup -> Swiss -> Playoff -> Finished` and, like every
//! other format, each operation returns a new aggregate.

use log::{debug, info, warn};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::elimination::double::{DeLocation, DeTeam, DoubleElimBracket, Winner};
use crate::error::TournamentError;
use crate::roster::{EntrantId, Registrant};

/// Stage thresholds. Defaults mirror the classic 3-0 / 0-3 qualification
/// format over a power-of-two field.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SwissDeConfig {
    pub max_wins: u32,
    pub max_losses: u32,
    pub min_participants: usize,
    /// Allow a second grand final when the loser-bracket champion takes the
    /// first one.
    pub bracket_reset: bool,
}

impl Default for SwissDeConfig {
    fn default() -> Self {
        Self {
            max_wins: 3,
            max_losses: 3,
            min_participants: 8,
            bracket_reset: false,
        }
    }
}

/// Orchestrator phase.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Phase {
    Setup,
    Swiss,
    Playoff,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Setup => "setup",
            Self::Swiss => "swiss",
            Self::Playoff => "playoff",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Where a team stands relative to the Swiss thresholds.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TeamStatus {
    Active,
    Qualified,
    Eliminated,
}

/// A Swiss-stage team.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Team {
    pub id: EntrantId,
    pub name: String,
    pub rating: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    /// Sum of opponents' wins; the qualification tie-break.
    pub buchholz: u32,
    pub opponents: Vec<EntrantId>,
    pub seed: Option<u32>,
    pub status: TeamStatus,
}

/// A Swiss-stage pairing; a missing second team is a bye, already scored as
/// a win at generation time.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TeamMatch {
    pub team1: EntrantId,
    pub team2: Option<EntrantId>,
    pub result: Option<Winner>,
}

impl TeamMatch {
    #[must_use]
    pub fn is_bye(&self) -> bool {
        self.team2.is_none()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SwissDeRound {
    pub matches: Vec<TeamMatch>,
}

/// The hybrid Swiss → double-elimination aggregate.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SwissDe {
    pub config: SwissDeConfig,
    pub phase: Phase,
    pub teams: Vec<Team>,
    pub swiss_rounds: Vec<SwissDeRound>,
    /// Indices of Swiss rounds whose results have been applied.
    pub completed: BTreeSet<usize>,
    pub playoff: Option<DoubleElimBracket>,
}

impl SwissDe {
    /// Validate the roster and pair the first Swiss round.
    pub fn start(
        roster: &[Registrant],
        config: SwissDeConfig,
        rng: &mut impl Rng,
    ) -> Result<Self, TournamentError> {
        if roster.len() < config.min_participants {
            return Err(TournamentError::NotEnoughParticipants {
                required: config.min_participants,
                actual: roster.len(),
            });
        }
        if !roster.len().is_power_of_two() {
            return Err(TournamentError::NotPowerOfTwo {
                actual: roster.len(),
            });
        }

        let teams: Vec<Team> = roster
            .iter()
            .enumerate()
            .map(|(index, entry)| Team {
                id: index as EntrantId + 1,
                name: entry.name.clone(),
                rating: entry.rating,
                wins: 0,
                losses: 0,
                buchholz: 0,
                opponents: Vec::new(),
                seed: None,
                status: TeamStatus::Active,
            })
            .collect();

        let (round, teams) = pair_round(&teams, config, rng);
        info!("swiss stage started with {} teams", teams.len());
        Ok(Self {
            config,
            phase: Phase::Swiss,
            teams,
            swiss_rounds: vec![round],
            completed: BTreeSet::new(),
            playoff: None,
        })
    }

    /// Record one Swiss match result. Out-of-range indices and bye matches
    /// leave the aggregate unchanged.
    #[must_use]
    pub fn record_swiss_result(&self, round: usize, match_index: usize, result: Winner) -> Self {
        let mut next = self.clone();
        let Some(m) = next
            .swiss_rounds
            .get_mut(round)
            .and_then(|r| r.matches.get_mut(match_index))
        else {
            return self.clone();
        };
        if m.is_bye() {
            return self.clone();
        }
        m.result = Some(result);
        next
    }

    /// Apply a round's results, update records, Buchholz, and statuses, and
    /// pair the next round unless the Swiss stage is over.
    ///
    /// Completing a round that does not exist, or one already completed,
    /// returns the aggregate unchanged; completing one with unreported
    /// results is an error.
    pub fn complete_round(
        &self,
        round_index: usize,
        rng: &mut impl Rng,
    ) -> Result<Self, TournamentError> {
        if self.phase != Phase::Swiss {
            return Err(TournamentError::InvalidPhase {
                expected: Phase::Swiss,
                actual: self.phase,
            });
        }
        if self.completed.contains(&round_index) {
            return Ok(self.clone());
        }
        let Some(round) = self.swiss_rounds.get(round_index) else {
            return Ok(self.clone());
        };
        if round
            .matches
            .iter()
            .any(|m| !m.is_bye() && m.result.is_none())
        {
            return Err(TournamentError::MissingResults { round: round_index });
        }

        let mut by_id: HashMap<EntrantId, Team> =
            self.teams.iter().map(|t| (t.id, t.clone())).collect();

        for m in &round.matches {
            let Some(team2) = m.team2 else { continue };
            match m.result {
                Some(Winner::Team1) => {
                    if let Some(t1) = by_id.get_mut(&m.team1) {
                        t1.wins += 1;
                    }
                    if let Some(t2) = by_id.get_mut(&team2) {
                        t2.losses += 1;
                    }
                }
                Some(Winner::Team2) => {
                    if let Some(t2) = by_id.get_mut(&team2) {
                        t2.wins += 1;
                    }
                    if let Some(t1) = by_id.get_mut(&m.team1) {
                        t1.losses += 1;
                    }
                }
                None => {}
            }
        }

        let wins: HashMap<EntrantId, u32> = by_id.values().map(|t| (t.id, t.wins)).collect();
        for team in by_id.values_mut() {
            team.buchholz = team
                .opponents
                .iter()
                .map(|id| wins.get(id).copied().unwrap_or(0))
                .sum();
            team.status = if team.wins >= self.config.max_wins {
                TeamStatus::Qualified
            } else if team.losses >= self.config.max_losses {
                TeamStatus::Eliminated
            } else {
                TeamStatus::Active
            };
        }

        let mut teams: Vec<Team> = self
            .teams
            .iter()
            .map(|t| by_id.get(&t.id).cloned().unwrap_or_else(|| t.clone()))
            .collect();

        let mut completed = self.completed.clone();
        completed.insert(round_index);

        let mut swiss_rounds = self.swiss_rounds.clone();
        if !is_swiss_complete(&teams, self.config) {
            let (next_round, updated) = pair_round(&teams, self.config, rng);
            debug!(
                "paired swiss round {} with {} matches",
                swiss_rounds.len(),
                next_round.matches.len()
            );
            swiss_rounds.push(next_round);
            teams = updated;
        } else {
            info!("swiss stage complete, playoff can start");
        }

        Ok(Self {
            config: self.config,
            phase: Phase::Swiss,
            teams,
            swiss_rounds,
            completed,
            playoff: None,
        })
    }

    /// Every team has hit the win or loss threshold.
    #[must_use]
    pub fn is_swiss_complete(&self) -> bool {
        is_swiss_complete(&self.teams, self.config)
    }

    /// Qualified teams ranked by Buchholz, best first.
    #[must_use]
    pub fn qualified(&self) -> Vec<&Team> {
        let mut qualified: Vec<&Team> = self
            .teams
            .iter()
            .filter(|t| t.wins >= self.config.max_wins)
            .collect();
        qualified.sort_by(|a, b| b.buchholz.cmp(&a.buchholz));
        qualified
    }

    /// Seed the qualifiers and hand them to the double-elimination builder.
    ///
    /// The qualifier count must itself be a power of two; this cross-stage
    /// check belongs to the orchestrator and runs before the builder's own
    /// validation.
    pub fn start_playoff(&self) -> Result<Self, TournamentError> {
        if self.phase != Phase::Swiss {
            return Err(TournamentError::InvalidPhase {
                expected: Phase::Swiss,
                actual: self.phase,
            });
        }
        if !self.is_swiss_complete() {
            return Err(TournamentError::SwissStageIncomplete);
        }

        let qualified = self.qualified();
        let q = qualified.len();
        if q < 2 || !q.is_power_of_two() {
            return Err(TournamentError::QualifierCountNotPowerOfTwo { actual: q });
        }

        let seeds: HashMap<EntrantId, u32> = qualified
            .iter()
            .enumerate()
            .map(|(index, team)| (team.id, index as u32 + 1))
            .collect();
        let seeded: Vec<DeTeam> = qualified
            .iter()
            .enumerate()
            .map(|(index, team)| DeTeam {
                id: team.id,
                name: team.name.clone(),
                seed: index as u32 + 1,
            })
            .collect();

        let playoff = DoubleElimBracket::build(seeded, self.config.bracket_reset)?;

        let teams: Vec<Team> = self
            .teams
            .iter()
            .map(|t| {
                let mut team = t.clone();
                team.seed = seeds.get(&t.id).copied();
                team
            })
            .collect();

        info!("playoff started with {q} qualifiers");
        Ok(Self {
            config: self.config,
            phase: Phase::Playoff,
            teams,
            swiss_rounds: self.swiss_rounds.clone(),
            completed: self.completed.clone(),
            playoff: Some(playoff),
        })
    }

    /// Record a playoff result; completion of the (possibly reset) grand
    /// final finishes the tournament. Without a running playoff the
    /// aggregate is returned unchanged.
    #[must_use]
    pub fn record_playoff_result(&self, location: DeLocation, result: Winner) -> Self {
        let Some(playoff) = &self.playoff else {
            return self.clone();
        };
        let playoff = playoff.record_result(location, result);
        let phase = if playoff.is_complete() {
            info!(
                "tournament finished, champion: {}",
                playoff.champion().map_or("unknown", |t| t.name.as_str())
            );
            Phase::Finished
        } else {
            Phase::Playoff
        };
        Self {
            config: self.config,
            phase,
            teams: self.teams.clone(),
            swiss_rounds: self.swiss_rounds.clone(),
            completed: self.completed.clone(),
            playoff: Some(playoff),
        }
    }

    /// Start the optional second grand final. Reopens the playoff phase.
    pub fn start_bracket_reset(&self) -> Result<Self, TournamentError> {
        let Some(playoff) = &self.playoff else {
            return Err(TournamentError::BracketResetUnavailable);
        };
        let playoff = playoff.start_reset()?;
        Ok(Self {
            config: self.config,
            phase: Phase::Playoff,
            teams: self.teams.clone(),
            swiss_rounds: self.swiss_rounds.clone(),
            completed: self.completed.clone(),
            playoff: Some(playoff),
        })
    }

    /// The playoff champion, once the tournament is finished.
    #[must_use]
    pub fn champion(&self) -> Option<&Team> {
        let id = self.playoff.as_ref()?.champion()?.id;
        self.teams.iter().find(|t| t.id == id)
    }
}

fn is_swiss_complete(teams: &[Team], config: SwissDeConfig) -> bool {
    teams
        .iter()
        .all(|t| t.wins >= config.max_wins || t.losses >= config.max_losses)
}

/// Pair one Swiss round: group active teams by win-loss differential, pair
/// within each group avoiding rematches, float the leftovers into a
/// cross-group pool, force-pair any stubborn remainder, and award a bye if
/// an odd team is still standing.
fn pair_round(
    teams: &[Team],
    config: SwissDeConfig,
    rng: &mut impl Rng,
) -> (SwissDeRound, Vec<Team>) {
    let mut by_id: HashMap<EntrantId, Team> = teams.iter().map(|t| (t.id, t.clone())).collect();
    let opponents: HashMap<EntrantId, HashSet<EntrantId>> = teams
        .iter()
        .map(|t| (t.id, t.opponents.iter().copied().collect()))
        .collect();

    // Score groups, highest differential first.
    let mut groups: BTreeMap<i64, Vec<EntrantId>> = BTreeMap::new();
    for team in teams {
        if team.wins >= config.max_wins || team.losses >= config.max_losses {
            continue;
        }
        let differential = i64::from(team.wins) - i64::from(team.losses);
        groups.entry(differential).or_default().push(team.id);
    }

    let mut pairs: Vec<(EntrantId, EntrantId)> = Vec::new();
    let mut floaters: Vec<EntrantId> = Vec::new();
    for ids in groups.values().rev() {
        let (mut group_pairs, mut unpaired) = pair_pool(ids, &opponents, rng, false);
        pairs.append(&mut group_pairs);
        floaters.append(&mut unpaired);
    }

    if !floaters.is_empty() {
        let (mut float_pairs, unpaired) = pair_pool(&floaters, &opponents, rng, true);
        pairs.append(&mut float_pairs);
        floaters = unpaired;
    }

    for &(id1, id2) in &pairs {
        if let Some(t1) = by_id.get_mut(&id1) {
            t1.opponents.push(id2);
        }
        if let Some(t2) = by_id.get_mut(&id2) {
            t2.opponents.push(id1);
        }
    }

    let mut matches: Vec<TeamMatch> = pairs
        .iter()
        .map(|&(id1, id2)| TeamMatch {
            team1: id1,
            team2: Some(id2),
            result: None,
        })
        .collect();

    let bye = match floaters.len() {
        0 => None,
        1 => Some(floaters[0]),
        _ => floaters.choose(rng).copied(),
    };
    if let Some(bye_id) = bye {
        if let Some(team) = by_id.get_mut(&bye_id) {
            debug!("team {bye_id} receives a bye");
            team.wins += 1;
            matches.push(TeamMatch {
                team1: bye_id,
                team2: None,
                result: Some(Winner::Team1),
            });
        }
    }

    let updated = teams
        .iter()
        .map(|t| by_id.remove(&t.id).unwrap_or_else(|| t.clone()))
        .collect();
    (SwissDeRound { matches }, updated)
}

/// Greedy rematch-avoiding pairing over a shuffled pool. With `forced` set,
/// leftovers are paired off regardless of history as a last resort.
fn pair_pool(
    ids: &[EntrantId],
    opponents: &HashMap<EntrantId, HashSet<EntrantId>>,
    rng: &mut impl Rng,
    forced: bool,
) -> (Vec<(EntrantId, EntrantId)>, Vec<EntrantId>) {
    let mut list = ids.to_vec();
    list.shuffle(rng);

    let mut pairs: Vec<(EntrantId, EntrantId)> = Vec::new();
    let mut used: HashSet<EntrantId> = HashSet::new();

    for &id1 in &list {
        if used.contains(&id1) {
            continue;
        }
        let faced = opponents.get(&id1);
        let found = list.iter().copied().find(|&id2| {
            id2 != id1 && !used.contains(&id2) && !faced.is_some_and(|f| f.contains(&id2))
        });
        if let Some(id2) = found {
            pairs.push((id1, id2));
            used.insert(id1);
            used.insert(id2);
        }
    }

    let mut unpaired: Vec<EntrantId> = list.iter().copied().filter(|id| !used.contains(id)).collect();

    if forced && unpaired.len() >= 2 {
        for chunk in unpaired.chunks(2) {
            if let [id1, id2] = *chunk {
                warn!("forcing rematch pairing between {id1} and {id2}");
                pairs.push((id1, id2));
                used.insert(id1);
                used.insert(id2);
            }
        }
        unpaired.retain(|id| !used.contains(id));
    }

    (pairs, unpaired)
}
