//! Round-robin scheduler and standings.
//!
//! The full schedule is generated up front with the circle method. Stats are
//! never kept incrementally: standings are a pure fold over the rounds the
//! caller has confirmed, which makes a rebuild idempotent and immune to
//! partially entered results.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::TournamentError;
use crate::roster::{EntrantId, Registrant};

/// Fewest participants a round-robin makes sense for.
pub const MIN_PARTICIPANTS: usize = 3;

/// Points awarded per result.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PointsConfig {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

/// Result of a two-sided match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MatchResult {
    Team1,
    Team2,
    Draw,
}

/// A persisted team entry. Stats are always derived, never stored here.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TeamEntry {
    pub id: EntrantId,
    pub name: String,
    pub seed: u32,
}

/// A team with stats rebuilt from confirmed results.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TeamStanding {
    pub id: EntrantId,
    pub name: String,
    pub seed: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
    pub opponents: Vec<EntrantId>,
}

/// A scheduled match. `team2 == None` is the only representation of a bye;
/// the virtual circle-method slot is never exposed. Bye matches carry their
/// win from generation time.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundRobinMatch {
    pub team1: EntrantId,
    pub team2: Option<EntrantId>,
    pub result: Option<MatchResult>,
}

impl RoundRobinMatch {
    #[must_use]
    pub fn is_bye(&self) -> bool {
        self.team2.is_none()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundRobinRound {
    pub matches: Vec<RoundRobinMatch>,
}

/// A round-robin tournament aggregate. Operations return new aggregates.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundRobin {
    pub teams: Vec<TeamEntry>,
    pub rounds: Vec<RoundRobinRound>,
    /// Indices of rounds whose results have been confirmed.
    pub confirmed: BTreeSet<usize>,
    pub points: PointsConfig,
}

impl RoundRobin {
    /// Start a tournament: seed the roster in order and generate the full
    /// schedule.
    pub fn start(roster: &[Registrant], points: PointsConfig) -> Result<Self, TournamentError> {
        if roster.len() < MIN_PARTICIPANTS {
            return Err(TournamentError::NotEnoughParticipants {
                required: MIN_PARTICIPANTS,
                actual: roster.len(),
            });
        }
        let teams: Vec<TeamEntry> = roster
            .iter()
            .enumerate()
            .map(|(index, entry)| TeamEntry {
                id: index as EntrantId + 1,
                name: entry.name.clone(),
                seed: index as u32 + 1,
            })
            .collect();
        let rounds = generate_schedule(&teams);
        debug!(
            "generated round-robin schedule: {} teams, {} rounds",
            teams.len(),
            rounds.len()
        );
        Ok(Self {
            teams,
            rounds,
            confirmed: BTreeSet::new(),
            points,
        })
    }

    /// Record one match result. Out-of-range indices and bye matches leave
    /// the aggregate unchanged; a draw is only valid for two-sided matches,
    /// which every non-bye match is.
    #[must_use]
    pub fn record_result(&self, round: usize, match_index: usize, result: MatchResult) -> Self {
        let mut next = self.clone();
        let Some(m) = next
            .rounds
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

    /// Confirm a round so its results count toward standings. Confirming a
    /// round with unreported results is an error; confirming a round that
    /// does not exist returns the aggregate unchanged.
    pub fn confirm_round(&self, round: usize) -> Result<Self, TournamentError> {
        let Some(scheduled) = self.rounds.get(round) else {
            return Ok(self.clone());
        };
        if scheduled
            .matches
            .iter()
            .any(|m| !m.is_bye() && m.result.is_none())
        {
            return Err(TournamentError::MissingResults { round });
        }
        let mut next = self.clone();
        next.confirmed.insert(round);
        Ok(next)
    }

    /// Rebuild every team's stats from scratch over confirmed rounds only.
    #[must_use]
    pub fn rebuild_stats(&self) -> Vec<TeamStanding> {
        #[derive(Default)]
        struct Tally {
            wins: u32,
            losses: u32,
            draws: u32,
            opponents: Vec<EntrantId>,
        }

        let mut tallies: HashMap<EntrantId, Tally> = self
            .teams
            .iter()
            .map(|t| (t.id, Tally::default()))
            .collect();

        for &round in &self.confirmed {
            let Some(scheduled) = self.rounds.get(round) else {
                continue;
            };
            for m in &scheduled.matches {
                let Some(team2) = m.team2 else {
                    // A bye counts as a win.
                    if let Some(t) = tallies.get_mut(&m.team1) {
                        t.wins += 1;
                    }
                    continue;
                };
                let Some(result) = m.result else { continue };
                if let Some(t1) = tallies.get_mut(&m.team1) {
                    t1.opponents.push(team2);
                }
                if let Some(t2) = tallies.get_mut(&team2) {
                    t2.opponents.push(m.team1);
                }
                match result {
                    MatchResult::Team1 => {
                        if let Some(t1) = tallies.get_mut(&m.team1) {
                            t1.wins += 1;
                        }
                        if let Some(t2) = tallies.get_mut(&team2) {
                            t2.losses += 1;
                        }
                    }
                    MatchResult::Team2 => {
                        if let Some(t2) = tallies.get_mut(&team2) {
                            t2.wins += 1;
                        }
                        if let Some(t1) = tallies.get_mut(&m.team1) {
                            t1.losses += 1;
                        }
                    }
                    MatchResult::Draw => {
                        if let Some(t1) = tallies.get_mut(&m.team1) {
                            t1.draws += 1;
                        }
                        if let Some(t2) = tallies.get_mut(&team2) {
                            t2.draws += 1;
                        }
                    }
                }
            }
        }

        self.teams
            .iter()
            .map(|team| {
                let tally = tallies.remove(&team.id).unwrap_or_default();
                TeamStanding {
                    id: team.id,
                    name: team.name.clone(),
                    seed: team.seed,
                    points: tally.wins * self.points.win
                        + tally.draws * self.points.draw
                        + tally.losses * self.points.loss,
                    wins: tally.wins,
                    losses: tally.losses,
                    draws: tally.draws,
                    opponents: tally.opponents,
                }
            })
            .collect()
    }

    /// Head-to-head over confirmed rounds: the winner's id, or `None` if the
    /// pair drew or never met.
    #[must_use]
    pub fn head_to_head(&self, a: EntrantId, b: EntrantId) -> Option<EntrantId> {
        for &round in &self.confirmed {
            let Some(scheduled) = self.rounds.get(round) else {
                continue;
            };
            for m in &scheduled.matches {
                let Some(team2) = m.team2 else { continue };
                let forward = m.team1 == a && team2 == b;
                let backward = m.team1 == b && team2 == a;
                if !forward && !backward {
                    continue;
                }
                return match m.result {
                    Some(MatchResult::Team1) => Some(m.team1),
                    Some(MatchResult::Team2) => Some(team2),
                    _ => None,
                };
            }
        }
        None
    }

    /// Standings: points, then opponent-strength sum, then head-to-head for
    /// an exactly-two-way tie (winner first), then original seed order.
    #[must_use]
    pub fn standings(&self) -> Vec<TeamStanding> {
        let teams = self.rebuild_stats();
        let points: HashMap<EntrantId, u32> = teams.iter().map(|t| (t.id, t.points)).collect();
        let buchholz: HashMap<EntrantId, u32> = teams
            .iter()
            .map(|t| {
                let sum = t
                    .opponents
                    .iter()
                    .map(|id| points.get(id).copied().unwrap_or(0))
                    .sum();
                (t.id, sum)
            })
            .collect();

        let strength = |id: EntrantId| buchholz.get(&id).copied().unwrap_or(0);

        let mut sorted = teams;
        sorted.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(strength(b.id).cmp(&strength(a.id)))
                .then(a.seed.cmp(&b.seed))
        });

        // Split into groups tied on both points and opponent strength.
        let mut groups: Vec<Vec<TeamStanding>> = Vec::new();
        for team in sorted {
            match groups.last_mut() {
                Some(group)
                    if group.first().is_some_and(|head| {
                        head.points == team.points && strength(head.id) == strength(team.id)
                    }) =>
                {
                    group.push(team);
                }
                _ => groups.push(vec![team]),
            }
        }

        let mut standings = Vec::new();
        for mut group in groups {
            if group.len() == 2 {
                if let Some(winner) = self.head_to_head(group[0].id, group[1].id) {
                    if winner == group[1].id {
                        group.swap(0, 1);
                    }
                }
            }
            standings.append(&mut group);
        }
        standings
    }

    /// Every scheduled round has been confirmed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        (0..self.rounds.len()).all(|round| self.confirmed.contains(&round))
    }

    /// Current leader of the standings.
    #[must_use]
    pub fn champion(&self) -> Option<TeamStanding> {
        self.standings().into_iter().next()
    }
}

/// Circle method: fix the first seed, rotate the rest each round. Odd team
/// counts get a virtual slot that turns its pairing into a bye match.
fn generate_schedule(teams: &[TeamEntry]) -> Vec<RoundRobinRound> {
    let mut seeded: Vec<&TeamEntry> = teams.iter().collect();
    seeded.sort_by_key(|t| t.seed);

    let n = seeded.len();
    let mut rotation: Vec<Option<EntrantId>> = seeded.iter().map(|t| Some(t.id)).collect();
    let round_count = if n % 2 == 0 {
        n - 1
    } else {
        rotation.push(None);
        n
    };
    let len = rotation.len();

    let mut rounds = Vec::with_capacity(round_count);
    for _ in 0..round_count {
        let mut matches = Vec::with_capacity(len / 2);
        for i in 0..len / 2 {
            match (rotation[i], rotation[len - 1 - i]) {
                (Some(a), Some(b)) => matches.push(RoundRobinMatch {
                    team1: a,
                    team2: Some(b),
                    result: None,
                }),
                (Some(a), None) | (None, Some(a)) => matches.push(RoundRobinMatch {
                    team1: a,
                    team2: None,
                    result: Some(MatchResult::Team1),
                }),
                (None, None) => {}
            }
        }
        rounds.push(RoundRobinRound { matches });
        if let Some(last) = rotation.pop() {
            rotation.insert(1, last);
        }
    }
    rounds
}
