//! Integration tests for the round-robin scheduler: circle-method coverage,
//! byes, confirmation gating, and standings tie-breaks.

#[cfg(test)]
mod round_robin_tests {
    use std::collections::HashSet;
    use tourney::error::TournamentError;
    use tourney::roster::{EntrantId, Registrant};
    use tourney::round_robin::{MatchResult, PointsConfig, RoundRobin};

    fn roster(n: usize) -> Vec<Registrant> {
        (0..n)
            .map(|i| Registrant::new(format!("team-{}", i + 1)))
            .collect()
    }

    #[test]
    fn test_start_requires_three_teams() {
        let result = RoundRobin::start(&roster(2), PointsConfig::default());
        assert_eq!(
            result.unwrap_err(),
            TournamentError::NotEnoughParticipants {
                required: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_even_schedule_covers_every_pair_once() {
        let tournament = RoundRobin::start(&roster(6), PointsConfig::default()).unwrap();

        assert_eq!(tournament.rounds.len(), 5);
        let mut seen: HashSet<(EntrantId, EntrantId)> = HashSet::new();
        for round in &tournament.rounds {
            assert_eq!(round.matches.len(), 3);
            for m in &round.matches {
                let b = m.team2.expect("even schedules have no byes");
                let pair = (m.team1.min(b), m.team1.max(b));
                assert!(seen.insert(pair), "pair {pair:?} scheduled twice");
            }
        }
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn test_odd_schedule_gives_one_bye_per_round() {
        let tournament = RoundRobin::start(&roster(5), PointsConfig::default()).unwrap();

        assert_eq!(tournament.rounds.len(), 5);
        let mut bye_teams = Vec::new();
        for round in &tournament.rounds {
            let byes: Vec<_> = round.matches.iter().filter(|m| m.is_bye()).collect();
            assert_eq!(byes.len(), 1);
            assert_eq!(byes[0].result, Some(MatchResult::Team1));
            bye_teams.push(byes[0].team1);
        }
        // Everyone sits out exactly once.
        bye_teams.sort_unstable();
        assert_eq!(bye_teams, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_confirm_round_rejects_missing_results() {
        let tournament = RoundRobin::start(&roster(4), PointsConfig::default()).unwrap();
        let partial = tournament.record_result(0, 0, MatchResult::Team1);
        assert_eq!(
            partial.confirm_round(0).unwrap_err(),
            TournamentError::MissingResults { round: 0 }
        );
    }

    #[test]
    fn test_confirm_nonexistent_round_is_a_no_op() {
        let tournament = RoundRobin::start(&roster(4), PointsConfig::default()).unwrap();
        let same = tournament.confirm_round(9).unwrap();
        assert_eq!(same, tournament);
    }

    #[test]
    fn test_unconfirmed_results_do_not_count() {
        let tournament = RoundRobin::start(&roster(4), PointsConfig::default()).unwrap();
        let tournament = tournament
            .record_result(0, 0, MatchResult::Team1)
            .record_result(0, 1, MatchResult::Team1);

        let before: Vec<u32> = tournament.rebuild_stats().iter().map(|t| t.points).collect();
        assert_eq!(before, vec![0, 0, 0, 0]);

        let confirmed = tournament.confirm_round(0).unwrap();
        let after: u32 = confirmed.rebuild_stats().iter().map(|t| t.points).sum();
        assert_eq!(after, 6);
    }

    #[test]
    fn test_perfect_winner_scores_win_value_per_match() {
        let mut tournament = RoundRobin::start(&roster(4), PointsConfig::default()).unwrap();
        for round in 0..tournament.rounds.len() {
            for (index, m) in tournament.rounds[round].matches.clone().iter().enumerate() {
                let result = if m.team1 == 1 {
                    MatchResult::Team1
                } else if m.team2 == Some(1) {
                    MatchResult::Team2
                } else {
                    MatchResult::Draw
                };
                tournament = tournament.record_result(round, index, result);
            }
            tournament = tournament.confirm_round(round).unwrap();
        }

        let standings = tournament.standings();
        assert_eq!(standings[0].id, 1);
        assert_eq!(standings[0].wins, 3);
        assert_eq!(standings[0].points, 3 * PointsConfig::default().win);
        assert_eq!(tournament.champion().unwrap().id, 1);
    }

    #[test]
    fn test_rebuild_stats_is_idempotent() {
        let tournament = confirmed_tournament();
        assert_eq!(tournament.rebuild_stats(), tournament.rebuild_stats());
    }

    #[test]
    fn test_bye_counts_as_a_win() {
        let mut tournament = RoundRobin::start(&roster(3), PointsConfig::default()).unwrap();
        for round in 0..tournament.rounds.len() {
            for (index, m) in tournament.rounds[round].matches.clone().iter().enumerate() {
                if !m.is_bye() {
                    tournament = tournament.record_result(round, index, MatchResult::Draw);
                }
            }
            tournament = tournament.confirm_round(round).unwrap();
        }
        for standing in tournament.rebuild_stats() {
            assert_eq!(standing.wins, 1);
            assert_eq!(standing.draws, 2);
            // 3 for the bye plus 1 per draw.
            assert_eq!(standing.points, 5);
        }
    }

    /// Four teams, every match played and confirmed, with results picked so
    /// the top two tie on points and opponent strength:
    /// team 2 beats team 1 directly, team 3 beats team 4 directly.
    fn confirmed_tournament() -> RoundRobin {
        let desired = |a: EntrantId, b: EntrantId| -> MatchResult {
            let winner = match (a.min(b), a.max(b)) {
                (1, 2) => 2,
                (1, 3) => 1,
                (1, 4) => 1,
                (2, 3) => 2,
                (2, 4) => 4,
                (3, 4) => 3,
                _ => unreachable!("unknown pairing"),
            };
            if winner == a {
                MatchResult::Team1
            } else {
                MatchResult::Team2
            }
        };

        let mut tournament = RoundRobin::start(&roster(4), PointsConfig::default()).unwrap();
        for round in 0..tournament.rounds.len() {
            for (index, m) in tournament.rounds[round].matches.clone().iter().enumerate() {
                let team2 = m.team2.unwrap();
                tournament = tournament.record_result(round, index, desired(m.team1, team2));
            }
            tournament = tournament.confirm_round(round).unwrap();
        }
        tournament
    }

    #[test]
    fn test_two_way_tie_breaks_by_head_to_head_winner_first() {
        let tournament = confirmed_tournament();
        assert!(tournament.is_complete());

        // 1 and 2 finish 2-1 on equal opponent strength; 2 won the direct
        // match and outranks the better seed. Same for 3 over 4.
        let order: Vec<EntrantId> = tournament.standings().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![2, 1, 3, 4]);
        assert_eq!(tournament.champion().unwrap().id, 2);
    }

    #[test]
    fn test_head_to_head_reports_the_direct_winner() {
        let tournament = confirmed_tournament();
        assert_eq!(tournament.head_to_head(1, 2), Some(2));
        assert_eq!(tournament.head_to_head(2, 1), Some(2));
        assert_eq!(tournament.head_to_head(1, 3), Some(1));
    }

    #[test]
    fn test_head_to_head_none_for_draws() {
        let tournament = RoundRobin::start(&roster(4), PointsConfig::default()).unwrap();
        let tournament = tournament
            .record_result(0, 0, MatchResult::Draw)
            .record_result(0, 1, MatchResult::Draw)
            .confirm_round(0)
            .unwrap();
        let m = &tournament.rounds[0].matches[0];
        assert_eq!(tournament.head_to_head(m.team1, m.team2.unwrap()), None);
    }

    #[test]
    fn test_record_result_out_of_range_is_a_no_op() {
        let tournament = RoundRobin::start(&roster(4), PointsConfig::default()).unwrap();
        let same = tournament.record_result(9, 0, MatchResult::Team1);
        assert_eq!(same, tournament);
    }

    #[test]
    fn test_aggregate_round_trips_through_json() {
        let tournament = confirmed_tournament();
        let encoded = serde_json::to_string(&tournament).unwrap();
        let decoded: RoundRobin = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, tournament);
    }
}
