//! Integration tests for the Swiss → double-elimination orchestrator: phase
//! transitions, threshold bookkeeping, qualification, and the playoff.

#[cfg(test)]
mod swiss_de_tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tourney::elimination::{DeLocation, Winner};
    use tourney::error::TournamentError;
    use tourney::roster::Registrant;
    use tourney::swiss_de::{Phase, SwissDe, SwissDeConfig, TeamStatus};

    fn roster(n: usize) -> Vec<Registrant> {
        (0..n)
            .map(|i| Registrant::new(format!("team-{}", i + 1)))
            .collect()
    }

    fn started(seed: u64) -> SwissDe {
        let mut rng = StdRng::seed_from_u64(seed);
        SwissDe::start(&roster(8), SwissDeConfig::default(), &mut rng).unwrap()
    }

    /// Play every pending Swiss round; the lower id always wins.
    fn drive_swiss(mut tournament: SwissDe, rng: &mut StdRng) -> SwissDe {
        for _ in 0..16 {
            if tournament.is_swiss_complete() {
                break;
            }
            let round = tournament.swiss_rounds.len() - 1;
            let matches = tournament.swiss_rounds[round].matches.clone();
            for (index, m) in matches.iter().enumerate() {
                let Some(team2) = m.team2 else { continue };
                let result = if m.team1 < team2 {
                    Winner::Team1
                } else {
                    Winner::Team2
                };
                tournament = tournament.record_swiss_result(round, index, result);
            }
            tournament = tournament.complete_round(round, rng).unwrap();
        }
        tournament
    }

    #[test]
    fn test_start_validates_the_roster() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            SwissDe::start(&roster(6), SwissDeConfig::default(), &mut rng).unwrap_err(),
            TournamentError::NotEnoughParticipants {
                required: 8,
                actual: 6
            }
        );
        assert_eq!(
            SwissDe::start(&roster(12), SwissDeConfig::default(), &mut rng).unwrap_err(),
            TournamentError::NotPowerOfTwo { actual: 12 }
        );
    }

    #[test]
    fn test_start_pairs_a_full_first_round() {
        let tournament = started(3);
        assert_eq!(tournament.phase, Phase::Swiss);
        assert_eq!(tournament.swiss_rounds.len(), 1);
        assert_eq!(tournament.swiss_rounds[0].matches.len(), 4);
        assert!(tournament.swiss_rounds[0].matches.iter().all(|m| !m.is_bye()));
        for team in &tournament.teams {
            assert_eq!(team.opponents.len(), 1);
            assert_eq!(team.status, TeamStatus::Active);
        }
    }

    #[test]
    fn test_complete_round_rejects_missing_results() {
        let tournament = started(4);
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(
            tournament.complete_round(0, &mut rng).unwrap_err(),
            TournamentError::MissingResults { round: 0 }
        );
    }

    #[test]
    fn test_complete_round_updates_records_and_pairs_again() {
        let tournament = started(5);
        let mut rng = StdRng::seed_from_u64(5);

        let mut tournament = tournament;
        for index in 0..4 {
            tournament = tournament.record_swiss_result(0, index, Winner::Team1);
        }
        let tournament = tournament.complete_round(0, &mut rng).unwrap();

        assert_eq!(tournament.swiss_rounds.len(), 2);
        let wins: u32 = tournament.teams.iter().map(|t| t.wins).sum();
        let losses: u32 = tournament.teams.iter().map(|t| t.losses).sum();
        assert_eq!(wins, 4);
        assert_eq!(losses, 4);
        // Round 2 pairs winners against winners, losers against losers.
        for m in &tournament.swiss_rounds[1].matches {
            let t1 = tournament.teams.iter().find(|t| t.id == m.team1).unwrap();
            let t2 = tournament
                .teams
                .iter()
                .find(|t| Some(t.id) == m.team2)
                .unwrap();
            assert_eq!(t1.wins, t2.wins);
        }
    }

    #[test]
    fn test_completing_a_round_twice_is_a_no_op() {
        let tournament = started(23);
        let mut rng = StdRng::seed_from_u64(23);

        let mut tournament = tournament;
        for index in 0..4 {
            tournament = tournament.record_swiss_result(0, index, Winner::Team1);
        }
        let tournament = tournament.complete_round(0, &mut rng).unwrap();
        assert_eq!(tournament.swiss_rounds.len(), 2);

        // Re-completing must not double-count results or pair another round.
        let again = tournament.complete_round(0, &mut rng).unwrap();
        assert_eq!(again, tournament);
        let wins: u32 = again.teams.iter().map(|t| t.wins).sum();
        assert_eq!(wins, 4);
    }

    #[test]
    fn test_swiss_bookkeeping_stays_consistent() {
        let mut rng = StdRng::seed_from_u64(11);
        let tournament = drive_swiss(started(11), &mut rng);

        // An 8-team field with 3/3 thresholds never needs a bye, so every
        // win and loss maps to a recorded opponent.
        for team in &tournament.teams {
            assert_eq!(team.opponents.len() as u32, team.wins + team.losses);
        }
        for round in &tournament.swiss_rounds {
            let mut seen = std::collections::HashSet::new();
            for m in &round.matches {
                assert!(seen.insert(m.team1));
                assert!(seen.insert(m.team2.unwrap()));
                assert!(m.result.is_some());
            }
        }
    }

    #[test]
    fn test_swiss_stage_qualifies_exactly_half_the_field() {
        let mut rng = StdRng::seed_from_u64(7);
        let tournament = drive_swiss(started(7), &mut rng);

        assert!(tournament.is_swiss_complete());
        let qualified = tournament.qualified();
        assert_eq!(qualified.len(), 4);
        for team in &qualified {
            assert_eq!(team.wins, 3);
            assert!(team.losses < 3);
        }
        let eliminated = tournament
            .teams
            .iter()
            .filter(|t| t.status == TeamStatus::Eliminated)
            .count();
        assert_eq!(eliminated, 4);
    }

    #[test]
    fn test_qualified_is_ranked_by_buchholz() {
        let mut rng = StdRng::seed_from_u64(13);
        let tournament = drive_swiss(started(13), &mut rng);
        let buchholz: Vec<u32> = tournament.qualified().iter().map(|t| t.buchholz).collect();
        assert!(buchholz.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_start_playoff_requires_a_finished_swiss_stage() {
        let tournament = started(8);
        assert_eq!(
            tournament.start_playoff().unwrap_err(),
            TournamentError::SwissStageIncomplete
        );
    }

    #[test]
    fn test_full_tournament_produces_a_champion() {
        let mut rng = StdRng::seed_from_u64(21);
        let tournament = drive_swiss(started(21), &mut rng);
        let tournament = tournament.start_playoff().unwrap();

        assert_eq!(tournament.phase, Phase::Playoff);
        let bracket = tournament.playoff.as_ref().unwrap();
        assert_eq!(bracket.teams.len(), 4);
        // Seeds follow qualification order and are mirrored onto the teams.
        let seeded: Vec<u32> = tournament.teams.iter().filter_map(|t| t.seed).collect();
        assert_eq!(seeded.len(), 4);

        let winner = |round, match_index| DeLocation::Winner { round, match_index };
        let loser = |round, match_index| DeLocation::Loser { round, match_index };
        let tournament = tournament
            .record_playoff_result(winner(0, 0), Winner::Team1)
            .record_playoff_result(winner(0, 1), Winner::Team1)
            .record_playoff_result(loser(0, 0), Winner::Team1)
            .record_playoff_result(winner(1, 0), Winner::Team1)
            .record_playoff_result(loser(1, 0), Winner::Team1);
        assert_eq!(tournament.phase, Phase::Playoff);

        let done = tournament.record_playoff_result(DeLocation::GrandFinal, Winner::Team1);
        assert_eq!(done.phase, Phase::Finished);
        assert!(done.champion().is_some());
    }

    #[test]
    fn test_phase_guards() {
        let mut rng = StdRng::seed_from_u64(17);
        let tournament = drive_swiss(started(17), &mut rng).start_playoff().unwrap();

        assert_eq!(
            tournament.complete_round(0, &mut rng).unwrap_err(),
            TournamentError::InvalidPhase {
                expected: Phase::Swiss,
                actual: Phase::Playoff
            }
        );
        assert_eq!(
            tournament.start_playoff().unwrap_err(),
            TournamentError::InvalidPhase {
                expected: Phase::Swiss,
                actual: Phase::Playoff
            }
        );
    }

    #[test]
    fn test_playoff_results_before_the_playoff_are_no_ops() {
        let tournament = started(9);
        let same = tournament.record_playoff_result(DeLocation::GrandFinal, Winner::Team1);
        assert_eq!(same, tournament);
        assert_eq!(
            tournament.start_bracket_reset().unwrap_err(),
            TournamentError::BracketResetUnavailable
        );
    }

    #[test]
    fn test_bracket_reset_reopens_the_playoff() {
        let config = SwissDeConfig {
            bracket_reset: true,
            ..SwissDeConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(29);
        let tournament = SwissDe::start(&roster(8), config, &mut rng).unwrap();
        let tournament = drive_swiss(tournament, &mut rng).start_playoff().unwrap();

        let winner = |round, match_index| DeLocation::Winner { round, match_index };
        let loser = |round, match_index| DeLocation::Loser { round, match_index };
        let tournament = tournament
            .record_playoff_result(winner(0, 0), Winner::Team1)
            .record_playoff_result(winner(0, 1), Winner::Team1)
            .record_playoff_result(loser(0, 0), Winner::Team1)
            .record_playoff_result(winner(1, 0), Winner::Team1)
            .record_playoff_result(loser(1, 0), Winner::Team1)
            .record_playoff_result(DeLocation::GrandFinal, Winner::Team2);
        assert_eq!(tournament.phase, Phase::Finished);

        let reset = tournament.start_bracket_reset().unwrap();
        assert_eq!(reset.phase, Phase::Playoff);

        let done = reset.record_playoff_result(DeLocation::GrandFinalReset, Winner::Team1);
        assert_eq!(done.phase, Phase::Finished);
        assert!(done.champion().is_some());
    }

    #[test]
    fn test_any_tournament_reports_completion_across_formats() {
        use tourney::{AnyTournament, Progress, RoundRobin, SwissTournament};
        use tourney::round_robin::PointsConfig;

        let swiss = SwissTournament::start(&roster(8)).unwrap();
        let robin = RoundRobin::start(&roster(4), PointsConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(19);
        let hybrid = drive_swiss(started(19), &mut rng).start_playoff().unwrap();

        let events: Vec<AnyTournament> = vec![swiss.into(), robin.into(), hybrid.into()];
        assert!(events.iter().all(|event| !event.is_complete()));
    }

    #[test]
    fn test_aggregate_round_trips_through_json() {
        let mut rng = StdRng::seed_from_u64(31);
        let tournament = drive_swiss(started(31), &mut rng).start_playoff().unwrap();
        let encoded = serde_json::to_string(&tournament).unwrap();
        let decoded: SwissDe = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, tournament);
    }
}
