//! Integration tests for pairs mode: pairing, club draw and team statistics.

use club_cup_web::logic::{
    assign_clubs_with_rng, draw_first_round_with_rng, generate_pairs_with_rng,
    submit_round_with_rng,
};
use club_cup_web::{
    club_assignments, record_score, reveal_next_club, Entrant, RevealMode, Tournament,
    TournamentError, TournamentMode, TournamentState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn pairs_tournament(players: usize, clubs: usize) -> Tournament {
    let mut t = Tournament::new(TournamentMode::Pairs);
    for i in 0..players {
        t.add_participant(format!("P{i}")).unwrap();
    }
    for i in 0..clubs {
        t.add_club(format!("Club {i}")).unwrap();
    }
    t
}

#[test]
fn eight_players_four_clubs_is_a_bijection() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut t = pairs_tournament(8, 4);
    generate_pairs_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
    assert_eq!(t.pairs.len(), 4);

    let members: HashSet<_> = t
        .pairs
        .iter()
        .flat_map(|p| [p.member_a.clone(), p.member_b.clone()])
        .collect();
    assert_eq!(members.len(), 8);

    assign_clubs_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
    assert_eq!(t.state, TournamentState::ClubsAssigned);
    let clubs: HashSet<_> = t.pairs.iter().map(|p| p.club.clone()).collect();
    assert_eq!(clubs.len(), 4);
    assert!(t.pairs.iter().all(|p| !p.club.is_empty()));
}

#[test]
fn too_few_players_to_pair() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut t = pairs_tournament(3, 0);
    assert_eq!(
        generate_pairs_with_rng(&mut t, RevealMode::Auto, &mut rng),
        Err(TournamentError::NotEnoughParticipants { required: 4, actual: 3 })
    );
    assert!(t.pairs.is_empty());
}

#[test]
fn club_shortage_leaves_pairs_clubless_without_blocking() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut t = pairs_tournament(6, 2);
    generate_pairs_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
    assign_clubs_with_rng(&mut t, RevealMode::Manual, &mut rng).unwrap();

    let mut revealed = Vec::new();
    while let Some(r) = reveal_next_club(&mut t).unwrap() {
        revealed.push(r);
    }
    assert_eq!(revealed, club_assignments(&t));
    assert_eq!(revealed.iter().filter(|r| r.club.is_none()).count(), 1);

    draw_first_round_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
    assert_eq!(t.state, TournamentState::RoundDrawn);
}

#[test]
fn team_stats_carry_club_and_pair_name() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut t = pairs_tournament(4, 2);
    generate_pairs_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
    assign_clubs_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
    draw_first_round_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();

    let m = t.current_round().unwrap().matches[0].clone();
    record_score(&mut t, m.id, 4, 2).unwrap();
    submit_round_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();

    assert_eq!(t.state, TournamentState::Completed);
    let Some(Entrant::Team(winner)) = t.champion.clone() else {
        panic!("champion should be a pair");
    };
    let rec = t.stats.get(&winner.display_name()).unwrap();
    assert_eq!((rec.wins, rec.goals_for, rec.goals_against), (1, 4, 2));
    assert_eq!(rec.club.as_deref(), Some(winner.club.as_str()));
}

#[test]
fn odd_players_make_a_bye_pair_that_still_competes() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut t = pairs_tournament(5, 0);
    generate_pairs_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
    assert_eq!(t.pairs.len(), 3);
    assert!(t.pairs[2].has_bye_member());
    draw_first_round_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
    let entrants: usize = t
        .current_round()
        .unwrap()
        .matches
        .iter()
        .map(|m| [&m.slot_a, &m.slot_b].iter().filter(|s| !s.is_bye()).count())
        .sum();
    assert_eq!(entrants, 3);
}
