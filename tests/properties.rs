//! Property tests for pairing, round generation, BYE handling, stats and standings.

use club_cup_web::logic::draw_round;
use club_cup_web::{
    accumulate_stats, pair_participants, round_winners, Entrant, Match, RoundLabel, Slot,
    StatsRecord, StatsTable,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("P{i}")).collect()
}

fn entrants(n: usize) -> Vec<Entrant> {
    names(n).into_iter().map(Entrant::Individual).collect()
}

proptest! {
    #[test]
    fn pairing_covers_everyone_once(n in 4usize..40, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairs = pair_participants(&names(n), &mut rng).unwrap();
        prop_assert_eq!(pairs.len(), n.div_ceil(2));
        prop_assert_eq!(pairs.iter().filter(|p| p.has_bye_member()).count(), n % 2);

        let members: Vec<_> = pairs
            .iter()
            .flat_map(|p| [p.member_a.clone(), p.member_b.clone()])
            .filter(|m| m != "BYE")
            .collect();
        let unique: HashSet<_> = members.iter().cloned().collect();
        prop_assert_eq!(members.len(), n);
        prop_assert_eq!(unique, names(n).into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn round_has_ceil_half_matches_and_one_bye_iff_odd(n in 2usize..70, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let round = draw_round(entrants(n), &mut rng).unwrap();
        prop_assert_eq!(round.matches.len(), n.div_ceil(2));
        prop_assert_eq!(round.matches.iter().filter(|m| m.is_bye()).count(), n % 2);
        prop_assert_eq!(round.label, RoundLabel::for_entrant_count(n));
    }

    #[test]
    fn bracket_terminates_in_ceil_log2_rounds(n in 2usize..70, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut current = entrants(n);
        let mut rounds = 0u32;
        while current.len() > 1 {
            let mut round = draw_round(current.clone(), &mut rng).unwrap();
            for m in &mut round.matches {
                m.score_a = Some(1);
                m.score_b = Some(0);
            }
            let winners = round_winners(&round).unwrap();
            prop_assert!(winners.len() <= round.matches.len());
            prop_assert!(winners.len() < current.len());
            current = winners;
            rounds += 1;
        }
        let expected = usize::BITS - (n - 1).leading_zeros();
        prop_assert_eq!(rounds, expected);
    }

    #[test]
    fn bye_always_advances_the_real_slot(a in 0u32..20, b in 0u32..20, bye_first in any::<bool>()) {
        let player = Entrant::individual("Solo");
        let (slot_a, slot_b) = if bye_first {
            (Slot::Bye, Slot::Entrant(player.clone()))
        } else {
            (Slot::Entrant(player.clone()), Slot::Bye)
        };
        let mut m = Match::new(slot_a, slot_b, RoundLabel::Final);
        m.score_a = Some(a);
        m.score_b = Some(b);
        prop_assert_eq!(m.winner(), Some(&player));
    }

    #[test]
    fn goal_diff_is_sum_of_match_margins(
        games in prop::collection::vec((0usize..5, 0usize..5, 0u32..10, 0u32..10), 0..40)
    ) {
        let people = entrants(5);
        let mut expected: HashMap<String, i64> = HashMap::new();
        let matches: Vec<Match> = games
            .iter()
            .filter(|(a, b, _, _)| a != b)
            .map(|&(a, b, sa, sb)| {
                *expected.entry(people[a].identity_key()).or_default() += i64::from(sa) - i64::from(sb);
                *expected.entry(people[b].identity_key()).or_default() += i64::from(sb) - i64::from(sa);
                let mut m = Match::new(people[a].clone().into(), people[b].clone().into(), RoundLabel::Final);
                m.score_a = Some(sa);
                m.score_b = Some(sb);
                m
            })
            .collect();

        let mut stats = StatsTable::new();
        // Split in two batches to exercise merging into an existing table.
        let (first, second) = matches.split_at(matches.len() / 2);
        accumulate_stats(first, &mut stats);
        accumulate_stats(second, &mut stats);

        for (name, diff) in expected {
            prop_assert_eq!(stats.get(&name).map(StatsRecord::goal_diff), Some(diff));
        }
    }

    #[test]
    fn standings_are_sorted_and_stable(
        records in prop::collection::vec((0u32..4, 0u32..6, 0u32..6), 1..25)
    ) {
        let mut table = StatsTable::new();
        for (i, &(wins, gf, ga)) in records.iter().enumerate() {
            *table.entry(&format!("E{i:02}")) = StatsRecord {
                wins,
                goals_for: gf,
                goals_against: ga,
                ..StatsRecord::default()
            };
        }
        let rows = table.standings();
        prop_assert_eq!(rows.len(), records.len());
        for pair in rows.windows(2) {
            let (x, y) = (&pair[0], &pair[1]);
            let kx = (x.record.wins, x.goal_diff, x.record.goals_for);
            let ky = (y.record.wins, y.goal_diff, y.record.goals_for);
            prop_assert!(kx >= ky);
            if kx == ky {
                prop_assert!(x.entrant < y.entrant, "ties keep insertion order");
            }
        }
    }
}

#[test]
fn two_matches_for_one_player_sum_up() {
    let a = Entrant::individual("A");
    let mut win = Match::new(a.clone().into(), Entrant::individual("B").into(), RoundLabel::Semifinal);
    win.score_a = Some(3);
    win.score_b = Some(1);
    let mut loss = Match::new(Entrant::individual("C").into(), a.into(), RoundLabel::Final);
    loss.score_a = Some(2);
    loss.score_b = Some(0);

    let mut stats = StatsTable::new();
    accumulate_stats(&[win, loss], &mut stats);
    assert_eq!(
        stats.get("A"),
        Some(&StatsRecord {
            wins: 1,
            losses: 1,
            goals_for: 3,
            goals_against: 3,
            club: None,
        })
    );
}
