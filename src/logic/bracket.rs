//! Bracket draw: shuffle entrants into a round of matches, with a BYE for an odd leftover.

use crate::logic::reveal::{RevealCursor, RevealMode};
use crate::models::{
    Entrant, Match, Round, RoundLabel, Slot, Tournament, TournamentError, TournamentMode,
    TournamentState,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// Fewest entrants a round can be drawn with.
pub const MIN_ENTRANTS: usize = 2;

/// Draw one round from `entrants` (a roster, pairs, or the previous round's winners).
///
/// 1. Shuffle uniformly.
/// 2. Label from the entrant count.
/// 3. Pair consecutive entrants; an odd leftover meets a BYE.
pub fn draw_round(mut entrants: Vec<Entrant>, rng: &mut impl Rng) -> Result<Round, TournamentError> {
    if entrants.len() < MIN_ENTRANTS {
        return Err(TournamentError::NotEnoughEntrants {
            required: MIN_ENTRANTS,
            actual: entrants.len(),
        });
    }
    entrants.shuffle(rng);
    let label = RoundLabel::for_entrant_count(entrants.len());

    let mut matches = Vec::with_capacity(entrants.len().div_ceil(2));
    let mut iter = entrants.into_iter();
    while let Some(a) = iter.next() {
        let b = iter.next().map(Slot::Entrant).unwrap_or(Slot::Bye);
        matches.push(Match::new(Slot::Entrant(a), b, label));
    }
    Ok(Round { label, matches })
}

/// Draw the first round from the roster (individual) or the pairs (pairs mode).
///
/// Allowed before any round exists, or to re-draw a first round nobody has scored yet.
/// Clears stats and champion of any earlier run.
pub fn draw_first_round(tournament: &mut Tournament, reveal: RevealMode) -> Result<(), TournamentError> {
    draw_first_round_with_rng(tournament, reveal, &mut rand::thread_rng())
}

pub fn draw_first_round_with_rng(
    tournament: &mut Tournament,
    reveal: RevealMode,
    rng: &mut impl Rng,
) -> Result<(), TournamentError> {
    let redraw = match tournament.rounds.as_slice() {
        [] => false,
        [first] if first.has_any_score() => return Err(TournamentError::RoundInProgress),
        [_] => true,
        _ => return Err(TournamentError::InvalidState),
    };
    if !redraw && !tournament.is_registration_open() {
        return Err(TournamentError::InvalidState);
    }
    if tournament.mode == TournamentMode::Pairs && tournament.pairs.is_empty() {
        return Err(TournamentError::PairsNotGenerated);
    }

    let round = draw_round(tournament.entrants(), rng)?;
    log::info!(
        "Tournament {}: {} drawn with {} matches",
        tournament.id,
        round.label,
        round.matches.len()
    );
    tournament.stats.clear();
    tournament.champion = None;
    tournament.match_reveal = RevealCursor::start(round.matches.len(), reveal);
    tournament.rounds = vec![round];
    tournament.state = TournamentState::RoundDrawn;
    Ok(())
}

/// Matches of the current round the presentation layer may show.
pub fn visible_matches(tournament: &Tournament) -> &[Match] {
    tournament
        .current_round()
        .map(|r| tournament.match_reveal.visible(&r.matches))
        .unwrap_or(&[])
}

/// Expose the next match of the current round (manual reveal). None once all are shown.
pub fn reveal_next_match(tournament: &mut Tournament) -> Result<Option<Match>, TournamentError> {
    let Some(round) = tournament.rounds.last() else {
        return Err(TournamentError::NoRoundDrawn);
    };
    Ok(tournament
        .match_reveal
        .advance()
        .map(|i| round.matches[i].clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn players(n: usize) -> Vec<Entrant> {
        (0..n).map(|i| Entrant::individual(format!("P{i}"))).collect()
    }

    #[test]
    fn refuses_fewer_than_two() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            draw_round(players(1), &mut rng),
            Err(TournamentError::NotEnoughEntrants { actual: 1, .. })
        ));
    }

    #[test]
    fn two_entrants_go_straight_to_final() {
        let mut rng = StdRng::seed_from_u64(0);
        let round = draw_round(players(2), &mut rng).unwrap();
        assert_eq!(round.label, RoundLabel::Final);
        assert_eq!(round.matches.len(), 1);
        assert!(!round.matches[0].is_bye());
    }

    #[test]
    fn odd_count_gets_one_bye_in_last_match() {
        let mut rng = StdRng::seed_from_u64(4);
        let round = draw_round(players(7), &mut rng).unwrap();
        assert_eq!(round.label, RoundLabel::Quarterfinal);
        assert_eq!(round.matches.len(), 4);
        assert_eq!(round.matches.iter().filter(|m| m.is_bye()).count(), 1);
        assert!(round.matches[3].slot_b.is_bye());
        assert!(round.matches.iter().all(|m| m.round == RoundLabel::Quarterfinal));
    }

    #[test]
    fn pairs_mode_labels_by_pair_count() {
        let names: Vec<String> = (0..8).map(|i| format!("P{i}")).collect();
        let mut t = Tournament::with_participants(names, TournamentMode::Pairs).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(
            draw_first_round_with_rng(&mut t, RevealMode::Auto, &mut rng),
            Err(TournamentError::PairsNotGenerated)
        );
        crate::logic::generate_pairs_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
        draw_first_round_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
        let round = t.current_round().unwrap();
        assert_eq!(round.label, RoundLabel::Semifinal);
        assert_eq!(round.matches.len(), 2);
    }

    #[test]
    fn manual_reveal_exposes_generated_order() {
        let names: Vec<String> = (0..5).map(|i| format!("P{i}")).collect();
        let mut t = Tournament::with_participants(names, TournamentMode::Individual).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        draw_first_round_with_rng(&mut t, RevealMode::Manual, &mut rng).unwrap();
        assert!(visible_matches(&t).is_empty());
        let drawn = t.current_round().unwrap().matches.clone();
        let first = reveal_next_match(&mut t).unwrap().unwrap();
        assert_eq!(first, drawn[0]);
        assert_eq!(visible_matches(&t), &drawn[..1]);
    }

    #[test]
    fn redraw_blocked_once_scored() {
        let names: Vec<String> = (0..4).map(|i| format!("P{i}")).collect();
        let mut t = Tournament::with_participants(names, TournamentMode::Individual).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        draw_first_round_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
        draw_first_round_with_rng(&mut t, RevealMode::Auto, &mut rng).unwrap();
        assert_eq!(t.rounds.len(), 1);
        t.rounds[0].matches[0].score_a = Some(1);
        assert_eq!(
            draw_first_round_with_rng(&mut t, RevealMode::Auto, &mut rng),
            Err(TournamentError::RoundInProgress)
        );
    }
}
