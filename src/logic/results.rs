//! Score entry, winner resolution, statistics and advancing to the next round.

use crate::logic::bracket::draw_round;
use crate::logic::reveal::{RevealCursor, RevealMode};
use crate::models::{
    Entrant, Match, MatchId, MatchOutcome, Round, StatsTable, Tournament, TournamentError,
    TournamentState,
};
use rand::Rng;

/// Highest score a single match side may record.
pub const MAX_SCORE: u32 = 999;

/// Winners of `round` in match order.
///
/// A BYE advances the other slot whatever the scores say. Fails if any played match
/// is missing a score or is tied, so no slot is ever advanced by default.
pub fn round_winners(round: &Round) -> Result<Vec<Entrant>, TournamentError> {
    let pending: Vec<usize> = round
        .matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.outcome() == MatchOutcome::Pending)
        .map(|(i, _)| i)
        .collect();
    if !pending.is_empty() {
        return Err(TournamentError::IncompleteResults { pending });
    }
    if let Some(index) = round
        .matches
        .iter()
        .position(|m| m.outcome() == MatchOutcome::Tied)
    {
        return Err(TournamentError::TiedMatch { index });
    }
    Ok(round
        .matches
        .iter()
        .filter_map(|m| m.winner().cloned())
        .collect())
}

/// Fold played matches into `stats`.
///
/// Only matches with both scores and no BYE count. Winner gets a win and loser a loss
/// (nothing on a tie); each side adds its own score to goals for and the opponent's to
/// goals against. A team's club is rewritten on every match it plays.
pub fn accumulate_stats(matches: &[Match], stats: &mut StatsTable) {
    for m in matches {
        let (Some(a), Some(b)) = (m.slot_a.entrant(), m.slot_b.entrant()) else {
            continue;
        };
        let Some((score_a, score_b)) = m.scores() else {
            continue;
        };
        apply_side(stats, a, score_a, score_b);
        apply_side(stats, b, score_b, score_a);
    }
}

fn apply_side(stats: &mut StatsTable, entrant: &Entrant, own: u32, other: u32) {
    let record = stats.entry(&entrant.identity_key());
    if own > other {
        record.wins += 1;
    } else if own < other {
        record.losses += 1;
    }
    record.goals_for = record.goals_for.saturating_add(own);
    record.goals_against = record.goals_against.saturating_add(other);
    if let Some(club) = entrant.club() {
        record.club = Some(club.to_string());
    }
}

/// Record both scores of one match in the current round. Each score is at most [`MAX_SCORE`].
pub fn record_score(
    tournament: &mut Tournament,
    match_id: MatchId,
    score_a: u32,
    score_b: u32,
) -> Result<(), TournamentError> {
    if score_a > MAX_SCORE || score_b > MAX_SCORE {
        return Err(TournamentError::ScoreOutOfRange { max: MAX_SCORE });
    }
    if !matches!(
        tournament.state,
        TournamentState::RoundDrawn | TournamentState::ScoresEntered
    ) {
        return Err(TournamentError::InvalidState);
    }
    let round = tournament
        .current_round_mut()
        .ok_or(TournamentError::NoRoundDrawn)?;
    let m = round
        .get_match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    m.score_a = Some(score_a);
    m.score_b = Some(score_b);
    let all_scored = round.all_scored();
    tournament.state = if all_scored {
        TournamentState::ScoresEntered
    } else {
        TournamentState::RoundDrawn
    };
    Ok(())
}

/// Resolve the current round: update stats, then crown the champion or draw the next round
/// from the winners. `reveal` applies to the next round's matches.
pub fn submit_round(tournament: &mut Tournament, reveal: RevealMode) -> Result<(), TournamentError> {
    submit_round_with_rng(tournament, reveal, &mut rand::thread_rng())
}

pub fn submit_round_with_rng(
    tournament: &mut Tournament,
    reveal: RevealMode,
    rng: &mut impl Rng,
) -> Result<(), TournamentError> {
    if !matches!(
        tournament.state,
        TournamentState::RoundDrawn | TournamentState::ScoresEntered
    ) {
        return Err(TournamentError::InvalidState);
    }
    let round = tournament
        .current_round()
        .ok_or(TournamentError::NoRoundDrawn)?;
    let mut winners = round_winners(round)?;
    let label = round.label;
    let played = round.matches.clone();

    // Draw before touching stats so a failure leaves the tournament as it was.
    let next = match winners.len() {
        0 => return Err(TournamentError::InvalidState),
        1 => None,
        _ => Some(draw_round(winners.clone(), rng)?),
    };

    accumulate_stats(&played, &mut tournament.stats);
    log::info!(
        "Tournament {}: {} resolved, {} advancing",
        tournament.id,
        label,
        winners.len()
    );

    match next {
        None => {
            let champion = winners.remove(0);
            log::info!("Tournament {}: champion is {}", tournament.id, champion);
            tournament.champion = Some(champion);
            tournament.state = TournamentState::Completed;
        }
        Some(next) => {
            log::info!(
                "Tournament {}: {} drawn with {} matches",
                tournament.id,
                next.label,
                next.matches.len()
            );
            tournament.match_reveal = RevealCursor::start(next.matches.len(), reveal);
            tournament.rounds.push(next);
            tournament.state = TournamentState::RoundDrawn;
        }
    }
    Ok(())
}
