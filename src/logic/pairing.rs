//! Pairs mode: random two-player teams from the roster.

use crate::logic::reveal::{RevealCursor, RevealMode};
use crate::models::{Pair, Tournament, TournamentError, TournamentMode, TournamentState, BYE};
use rand::seq::SliceRandom;
use rand::Rng;

/// Fewest players that can be split into pairs.
pub const MIN_PARTICIPANTS_FOR_PAIRS: usize = 4;

/// Shuffle the players and split them into consecutive pairs.
/// With an odd count the last player is paired with the BYE sentinel.
pub fn pair_participants(
    participants: &[String],
    rng: &mut impl Rng,
) -> Result<Vec<Pair>, TournamentError> {
    if participants.len() < MIN_PARTICIPANTS_FOR_PAIRS {
        return Err(TournamentError::NotEnoughParticipants {
            required: MIN_PARTICIPANTS_FOR_PAIRS,
            actual: participants.len(),
        });
    }
    let mut shuffled = participants.to_vec();
    shuffled.shuffle(rng);

    let mut pairs = Vec::with_capacity(shuffled.len().div_ceil(2));
    let mut iter = shuffled.into_iter();
    while let Some(a) = iter.next() {
        let b = iter.next().unwrap_or_else(|| BYE.to_string());
        pairs.push(Pair::new(a, b));
    }
    Ok(pairs)
}

/// Generate pairs for the roster (pairs mode, before the first round). Replaces any
/// previous pairs and club draw.
pub fn generate_pairs(tournament: &mut Tournament, reveal: RevealMode) -> Result<(), TournamentError> {
    generate_pairs_with_rng(tournament, reveal, &mut rand::thread_rng())
}

pub fn generate_pairs_with_rng(
    tournament: &mut Tournament,
    reveal: RevealMode,
    rng: &mut impl Rng,
) -> Result<(), TournamentError> {
    if tournament.mode != TournamentMode::Pairs || !tournament.is_registration_open() {
        return Err(TournamentError::InvalidState);
    }
    if let Some(name) = tournament
        .participants()
        .iter()
        .find(|n| Pair::is_ambiguous_member(n))
    {
        return Err(TournamentError::PairSeparatorInName(name.clone()));
    }
    let pairs = pair_participants(tournament.participants(), rng)?;
    for pair in &pairs {
        log::debug!("Pair drawn: {}", pair.display_name());
    }
    log::info!("Tournament {}: {} pairs generated", tournament.id, pairs.len());

    tournament.pair_reveal = RevealCursor::start(pairs.len(), reveal);
    tournament.pairs = pairs;
    tournament.assigned_players.clear();
    tournament.club_reveal = RevealCursor::default();
    tournament.state = TournamentState::Paired;
    Ok(())
}

/// Expose the next already-drawn pair (manual reveal). None once all are shown.
pub fn reveal_next_pair(tournament: &mut Tournament) -> Result<Option<Pair>, TournamentError> {
    if tournament.pairs.is_empty() {
        return Err(TournamentError::PairsNotGenerated);
    }
    Ok(tournament
        .pair_reveal
        .advance()
        .map(|i| tournament.pairs[i].clone()))
}
