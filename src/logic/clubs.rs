//! Club draw: one shuffled club per pair (pairs mode) or per player (individual mode).

use crate::logic::reveal::{RevealCursor, RevealMode};
use crate::models::{PlayerClub, Tournament, TournamentError, TournamentMode, TournamentState};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Fewest clubs a draw can be made with.
pub const MIN_CLUBS: usize = 2;

/// Result of one shuffle: `clubs[i]` goes to entrant `i`, None once clubs run out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClubAssignment {
    pub clubs: Vec<Option<String>>,
}

impl ClubAssignment {
    /// Number of entrants left without a club.
    pub fn unassigned(&self) -> usize {
        self.clubs.iter().filter(|c| c.is_none()).count()
    }
}

/// One revealed line of the draw.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ClubReveal {
    pub entrant: String,
    pub club: Option<String>,
}

/// Shuffle `clubs` once and hand them out by index to `entrant_count` entrants.
pub fn draw_clubs(
    clubs: &[String],
    entrant_count: usize,
    rng: &mut impl Rng,
) -> Result<ClubAssignment, TournamentError> {
    if clubs.len() < MIN_CLUBS {
        return Err(TournamentError::NotEnoughClubs {
            required: MIN_CLUBS,
            actual: clubs.len(),
        });
    }
    let mut shuffled = clubs.to_vec();
    shuffled.shuffle(rng);
    let mut shuffled = shuffled.into_iter();
    Ok(ClubAssignment {
        clubs: (0..entrant_count).map(|_| shuffled.next()).collect(),
    })
}

/// Draw clubs for the current entrants and store the full result before any reveal.
pub fn assign_clubs(tournament: &mut Tournament, reveal: RevealMode) -> Result<(), TournamentError> {
    assign_clubs_with_rng(tournament, reveal, &mut rand::thread_rng())
}

pub fn assign_clubs_with_rng(
    tournament: &mut Tournament,
    reveal: RevealMode,
    rng: &mut impl Rng,
) -> Result<(), TournamentError> {
    if !tournament.is_registration_open() {
        return Err(TournamentError::InvalidState);
    }
    let entrant_count = match tournament.mode {
        TournamentMode::Pairs if tournament.pairs.is_empty() => {
            return Err(TournamentError::PairsNotGenerated)
        }
        TournamentMode::Pairs => tournament.pairs.len(),
        TournamentMode::Individual if tournament.participants().is_empty() => {
            return Err(TournamentError::NotEnoughEntrants {
                required: 1,
                actual: 0,
            })
        }
        TournamentMode::Individual => tournament.participants().len(),
    };

    let assignment = draw_clubs(&tournament.clubs, entrant_count, rng)?;
    if assignment.unassigned() > 0 {
        log::warn!(
            "Tournament {}: {} clubs for {} entrants, {} left without a club",
            tournament.id,
            tournament.clubs.len(),
            entrant_count,
            assignment.unassigned()
        );
    }

    match tournament.mode {
        TournamentMode::Pairs => {
            for (pair, club) in tournament.pairs.iter_mut().zip(assignment.clubs) {
                pair.club = club.unwrap_or_default();
                log::debug!("{} -> {:?}", pair.display_name(), pair.club);
            }
        }
        TournamentMode::Individual => {
            tournament.assigned_players = tournament
                .participants_individual
                .iter()
                .zip(assignment.clubs)
                .map(|(player, club)| PlayerClub {
                    player: player.clone(),
                    club: club.unwrap_or_default(),
                })
                .collect();
        }
    }
    tournament.club_reveal = RevealCursor::start(entrant_count, reveal);
    tournament.state = TournamentState::ClubsAssigned;
    log::info!("Tournament {}: clubs assigned", tournament.id);
    Ok(())
}

/// Every stored assignment in draw order, whether revealed yet or not.
pub fn club_assignments(tournament: &Tournament) -> Vec<ClubReveal> {
    fn non_empty(club: &str) -> Option<String> {
        (!club.is_empty()).then(|| club.to_string())
    }
    match tournament.mode {
        TournamentMode::Pairs => tournament
            .pairs
            .iter()
            .map(|p| ClubReveal {
                entrant: p.display_name(),
                club: non_empty(&p.club),
            })
            .collect(),
        TournamentMode::Individual => tournament
            .assigned_players
            .iter()
            .map(|a| ClubReveal {
                entrant: a.player.clone(),
                club: non_empty(&a.club),
            })
            .collect(),
    }
}

/// Expose the next stored assignment (manual reveal). None once all are shown.
pub fn reveal_next_club(tournament: &mut Tournament) -> Result<Option<ClubReveal>, TournamentError> {
    if tournament.state != TournamentState::ClubsAssigned {
        return Err(TournamentError::InvalidState);
    }
    let all = club_assignments(tournament);
    Ok(tournament.club_reveal.advance().map(|i| all[i].clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strings(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn needs_two_clubs() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            draw_clubs(&strings("C", 1), 3, &mut rng),
            Err(TournamentError::NotEnoughClubs { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn shortage_leaves_trailing_entrants_clubless() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = draw_clubs(&strings("C", 2), 4, &mut rng).unwrap();
        assert_eq!(a.unassigned(), 2);
        assert!(a.clubs[0].is_some() && a.clubs[1].is_some());
    }

    #[test]
    fn manual_and_auto_reveal_end_identical_for_same_shuffle() {
        let mut auto = Tournament::with_participants(strings("P", 3), TournamentMode::Individual).unwrap();
        auto.clubs = strings("C", 3);
        let mut manual = auto.clone();

        assign_clubs_with_rng(&mut auto, RevealMode::Auto, &mut StdRng::seed_from_u64(9)).unwrap();
        assign_clubs_with_rng(&mut manual, RevealMode::Manual, &mut StdRng::seed_from_u64(9))
            .unwrap();

        let mut revealed = Vec::new();
        while let Some(r) = reveal_next_club(&mut manual).unwrap() {
            revealed.push(r);
        }
        assert_eq!(revealed, club_assignments(&auto));
        assert_eq!(manual.assigned_players, auto.assigned_players);
    }

    #[test]
    fn pairs_mode_requires_pairs() {
        let mut t = Tournament::with_participants(strings("P", 4), TournamentMode::Pairs).unwrap();
        t.clubs = strings("C", 2);
        assert_eq!(
            assign_clubs(&mut t, RevealMode::Auto),
            Err(TournamentError::PairsNotGenerated)
        );
    }
}
