//! Data structures for the club cup: entrants, matches, rounds, stats, tournament state.

mod entrant;
mod game;
mod stats;
mod tournament;

pub use entrant::{Entrant, Pair, PlayerClub, Slot, BYE};
pub use game::{Match, MatchId, MatchOutcome, Round, RoundLabel, Side};
pub use stats::{StandingRow, StatsRecord, StatsTable};
pub use tournament::{
    ErrorKind, Tournament, TournamentError, TournamentId, TournamentMode, TournamentState,
};
