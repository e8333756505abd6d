//! Club cup web app: library with models and business logic for single-elimination
//! brackets (individual or pairs), club draws and cumulative stats.

pub mod config;
pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    accumulate_stats, assign_clubs, club_assignments, draw_first_round, draw_round,
    generate_pairs, pair_participants, record_score, reveal_next_club, reveal_next_match,
    reveal_next_pair, round_winners, stats_csv, submit_round, visible_matches, ClubReveal,
    RevealCursor, RevealMode,
};
pub use models::{
    Entrant, ErrorKind, Match, MatchId, Pair, Round, RoundLabel, Slot, StandingRow, StatsRecord,
    StatsTable, Tournament, TournamentError, TournamentId, TournamentMode, TournamentState,
};
