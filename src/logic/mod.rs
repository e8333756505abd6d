//! Tournament business logic: pairing, club draw, bracket rounds, results, export.

mod bracket;
mod clubs;
mod export;
mod pairing;
mod results;
mod reveal;

pub use bracket::{
    draw_first_round, draw_first_round_with_rng, draw_round, reveal_next_match, visible_matches,
    MIN_ENTRANTS,
};
pub use clubs::{
    assign_clubs, assign_clubs_with_rng, club_assignments, draw_clubs, reveal_next_club,
    ClubAssignment, ClubReveal, MIN_CLUBS,
};
pub use export::{stats_csv, write_stats_csv, ExportError, NO_CLUB};
pub use pairing::{
    generate_pairs, generate_pairs_with_rng, pair_participants, reveal_next_pair,
    MIN_PARTICIPANTS_FOR_PAIRS,
};
pub use results::{
    accumulate_stats, record_score, round_winners, submit_round, submit_round_with_rng,
    MAX_SCORE,
};
pub use reveal::{RevealCursor, RevealMode};
