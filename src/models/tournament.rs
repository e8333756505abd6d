//! Tournament aggregate, its lifecycle state and errors.

use crate::logic::RevealCursor;
use crate::models::entrant::{Entrant, Pair, PlayerClub, BYE};
use crate::models::game::{MatchId, Round};
use crate::models::stats::StatsTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Broad class of a [`TournamentError`], for how the caller should surface it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input (empty or duplicate name, too few entrants or clubs).
    Validation,
    /// A prerequisite step is missing (no round drawn, scores missing, wrong phase).
    IncompleteState,
}

/// Errors that can occur during tournament operations. None of them leave the
/// tournament partially modified.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("\"{0}\" is already in the list")]
    DuplicateName(String),
    #[error("\"BYE\" is reserved and cannot be used as a name")]
    ReservedName,
    #[error("\"{0}\" contains the pair separator \" y \" and cannot be paired")]
    PairSeparatorInName(String),
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),
    #[error("Club not found: {0}")]
    ClubNotFound(String),
    #[error("Need at least {required} participants to generate pairs (have {actual})")]
    NotEnoughParticipants { required: usize, actual: usize },
    #[error("Need at least {required} entrants to draw a round (have {actual})")]
    NotEnoughEntrants { required: usize, actual: usize },
    #[error("Need at least {required} clubs to assign (have {actual})")]
    NotEnoughClubs { required: usize, actual: usize },
    #[error("Invalid state for this action")]
    InvalidState,
    #[error("Generate pairs before continuing")]
    PairsNotGenerated,
    #[error("No round has been drawn yet")]
    NoRoundDrawn,
    #[error("Match not found")]
    MatchNotFound(MatchId),
    #[error("Scores must be between 0 and {max}")]
    ScoreOutOfRange { max: u32 },
    #[error("{} match(es) still need both scores", .pending.len())]
    IncompleteResults { pending: Vec<usize> },
    #[error("Match {} is tied; enter a decisive score", .index + 1)]
    TiedMatch { index: usize },
    #[error("Scores have already been entered in this round")]
    RoundInProgress,
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        use TournamentError::*;
        match self {
            EmptyName
            | DuplicateName(_)
            | ReservedName
            | PairSeparatorInName(_)
            | ParticipantNotFound(_)
            | ClubNotFound(_)
            | NotEnoughParticipants { .. }
            | NotEnoughEntrants { .. }
            | NotEnoughClubs { .. }
            | MatchNotFound(_)
            | ScoreOutOfRange { .. } => ErrorKind::Validation,
            InvalidState
            | PairsNotGenerated
            | NoRoundDrawn
            | IncompleteResults { .. }
            | TiedMatch { .. }
            | RoundInProgress => ErrorKind::IncompleteState,
        }
    }
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Whether entrants are single players or two-player pairs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentMode {
    #[default]
    Individual,
    Pairs,
}

impl TournamentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentMode::Individual => "individual",
            TournamentMode::Pairs => "pairs",
        }
    }
}

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    /// Editing the roster and clubs.
    #[default]
    Registering,
    /// Pairs generated (pairs mode).
    Paired,
    /// Clubs drawn for every pair or player (best effort).
    ClubsAssigned,
    /// Current round drawn, scores still missing.
    RoundDrawn,
    /// Every non-BYE match of the current round has both scores.
    ScoresEntered,
    /// A single entrant remains.
    Completed,
}

/// Full tournament: roster, clubs, pairs, rounds, stats and phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub created_at: DateTime<Utc>,
    pub mode: TournamentMode,
    pub state: TournamentState,
    /// Roster used in individual mode.
    pub participants_individual: Vec<String>,
    /// Roster used in pairs mode (players before pairing).
    pub participants_pairs: Vec<String>,
    pub clubs: Vec<String>,
    pub pairs: Vec<Pair>,
    pub pair_reveal: RevealCursor,
    /// Individual mode club draw, in roster order.
    pub assigned_players: Vec<PlayerClub>,
    pub club_reveal: RevealCursor,
    /// Every round drawn so far; the last one is current.
    pub rounds: Vec<Round>,
    pub match_reveal: RevealCursor,
    pub stats: StatsTable,
    pub champion: Option<Entrant>,
}

impl Tournament {
    /// Create a new tournament in Registering state with empty rosters.
    pub fn new(mode: TournamentMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            mode,
            state: TournamentState::Registering,
            participants_individual: Vec::new(),
            participants_pairs: Vec::new(),
            clubs: Vec::new(),
            pairs: Vec::new(),
            pair_reveal: RevealCursor::default(),
            assigned_players: Vec::new(),
            club_reveal: RevealCursor::default(),
            rounds: Vec::new(),
            match_reveal: RevealCursor::default(),
            stats: StatsTable::new(),
            champion: None,
        }
    }

    /// Create a tournament with an initial roster for `mode`. Every name goes through
    /// [`Tournament::add_participant`]. Still Registering.
    pub fn with_participants(
        names: impl IntoIterator<Item = impl Into<String>>,
        mode: TournamentMode,
    ) -> Result<Self, TournamentError> {
        let mut t = Self::new(mode);
        for name in names {
            t.add_participant(name)?;
        }
        Ok(t)
    }

    /// Roster for the current mode.
    pub fn participants(&self) -> &[String] {
        match self.mode {
            TournamentMode::Individual => &self.participants_individual,
            TournamentMode::Pairs => &self.participants_pairs,
        }
    }

    fn participants_mut(&mut self) -> &mut Vec<String> {
        match self.mode {
            TournamentMode::Individual => &mut self.participants_individual,
            TournamentMode::Pairs => &mut self.participants_pairs,
        }
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn current_round_mut(&mut self) -> Option<&mut Round> {
        self.rounds.last_mut()
    }

    /// Entrants of the first round: the roster in individual mode, the pairs in pairs mode.
    pub fn entrants(&self) -> Vec<Entrant> {
        match self.mode {
            TournamentMode::Individual => self
                .participants_individual
                .iter()
                .cloned()
                .map(Entrant::Individual)
                .collect(),
            TournamentMode::Pairs => self.pairs.iter().cloned().map(Entrant::Team).collect(),
        }
    }

    /// True while roster, clubs and mode may still change.
    pub fn is_registration_open(&self) -> bool {
        use TournamentState::*;
        self.rounds.is_empty() && matches!(self.state, Registering | Paired | ClubsAssigned)
    }

    /// True once clubs were drawn for the current mode.
    pub fn clubs_assigned(&self) -> bool {
        match self.mode {
            TournamentMode::Individual => !self.assigned_players.is_empty(),
            TournamentMode::Pairs => self.pairs.iter().any(|p| !p.club.is_empty()),
        }
    }

    /// Phase the tournament sits in before any round is drawn.
    pub fn pre_draw_state(&self) -> TournamentState {
        if self.clubs_assigned() {
            TournamentState::ClubsAssigned
        } else if self.mode == TournamentMode::Pairs && !self.pairs.is_empty() {
            TournamentState::Paired
        } else {
            TournamentState::Registering
        }
    }

    /// Switch between individual and pairs mode (registration only). Pairs and club
    /// draws are discarded; both rosters are kept.
    pub fn set_mode(&mut self, mode: TournamentMode) -> Result<(), TournamentError> {
        if !self.is_registration_open() {
            return Err(TournamentError::InvalidState);
        }
        if self.mode != mode {
            self.mode = mode;
            self.discard_draws();
        }
        Ok(())
    }

    /// Add a participant to the current roster. Names are trimmed and unique (case-insensitive).
    pub fn add_participant(&mut self, name: impl Into<String>) -> Result<(), TournamentError> {
        if !self.is_registration_open() {
            return Err(TournamentError::InvalidState);
        }
        let name: String = name.into();
        let name = validate_name(&name, self.participants())?;
        if name.eq_ignore_ascii_case(BYE) {
            return Err(TournamentError::ReservedName);
        }
        if self.mode == TournamentMode::Pairs && Pair::is_ambiguous_member(&name) {
            return Err(TournamentError::PairSeparatorInName(name));
        }
        self.participants_mut().push(name);
        self.discard_draws();
        Ok(())
    }

    /// Remove a participant by name from the current roster.
    pub fn remove_participant(&mut self, name: &str) -> Result<(), TournamentError> {
        if !self.is_registration_open() {
            return Err(TournamentError::InvalidState);
        }
        let idx = self
            .participants()
            .iter()
            .position(|p| p == name.trim())
            .ok_or_else(|| TournamentError::ParticipantNotFound(name.to_string()))?;
        self.participants_mut().remove(idx);
        self.discard_draws();
        Ok(())
    }

    /// Add a club name. Any previous club draw is discarded.
    pub fn add_club(&mut self, name: impl Into<String>) -> Result<(), TournamentError> {
        if !self.is_registration_open() {
            return Err(TournamentError::InvalidState);
        }
        let name: String = name.into();
        let name = validate_name(&name, &self.clubs)?;
        self.clubs.push(name);
        self.discard_club_draw();
        Ok(())
    }

    pub fn remove_club(&mut self, name: &str) -> Result<(), TournamentError> {
        if !self.is_registration_open() {
            return Err(TournamentError::InvalidState);
        }
        let idx = self
            .clubs
            .iter()
            .position(|c| c == name.trim())
            .ok_or_else(|| TournamentError::ClubNotFound(name.to_string()))?;
        self.clubs.remove(idx);
        self.discard_club_draw();
        Ok(())
    }

    /// New tournament with the same roster, pairs and clubs: clears rounds, stats and champion.
    pub fn reset(&mut self) {
        self.rounds.clear();
        self.match_reveal = RevealCursor::default();
        self.stats.clear();
        self.champion = None;
        self.state = self.pre_draw_state();
        log::info!("Tournament {} reset to {:?}", self.id, self.state);
    }

    fn discard_draws(&mut self) {
        self.pairs.clear();
        self.pair_reveal = RevealCursor::default();
        self.assigned_players.clear();
        self.club_reveal = RevealCursor::default();
        self.state = TournamentState::Registering;
    }

    fn discard_club_draw(&mut self) {
        for pair in &mut self.pairs {
            pair.club.clear();
        }
        self.assigned_players.clear();
        self.club_reveal = RevealCursor::default();
        self.state = self.pre_draw_state();
    }
}

fn validate_name(raw: &str, existing: &[String]) -> Result<String, TournamentError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(TournamentError::EmptyName);
    }
    if existing.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        return Err(TournamentError::DuplicateName(name.to_string()));
    }
    Ok(name.to_string())
}
