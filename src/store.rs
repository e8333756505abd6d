//! Key-value persistence boundary.
//!
//! The tournament is only serialized at transition edges: [`save_tournament`] writes
//! every key in one batch, [`load_tournament`] rebuilds the aggregate. Values are JSON
//! text under the same keys the browser version used.

use crate::logic::RevealCursor;
use crate::models::{
    Entrant, Match, MatchId, Pair, PlayerClub, Round, RoundLabel, Slot, StatsTable, Tournament,
    TournamentMode, TournamentState,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KEY_TOURNAMENT_ID: &str = "tournamentId";
pub const KEY_CREATED_AT: &str = "createdAt";
pub const KEY_TYPE: &str = "tournamentType";
pub const KEY_STATE: &str = "tournamentState";
pub const KEY_PARTICIPANTS_INDIVIDUAL: &str = "participants_individual";
pub const KEY_PARTICIPANTS_PAIRS: &str = "participants_pairs";
pub const KEY_TEAMS: &str = "teams";
pub const KEY_PAIRS: &str = "pairs";
pub const KEY_ASSIGNED_PLAYERS: &str = "assignedPlayers";
pub const KEY_MATCHES: &str = "matches";
pub const KEY_PHASE: &str = "tournamentPhase";
pub const KEY_ROUNDS: &str = "rounds";
pub const KEY_WINNER: &str = "tournamentWinner";
pub const KEY_STATS: &str = "stats";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON under \"{key}\": {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode \"{key}\": {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String-valued key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Write several keys at once. Stores that can do this atomically override it.
    fn set_many(&mut self, entries: Vec<(&'static str, String)>) -> Result<(), StoreError> {
        for (k, v) in entries {
            self.set(k, v)?;
        }
        Ok(())
    }
}

/// In-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// All keys in one JSON file. Every write rewrites the file through a temp file + rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|source| StoreError::Decode {
                key: path.display().to_string(),
                source,
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(&self.values).map_err(|source| {
            StoreError::Encode {
                key: self.path.display().to_string(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn set_many(&mut self, entries: Vec<(&'static str, String)>) -> Result<(), StoreError> {
        for (k, v) in entries {
            self.values.insert(k.to_string(), v);
        }
        self.flush()
    }
}

/// One entry of the `matches` key: `player1`/`player2` in individual mode,
/// `team1`/`team2` in pairs mode, scores as `score1`/`score2`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct MatchRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<MatchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    player1: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    player2: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    team1: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    team2: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score1: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score2: Option<u32>,
    round: Option<RoundLabel>,
}

impl MatchRecord {
    fn from_match(m: &Match, mode: TournamentMode) -> Self {
        let (a, b) = (Some(m.slot_a.clone()), Some(m.slot_b.clone()));
        let mut record = Self {
            id: Some(m.id),
            score1: m.score_a,
            score2: m.score_b,
            round: Some(m.round),
            ..Self::default()
        };
        match mode {
            TournamentMode::Individual => (record.player1, record.player2) = (a, b),
            TournamentMode::Pairs => (record.team1, record.team2) = (a, b),
        }
        record
    }

    /// None if either slot is missing.
    fn into_match(self, fallback_round: RoundLabel) -> Option<Match> {
        let slot_a = self.player1.or(self.team1)?;
        let slot_b = self.player2.or(self.team2)?;
        let mut m = Match::new(slot_a, slot_b, self.round.unwrap_or(fallback_round));
        if let Some(id) = self.id {
            m.id = id;
        }
        m.score_a = self.score1;
        m.score_b = self.score2;
        Some(m)
    }
}

fn encode<T: Serialize + ?Sized>(key: &'static str, value: &T) -> Result<(&'static str, String), StoreError> {
    serde_json::to_string(value)
        .map(|json| (key, json))
        .map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })
}

/// Read and decode `key`. A key that was never written is not an error: it is
/// logged and read as None.
fn read<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Result<Option<T>, StoreError> {
    match store.get(key) {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            }),
        None => {
            log::warn!("No stored value for \"{}\", using default", key);
            Ok(None)
        }
    }
}

fn read_or_default<T: DeserializeOwned + Default>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<T, StoreError> {
    Ok(read(store, key)?.unwrap_or_default())
}

/// Write the whole tournament in one batch.
pub fn save_tournament(store: &mut impl KeyValueStore, t: &Tournament) -> Result<(), StoreError> {
    let current = t.current_round();
    let matches: Vec<MatchRecord> = current
        .map(|r| r.matches.iter().map(|m| MatchRecord::from_match(m, t.mode)).collect())
        .unwrap_or_default();
    let mut entries = vec![
        encode(KEY_TOURNAMENT_ID, &t.id)?,
        encode(KEY_CREATED_AT, &t.created_at)?,
        encode(KEY_TYPE, &t.mode)?,
        encode(KEY_STATE, &t.state)?,
        encode(KEY_PARTICIPANTS_INDIVIDUAL, &t.participants_individual)?,
        encode(KEY_PARTICIPANTS_PAIRS, &t.participants_pairs)?,
        encode(KEY_TEAMS, &t.clubs)?,
        encode(KEY_PAIRS, &t.pairs)?,
        encode(KEY_ASSIGNED_PLAYERS, &t.assigned_players)?,
        encode(KEY_MATCHES, &matches)?,
        encode(KEY_ROUNDS, &t.rounds)?,
        encode(KEY_STATS, &t.stats)?,
    ];
    if let Some(round) = current {
        entries.push(encode(KEY_PHASE, &round.label)?);
    }
    if let Some(champion) = &t.champion {
        entries.push(encode(KEY_WINNER, champion)?);
    }
    store.set_many(entries)?;
    if current.is_none() {
        store.remove(KEY_PHASE)?;
    }
    if t.champion.is_none() {
        store.remove(KEY_WINNER)?;
    }
    Ok(())
}

/// Rebuild a tournament from the store. Missing keys read as empty; presentation
/// state (reveal cursors) comes back fully revealed.
pub fn load_tournament(store: &impl KeyValueStore) -> Result<Tournament, StoreError> {
    let mode: TournamentMode = read_or_default(store, KEY_TYPE)?;
    let mut t = Tournament::new(mode);
    if let Some(id) = read(store, KEY_TOURNAMENT_ID)? {
        t.id = id;
    }
    if let Some(created_at) = read(store, KEY_CREATED_AT)? {
        t.created_at = created_at;
    }
    t.participants_individual = read_or_default(store, KEY_PARTICIPANTS_INDIVIDUAL)?;
    t.participants_pairs = read_or_default(store, KEY_PARTICIPANTS_PAIRS)?;
    t.clubs = read_or_default(store, KEY_TEAMS)?;
    t.pairs = read_or_default::<Vec<Pair>>(store, KEY_PAIRS)?;
    t.assigned_players = read_or_default::<Vec<PlayerClub>>(store, KEY_ASSIGNED_PLAYERS)?;
    t.stats = read_or_default::<StatsTable>(store, KEY_STATS)?;
    t.champion = read::<Entrant>(store, KEY_WINNER)?;

    t.rounds = match read::<Vec<Round>>(store, KEY_ROUNDS)? {
        Some(rounds) => rounds,
        None => {
            let records: Vec<MatchRecord> = read_or_default(store, KEY_MATCHES)?;
            let phase: Option<RoundLabel> = read(store, KEY_PHASE)?;
            let label = phase
                .or_else(|| records.iter().find_map(|r| r.round))
                .unwrap_or_else(|| RoundLabel::for_entrant_count(records.len() * 2));
            let matches: Vec<Match> = records
                .into_iter()
                .filter_map(|r| {
                    let m = r.into_match(label);
                    if m.is_none() {
                        log::warn!("Skipping stored match without both slots");
                    }
                    m
                })
                .collect();
            if matches.is_empty() {
                Vec::new()
            } else {
                vec![Round { label, matches }]
            }
        }
    };

    t.pair_reveal = RevealCursor::start(t.pairs.len(), Default::default());
    t.club_reveal = RevealCursor::start(
        match mode {
            TournamentMode::Pairs => t.pairs.len(),
            TournamentMode::Individual => t.assigned_players.len(),
        },
        Default::default(),
    );
    t.match_reveal = RevealCursor::start(
        t.current_round().map(|r| r.matches.len()).unwrap_or(0),
        Default::default(),
    );
    t.state = match read::<TournamentState>(store, KEY_STATE)? {
        Some(state) => state,
        None => derive_state(&t),
    };
    Ok(t)
}

fn derive_state(t: &Tournament) -> TournamentState {
    match (&t.champion, t.current_round()) {
        (Some(_), _) => TournamentState::Completed,
        (None, Some(round)) if round.all_scored() => TournamentState::ScoresEntered,
        (None, Some(_)) => TournamentState::RoundDrawn,
        (None, None) => t.pre_draw_state(),
    }
}
