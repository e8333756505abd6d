//! Entrants: individual players or two-player pairs, and the match slot that may hold a BYE.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sentinel used for an empty match slot and for the missing member of an odd pair.
pub const BYE: &str = "BYE";

/// Two players competing together. `club` is empty until clubs are assigned.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    #[serde(rename = "player1")]
    pub member_a: String,
    #[serde(rename = "player2")]
    pub member_b: String,
    #[serde(default)]
    pub club: String,
}

impl Pair {
    pub fn new(member_a: impl Into<String>, member_b: impl Into<String>) -> Self {
        Self {
            member_a: member_a.into(),
            member_b: member_b.into(),
            club: String::new(),
        }
    }

    /// True for the leftover pair of an odd roster (second member is the BYE sentinel).
    pub fn has_bye_member(&self) -> bool {
        self.member_b == BYE
    }

    /// Canonical display string, also the statistics key: `"A y B"`.
    pub fn display_name(&self) -> String {
        format!("{} y {}", self.member_a, self.member_b)
    }

    /// True if `name` could make two different pairs share a display name, i.e. it
    /// contains the `" y "` separator or starts or ends with half of it.
    pub fn is_ambiguous_member(name: &str) -> bool {
        name.contains(" y ") || name.starts_with("y ") || name.ends_with(" y")
    }

    pub fn club(&self) -> Option<&str> {
        if self.club.is_empty() {
            None
        } else {
            Some(&self.club)
        }
    }
}

/// A competing unit in the bracket.
///
/// Serialized untagged: an individual is a bare JSON string, a team is a
/// `{player1, player2, club}` object.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entrant {
    Individual(String),
    Team(Pair),
}

impl Entrant {
    pub fn individual(name: impl Into<String>) -> Self {
        Entrant::Individual(name.into())
    }

    pub fn display_name(&self) -> String {
        match self {
            Entrant::Individual(name) => name.clone(),
            Entrant::Team(pair) => pair.display_name(),
        }
    }

    /// Key under which statistics for this entrant are accumulated.
    pub fn identity_key(&self) -> String {
        self.display_name()
    }

    /// Club carried into statistics. Only teams carry one.
    pub fn club(&self) -> Option<&str> {
        match self {
            Entrant::Individual(_) => None,
            Entrant::Team(pair) => pair.club(),
        }
    }
}

impl fmt::Display for Entrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// One side of a match: an entrant or a BYE.
///
/// Persisted as the entrant itself, or as the string `"BYE"`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Slot {
    Entrant(Entrant),
    Bye,
}

impl Slot {
    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }

    pub fn entrant(&self) -> Option<&Entrant> {
        match self {
            Slot::Entrant(e) => Some(e),
            Slot::Bye => None,
        }
    }

    pub fn into_entrant(self) -> Option<Entrant> {
        match self {
            Slot::Entrant(e) => Some(e),
            Slot::Bye => None,
        }
    }
}

impl From<Entrant> for Slot {
    fn from(e: Entrant) -> Self {
        Slot::Entrant(e)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Slot::Entrant(e) => e.serialize(serializer),
            Slot::Bye => serializer.serialize_str(BYE),
        }
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Entrant::deserialize(deserializer)? {
            Entrant::Individual(name) if name == BYE => Ok(Slot::Bye),
            e => Ok(Slot::Entrant(e)),
        }
    }
}

/// Club drawn for a player in individual mode (`assignedPlayers`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerClub {
    pub player: String,
    /// Empty when there were fewer clubs than players.
    #[serde(default)]
    pub club: String,
}
