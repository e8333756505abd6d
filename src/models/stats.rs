//! Cumulative per-entrant statistics and the standings table built from them.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Record of one entrant across all rounds of a tournament.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub wins: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
}

impl StatsRecord {
    pub fn goal_diff(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }
}

/// Statistics keyed by entrant identity, kept in first-seen order.
///
/// Serialized as a JSON object whose keys appear in insertion order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatsTable {
    entries: Vec<(String, StatsRecord)>,
}

/// One line of the standings table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    /// 1-based.
    pub position: usize,
    pub entrant: String,
    #[serde(flatten)]
    pub record: StatsRecord,
    pub goal_diff: i64,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&StatsRecord> {
        self.entries
            .iter()
            .find(|(k, _)| k == identity)
            .map(|(_, r)| r)
    }

    /// Record for `identity`, inserting a zero record at the end if unseen.
    pub fn entry(&mut self, identity: &str) -> &mut StatsRecord {
        let idx = match self.entries.iter().position(|(k, _)| k == identity) {
            Some(idx) => idx,
            None => {
                self.entries.push((identity.to_string(), StatsRecord::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatsRecord)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sorted by wins, then goal difference, then goals for (all descending).
    /// Entrants equal on all three keep their insertion order.
    pub fn standings(&self) -> Vec<StandingRow> {
        let mut sorted: Vec<&(String, StatsRecord)> = self.entries.iter().collect();
        sorted.sort_by(|(_, a), (_, b)| {
            b.wins
                .cmp(&a.wins)
                .then_with(|| b.goal_diff().cmp(&a.goal_diff()))
                .then_with(|| b.goals_for.cmp(&a.goals_for))
        });
        sorted
            .into_iter()
            .enumerate()
            .map(|(i, (name, record))| StandingRow {
                position: i + 1,
                entrant: name.clone(),
                record: record.clone(),
                goal_diff: record.goal_diff(),
            })
            .collect()
    }
}

impl Serialize for StatsTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, r) in &self.entries {
            map.serialize_entry(k, r)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StatsTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = StatsTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of entrant name to stats record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StatsTable, A::Error> {
                let mut table = StatsTable::new();
                while let Some((k, r)) = access.next_entry::<String, StatsRecord>()? {
                    *table.entry(&k) = r;
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
