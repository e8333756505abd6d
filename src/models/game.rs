//! Match, Round and RoundLabel for single-elimination play.

use crate::models::entrant::{Entrant, Slot};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// One of the two slots of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

/// Human label of a round, derived from how many entrants it starts with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RoundLabel {
    Final,
    Semifinal,
    Quarterfinal,
    /// "Round of N" where N is the bracket size (16, 32, 64, ...).
    RoundOf(usize),
}

impl RoundLabel {
    /// Label for a round entered by `n` entrants (pairs count once in pairs mode).
    pub fn for_entrant_count(n: usize) -> Self {
        match n {
            0..=2 => RoundLabel::Final,
            3..=4 => RoundLabel::Semifinal,
            5..=8 => RoundLabel::Quarterfinal,
            _ => RoundLabel::RoundOf(n.next_power_of_two()),
        }
    }
}

impl fmt::Display for RoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundLabel::Final => f.write_str("Final"),
            RoundLabel::Semifinal => f.write_str("Semifinal"),
            RoundLabel::Quarterfinal => f.write_str("Quarterfinal"),
            RoundLabel::RoundOf(n) => write!(f, "Round of {n}"),
        }
    }
}

impl From<RoundLabel> for String {
    fn from(label: RoundLabel) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for RoundLabel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "Final" => Ok(RoundLabel::Final),
            "Semifinal" => Ok(RoundLabel::Semifinal),
            "Quarterfinal" => Ok(RoundLabel::Quarterfinal),
            other => other
                .strip_prefix("Round of ")
                .and_then(|n| n.parse().ok())
                .map(RoundLabel::RoundOf)
                .ok_or_else(|| format!("unknown round label: {other}")),
        }
    }
}

/// What a match currently resolves to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchOutcome {
    /// The other slot is a BYE; this side advances without playing.
    Walkover(Side),
    /// Both scores present and this side scored more.
    Won(Side),
    /// Both scores present and equal.
    Tied,
    /// At least one score missing.
    Pending,
    /// Both slots are BYEs; nobody advances.
    Void,
}

/// A single match between two slots. Scores are filled in after the draw.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub slot_a: Slot,
    pub slot_b: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_a: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_b: Option<u32>,
    pub round: RoundLabel,
}

impl Match {
    pub fn new(slot_a: Slot, slot_b: Slot, round: RoundLabel) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot_a,
            slot_b,
            score_a: None,
            score_b: None,
            round,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.slot_a.is_bye() || self.slot_b.is_bye()
    }

    /// Both scores, when the match has actually been played.
    pub fn scores(&self) -> Option<(u32, u32)> {
        self.score_a.zip(self.score_b)
    }

    pub fn slot(&self, side: Side) -> &Slot {
        match side {
            Side::A => &self.slot_a,
            Side::B => &self.slot_b,
        }
    }

    pub fn outcome(&self) -> MatchOutcome {
        match (self.slot_a.is_bye(), self.slot_b.is_bye()) {
            (true, true) => return MatchOutcome::Void,
            (false, true) => return MatchOutcome::Walkover(Side::A),
            (true, false) => return MatchOutcome::Walkover(Side::B),
            (false, false) => {}
        }
        match self.scores() {
            Some((a, b)) if a > b => MatchOutcome::Won(Side::A),
            Some((a, b)) if b > a => MatchOutcome::Won(Side::B),
            Some(_) => MatchOutcome::Tied,
            None => MatchOutcome::Pending,
        }
    }

    /// The advancing entrant, if the match is decided.
    pub fn winner(&self) -> Option<&Entrant> {
        match self.outcome() {
            MatchOutcome::Walkover(side) | MatchOutcome::Won(side) => self.slot(side).entrant(),
            MatchOutcome::Tied | MatchOutcome::Pending | MatchOutcome::Void => None,
        }
    }
}

/// The matches drawn together under one label.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub label: RoundLabel,
    pub matches: Vec<Match>,
}

impl Round {
    /// Indices of matches that still block resolution (missing scores or tied).
    pub fn unresolved(&self) -> Vec<usize> {
        self.matches
            .iter()
            .enumerate()
            .filter(|(_, m)| matches!(m.outcome(), MatchOutcome::Pending | MatchOutcome::Tied))
            .map(|(i, _)| i)
            .collect()
    }

    /// True once every non-BYE match has both scores.
    pub fn all_scored(&self) -> bool {
        self.matches
            .iter()
            .all(|m| m.is_bye() || m.scores().is_some())
    }

    /// True if any score has been entered in this round.
    pub fn has_any_score(&self) -> bool {
        self.matches
            .iter()
            .any(|m| m.score_a.is_some() || m.score_b.is_some())
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played(a: &str, b: &str, sa: u32, sb: u32) -> Match {
        let mut m = Match::new(
            Entrant::individual(a).into(),
            Entrant::individual(b).into(),
            RoundLabel::Final,
        );
        m.score_a = Some(sa);
        m.score_b = Some(sb);
        m
    }

    #[test]
    fn labels_follow_entrant_count() {
        assert_eq!(RoundLabel::for_entrant_count(2), RoundLabel::Final);
        assert_eq!(RoundLabel::for_entrant_count(3), RoundLabel::Semifinal);
        assert_eq!(RoundLabel::for_entrant_count(4), RoundLabel::Semifinal);
        assert_eq!(RoundLabel::for_entrant_count(5), RoundLabel::Quarterfinal);
        assert_eq!(RoundLabel::for_entrant_count(9), RoundLabel::RoundOf(16));
        assert_eq!(RoundLabel::for_entrant_count(16), RoundLabel::RoundOf(16));
        assert_eq!(RoundLabel::for_entrant_count(17), RoundLabel::RoundOf(32));
        assert_eq!(RoundLabel::for_entrant_count(40), RoundLabel::RoundOf(64));
    }

    #[test]
    fn label_persists_as_text() {
        let json = serde_json::to_string(&RoundLabel::RoundOf(16)).unwrap();
        assert_eq!(json, "\"Round of 16\"");
        let back: RoundLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RoundLabel::RoundOf(16));
        assert!(serde_json::from_str::<RoundLabel>("\"Group stage\"").is_err());
    }

    #[test]
    fn bye_advances_other_slot_regardless_of_score() {
        let mut m = Match::new(Entrant::individual("C").into(), Slot::Bye, RoundLabel::Semifinal);
        m.score_a = Some(0);
        m.score_b = Some(9);
        assert_eq!(m.outcome(), MatchOutcome::Walkover(Side::A));
        assert_eq!(m.winner(), Some(&Entrant::individual("C")));
    }

    #[test]
    fn higher_score_wins_and_ties_are_undecided() {
        assert_eq!(played("A", "B", 1, 3).winner(), Some(&Entrant::individual("B")));
        assert_eq!(played("A", "B", 2, 2).outcome(), MatchOutcome::Tied);
        assert_eq!(played("A", "B", 2, 2).winner(), None);
    }

    #[test]
    fn half_scored_match_is_pending() {
        let mut m = played("A", "B", 1, 0);
        m.score_b = None;
        assert_eq!(m.outcome(), MatchOutcome::Pending);
    }
}
