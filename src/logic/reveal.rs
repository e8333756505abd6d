//! Step-by-step reveal of items that were already drawn (pairs, club assignments, matches).
//!
//! The draw is computed and stored in full before any reveal starts; the cursor only
//! tracks how many of those items the presentation layer has been shown.

use serde::{Deserialize, Serialize};

/// How freshly drawn items are exposed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealMode {
    /// Everything visible at once.
    #[default]
    Auto,
    /// One item per explicit "reveal next" call.
    Manual,
}

/// Position within a finite, already-computed sequence.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RevealCursor {
    pub total: usize,
    pub shown: usize,
}

impl RevealCursor {
    /// Cursor over `total` items, starting fully shown (Auto) or empty (Manual).
    pub fn start(total: usize, mode: RevealMode) -> Self {
        let shown = match mode {
            RevealMode::Auto => total,
            RevealMode::Manual => 0,
        };
        Self { total, shown }
    }

    /// Expose one more item; returns its index, or None once everything is shown.
    pub fn advance(&mut self) -> Option<usize> {
        if self.shown < self.total {
            self.shown += 1;
            Some(self.shown - 1)
        } else {
            None
        }
    }

    pub fn reveal_all(&mut self) {
        self.shown = self.total;
    }

    /// Hide everything again without touching the items.
    pub fn restart(&mut self) {
        self.shown = 0;
    }

    pub fn is_complete(&self) -> bool {
        self.shown >= self.total
    }

    /// The shown prefix of `items`.
    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.shown.min(items.len())]
    }
}
