//! CSV export of the standings table.

use crate::models::StatsTable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV output is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

const HEADER: [&str; 8] = [
    "Position",
    "Player/Pair",
    "Club",
    "Wins",
    "Losses",
    "GoalsFor",
    "GoalsAgainst",
    "GoalDiff",
];

/// Label used in the Club column when an entrant has none.
pub const NO_CLUB: &str = "No club";

/// Write the standings (sorted, 1-based positions) as CSV with a header row.
pub fn write_stats_csv<W: std::io::Write>(stats: &StatsTable, out: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;
    for row in stats.standings() {
        wtr.write_record([
            row.position.to_string(),
            row.entrant,
            row.record.club.unwrap_or_else(|| NO_CLUB.to_string()),
            row.record.wins.to_string(),
            row.record.losses.to_string(),
            row.record.goals_for.to_string(),
            row.record.goals_against.to_string(),
            row.goal_diff.to_string(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn stats_csv(stats: &StatsTable) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_stats_csv(stats, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
