use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One race's contribution to a rider's season ledger.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceScore {
    pub race_id: String,
    pub points: i64,
}

/// A rider's row in the season standings of one category.
///
/// A derived view: recomputed wholesale on every standings request or race
/// update, never edited in place.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsEntry {
    pub rider_id: String,
    pub name: String,
    /// Sum of the rider's best `bestRacesCount` race scores.
    pub total_points: i64,
    /// Every race that counted an entry for this rider, including those
    /// beyond the best-N cut.
    pub race_count: u32,
    /// Per-race scores, sorted by points descending.
    pub results: Vec<RaceScore>,
    /// Chronologically latest counted race; tie-break aid for the table.
    pub last_race_date: Option<NaiveDateTime>,
    pub last_race_points: i64,
}

impl StandingsEntry {
    pub(crate) fn new(rider_id: &str, name: &str) -> Self {
        StandingsEntry {
            rider_id: rider_id.to_string(),
            name: name.to_string(),
            total_points: 0,
            race_count: 0,
            results: Vec::new(),
            last_race_date: None,
            last_race_points: 0,
        }
    }
}
