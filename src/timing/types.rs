use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Event metadata as exposed by the timing platform, already decoded by the
/// adapter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subgroups: Vec<Subgroup>,
}

/// One start pen of an event. The label doubles as the league category
/// ("A", "B", ...).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subgroup {
    pub id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub route_id: Option<u64>,
    #[serde(default)]
    pub laps: Option<u32>,
    /// Start time as reported by the platform (ISO 8601).
    #[serde(default)]
    pub start: Option<String>,
}

/// A timed finisher of a subgroup.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinisherEntry {
    pub rider_id: String,
    /// Platform display name; used only when the rider is not registered.
    #[serde(default)]
    pub name: Option<String>,
    /// 0 means did-not-finish.
    #[serde(default)]
    pub finish_time_ms: u64,
    #[serde(default)]
    pub flagged_cheating: bool,
    #[serde(default)]
    pub flagged_sandbagging: bool,
}

/// A signed-up or joined rider, no timing data yet.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEntry {
    pub rider_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl ParticipantEntry {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// One raw crossing of a course segment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentCrossing {
    pub rider_id: String,
    /// Platform clock at the crossing; decides both occurrence numbering and
    /// sprint ranks.
    #[serde(default)]
    pub world_time: u64,
    #[serde(default)]
    pub elapsed_ms: u64,
    #[serde(default)]
    pub avg_power: u32,
}

/// Half-open window for segment queries: crossings at or after `from` and
/// before `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}
