use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Finish rank assigned to disqualified riders so they always sort after
/// everyone that was actually ranked.
pub const DQ_FINISH_RANK: u32 = 9999;

/// How a race is scored for the league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RaceType {
    #[default]
    Scratch,
    Points,
    TimeTrial,
}

/// What a timed segment awards: `Sprint` segments carry points, `Split`
/// segments only record a crossing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    #[default]
    Sprint,
    Split,
}

/// One timed occurrence of a course segment within a race.
///
/// A route may cross the same segment several times per lap or race, so the
/// segment id alone is ambiguous; `count` is the 1-based occurrence index.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintConfig {
    /// Course segment identifier on the timing platform.
    pub id: String,
    /// 1-based occurrence index within the race.
    pub count: u32,
    /// Stable display key. Empty on the wire means "derive from id and
    /// count"; [`RaceConfig::normalized`] fills it in before scoring runs so
    /// the mapper and the scorer can never disagree on the derived value.
    #[serde(default)]
    pub key: String,
    #[serde(default, rename = "type")]
    pub kind: Option<SegmentKind>,
}

impl SprintConfig {
    /// The segment kind, falling back to the race-wide default when the
    /// sprint does not set one explicitly.
    pub fn effective_kind(&self, race_default: SegmentKind) -> SegmentKind {
        self.kind.unwrap_or(race_default)
    }
}

/// Per-category overrides in a multi-event race: categories may start at
/// different times and may time a different sprint set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    pub category: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub sprints: Option<Vec<SprintConfig>>,
}

/// A rider's crossing of one configured sprint occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintEffort {
    #[serde(default)]
    pub elapsed_ms: u64,
    /// Platform clock at the moment the rider crossed the line. Arrival
    /// order, not elapsed time, decides sprint ranks.
    #[serde(default)]
    pub world_time: u64,
    #[serde(default)]
    pub avg_power: u32,
    /// Crossing-order rank among valid riders; 0 for riders that were not
    /// ranked (disqualified or declassified).
    #[serde(default)]
    pub rank: u32,
}

/// One rider's scored result in one category of one race.
///
/// Built fresh on every (re)scoring pass; computed fields are replaced
/// wholesale, never patched incrementally.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderResult {
    pub rider_id: String,
    pub name: String,
    /// Finish time in milliseconds; 0 means did-not-finish.
    #[serde(default)]
    pub finish_time_ms: u64,
    /// 1-based finish place among valid riders, 0 for DNF,
    /// [`DQ_FINISH_RANK`] for disqualified riders.
    #[serde(default)]
    pub finish_rank: u32,
    #[serde(default)]
    pub finish_points: i64,
    #[serde(default)]
    pub sprint_points: i64,
    #[serde(default)]
    pub total_points: i64,
    /// Preliminary league points for this race. `None` means the race does
    /// not count for this rider at all, as opposed to counting as a zero.
    #[serde(default)]
    pub league_points: Option<i64>,
    /// Crossing data per sprint key. Input data for scoring: retained across
    /// recalculations unless fresh segment efforts are supplied.
    #[serde(default)]
    pub sprint_data: BTreeMap<String, SprintEffort>,
    /// Display-only summary per sprint key: points awarded for sprint
    /// segments, the crossing worldTime for splits.
    #[serde(default)]
    pub sprint_details: BTreeMap<String, i64>,
    #[serde(default)]
    pub disqualified: bool,
    #[serde(default)]
    pub declassified: bool,
    /// Platform adjudication flags, passed through untouched; never used in
    /// scoring.
    #[serde(default)]
    pub flagged_cheating: bool,
    #[serde(default)]
    pub flagged_sandbagging: bool,
}

impl RiderResult {
    pub fn new(rider_id: impl Into<String>, name: impl Into<String>, finish_time_ms: u64) -> Self {
        RiderResult {
            rider_id: rider_id.into(),
            name: name.into(),
            finish_time_ms,
            finish_rank: 0,
            finish_points: 0,
            sprint_points: 0,
            total_points: 0,
            league_points: None,
            sprint_data: BTreeMap::new(),
            sprint_details: BTreeMap::new(),
            disqualified: false,
            declassified: false,
            flagged_cheating: false,
            flagged_sandbagging: false,
        }
    }

    /// Clear every computed field ahead of a scoring pass. `sprint_data`
    /// survives (it is input), but its ranks are recomputed.
    pub(crate) fn reset_scoring(&mut self) {
        self.finish_rank = 0;
        self.finish_points = 0;
        self.sprint_points = 0;
        self.total_points = 0;
        self.league_points = None;
        self.sprint_details.clear();
        self.disqualified = false;
        self.declassified = false;
        for effort in self.sprint_data.values_mut() {
            effort.rank = 0;
        }
    }

    pub fn finished(&self) -> bool {
        self.finish_time_ms > 0
    }
}

/// The persisted race document: configuration, admin overrides, and the
/// per-category results of the last scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Wire value from persistence; may be a date, a full datetime, or
    /// absent. Resolved by [`crate::race::schedule::race_datetime`].
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default, rename = "type")]
    pub race_type: RaceType,
    /// Default kind for sprints that do not set one.
    #[serde(default)]
    pub segment_type: SegmentKind,
    /// Race-wide sprint set; categories may override via
    /// `eventConfiguration`.
    #[serde(default)]
    pub sprints: Vec<SprintConfig>,
    #[serde(default)]
    pub event_configuration: Vec<CategoryConfig>,
    /// Admin overrides, rider ids. A disqualified rider scores zero; a
    /// declassified rider scores as if finishing last; an excluded rider
    /// never appears in any output.
    #[serde(default, rename = "manualDQs")]
    pub manual_dqs: Vec<String>,
    #[serde(default)]
    pub manual_declassifications: Vec<String>,
    #[serde(default)]
    pub manual_exclusions: Vec<String>,
    #[serde(default)]
    pub results: BTreeMap<String, Vec<RiderResult>>,
}

impl RaceConfig {
    /// A copy with every sprint's display key resolved. Keys default to
    /// `"{id}_{count}"`; deriving them once here keeps every later call site
    /// in agreement.
    pub fn normalized(&self) -> RaceConfig {
        let mut race = self.clone();
        fill_sprint_keys(&mut race.sprints);
        for category in race.event_configuration.iter_mut() {
            if let Some(sprints) = category.sprints.as_mut() {
                fill_sprint_keys(sprints);
            }
        }
        race
    }

    /// The sprint set timed for `category`: its own override when present,
    /// otherwise the race-wide set.
    pub fn sprints_for(&self, category: &str) -> &[SprintConfig] {
        self.event_configuration
            .iter()
            .find(|c| c.category == category)
            .and_then(|c| c.sprints.as_deref())
            .unwrap_or(&self.sprints)
    }

    pub fn dq_set(&self) -> HashSet<&str> {
        self.manual_dqs.iter().map(String::as_str).collect()
    }

    pub fn declassification_set(&self) -> HashSet<&str> {
        self.manual_declassifications.iter().map(String::as_str).collect()
    }

    pub fn exclusion_set(&self) -> HashSet<&str> {
        self.manual_exclusions.iter().map(String::as_str).collect()
    }
}

fn fill_sprint_keys(sprints: &mut [SprintConfig]) {
    for sprint in sprints {
        if sprint.key.is_empty() {
            sprint.key = format!("{}_{}", sprint.id, sprint.count);
        }
    }
}
