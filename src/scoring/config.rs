use serde::{Deserialize, Serialize};

/// League-wide scoring configuration.
///
/// Mirrors the persisted league settings document. Every scheme is ordered
/// by place: index 0 is 1st.
///
/// Example JSON:
/// ```json
/// {
///   "finishPoints": [10, 7, 5, 3, 1],
///   "sprintPoints": [5, 3, 2],
///   "leagueRankPoints": [50, 48, 46, 44],
///   "bestRacesCount": 5
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSettings {
    /// Points by finish place.
    #[serde(default)]
    pub finish_points: Vec<i64>,

    /// Points by crossing-order place at sprint segments.
    #[serde(default)]
    pub sprint_points: Vec<i64>,

    /// Points by league rank, per race. Empty means league points fall back
    /// to raw race totals, with the last-place substitution for declassified
    /// riders.
    #[serde(default)]
    pub league_rank_points: Vec<i64>,

    /// How many of a rider's races count toward the season total.
    #[serde(default = "default_best_races_count")]
    pub best_races_count: i64,
}

fn default_best_races_count() -> i64 {
    5
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            finish_points: Vec::new(),
            sprint_points: Vec::new(),
            league_rank_points: Vec::new(),
            best_races_count: default_best_races_count(),
        }
    }
}
