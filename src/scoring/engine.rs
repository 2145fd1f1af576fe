use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};

use super::config::LeagueSettings;
use super::points::{competition_ranks, points_at};
use super::segments::map_segment_efforts;
use super::validation;
use crate::race::types::{RaceConfig, RiderResult, SegmentKind, DQ_FINISH_RANK};
use crate::timing::types::SegmentCrossing;

/// Score one category of one race.
///
/// Pure and deterministic: the output is fully determined by the inputs, and
/// the function always returns a complete result list — missing timing data
/// degrades to zero/absent values. The only errors are malformed
/// configuration, which indicates a caller bug and fails fast.
///
/// `riders` are the base entries (id, name, finish time, pass-through flags,
/// and — when rescoring a persisted race — previously mapped `sprintData`).
/// When `efforts` is supplied, fresh crossings are mapped onto the riders
/// first.
pub fn score_race(
    riders: Vec<RiderResult>,
    category: &str,
    config: &RaceConfig,
    settings: &LeagueSettings,
    efforts: Option<&BTreeMap<String, Vec<SegmentCrossing>>>,
) -> Result<Vec<RiderResult>> {
    if let Err(errors) = validation::validate_race(config) {
        bail!("invalid race configuration: {}", errors.join("; "));
    }
    if let Err(errors) = validation::validate_settings(settings) {
        bail!("invalid league settings: {}", errors.join("; "));
    }
    let config = config.normalized();
    let dqs = config.dq_set();
    let declassed = config.declassification_set();
    let excluded = config.exclusion_set();

    // Excluded riders never appear in any output.
    let mut riders: Vec<RiderResult> = riders
        .into_iter()
        .filter(|r| !excluded.contains(r.rider_id.as_str()))
        .collect();

    // Classify. Disqualification wins if a rider is somehow in both sets.
    for rider in riders.iter_mut() {
        rider.reset_scoring();
        if dqs.contains(rider.rider_id.as_str()) {
            rider.disqualified = true;
            rider.finish_rank = DQ_FINISH_RANK;
        } else if declassed.contains(rider.rider_id.as_str()) {
            rider.declassified = true;
        }
    }

    // Finish points: valid riders by finish time ascending, DNF last. The
    // sort is stable, so truly unranked riders keep their input order.
    let mut valid_order: Vec<usize> = (0..riders.len())
        .filter(|&i| !riders[i].disqualified && !riders[i].declassified)
        .collect();
    valid_order.sort_by_key(|&i| finish_sort_key(riders[i].finish_time_ms));

    let mut valid_finishers = 0;
    for (position, &i) in valid_order.iter().enumerate() {
        let rider = &mut riders[i];
        if rider.finished() {
            rider.finish_rank = position as u32 + 1;
            rider.finish_points = points_at(&settings.finish_points, position);
            valid_finishers += 1;
        } else {
            rider.finish_rank = 0;
            rider.finish_points = 0;
        }
    }

    // Declassified riders score as if finishing one place after the last
    // valid finisher, regardless of their actual time.
    let last_place_points = points_at(&settings.finish_points, valid_finishers);
    for rider in riders.iter_mut().filter(|r| r.declassified) {
        rider.finish_rank = valid_finishers as u32 + 1;
        rider.finish_points = last_place_points;
    }

    if let Some(efforts) = efforts {
        map_segment_efforts(&mut riders, efforts, config.sprints_for(category));
    }

    award_sprint_points(&mut riders, category, &config, settings);

    for rider in riders.iter_mut() {
        rider.total_points = rider.finish_points + rider.sprint_points;
    }

    // Final order: total points descending, finish time breaking ties, DNF
    // last.
    riders.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| finish_sort_key(a.finish_time_ms).cmp(&finish_sort_key(b.finish_time_ms)))
    });
    Ok(riders)
}

fn finish_sort_key(finish_time_ms: u64) -> u64 {
    if finish_time_ms == 0 {
        u64::MAX
    } else {
        finish_time_ms
    }
}

/// Award sprint points for every key present in any rider's crossing data.
///
/// Ranks follow arrival order (`worldTime`), not elapsed time: the timing
/// source exposes both, and the league scores first-across-the-line. Ties on
/// `worldTime` share a rank and a points value under standard competition
/// ranking. Disqualified and declassified riders are never ranked and earn
/// nothing, though split crossing times stay visible for display.
fn award_sprint_points(
    riders: &mut [RiderResult],
    category: &str,
    config: &RaceConfig,
    settings: &LeagueSettings,
) {
    let kind_by_key: BTreeMap<String, SegmentKind> = config
        .sprints_for(category)
        .iter()
        .map(|s| (s.key.clone(), s.effective_kind(config.segment_type)))
        .collect();

    let keys: BTreeSet<String> = riders
        .iter()
        .flat_map(|r| r.sprint_data.keys().cloned())
        .collect();

    for key in &keys {
        let kind = kind_by_key.get(key).copied().unwrap_or(config.segment_type);

        let mut order: Vec<(usize, u64)> = Vec::new();
        for (i, rider) in riders.iter().enumerate() {
            let Some(effort) = rider.sprint_data.get(key) else {
                continue;
            };
            if rider.disqualified || rider.declassified {
                continue;
            }
            order.push((i, effort.world_time));
        }
        order.sort_by_key(|&(_, world_time)| world_time);

        let times: Vec<u64> = order.iter().map(|&(_, world_time)| world_time).collect();
        let ranks = competition_ranks(&times);

        for (&(i, world_time), &rank) in order.iter().zip(ranks.iter()) {
            let rider = &mut riders[i];
            if let Some(effort) = rider.sprint_data.get_mut(key) {
                effort.rank = rank;
            }
            match kind {
                SegmentKind::Split => {
                    rider.sprint_details.insert(key.clone(), world_time as i64);
                }
                SegmentKind::Sprint => {
                    let points = points_at(&settings.sprint_points, rank as usize - 1);
                    if points > 0 {
                        rider.sprint_details.insert(key.clone(), points);
                        rider.sprint_points += points;
                    }
                }
            }
        }

        // Split crossing times are display data: record them for unranked
        // riders too.
        if kind == SegmentKind::Split {
            for rider in riders.iter_mut().filter(|r| r.disqualified || r.declassified) {
                if let Some(effort) = rider.sprint_data.get(key).copied() {
                    rider.sprint_details.insert(key.clone(), effort.world_time as i64);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::types::{SprintConfig, SprintEffort};

    fn settings() -> LeagueSettings {
        LeagueSettings {
            finish_points: vec![10, 7, 5, 3, 1],
            sprint_points: vec![5, 3, 2],
            league_rank_points: Vec::new(),
            best_races_count: 5,
        }
    }

    fn sprint_config(id: &str, count: u32, kind: Option<SegmentKind>) -> SprintConfig {
        SprintConfig {
            id: id.to_string(),
            count,
            key: String::new(),
            kind,
        }
    }

    fn rider(id: &str, finish_time_ms: u64) -> RiderResult {
        RiderResult::new(id, format!("Rider {id}"), finish_time_ms)
    }

    fn with_effort(mut rider: RiderResult, key: &str, world_time: u64) -> RiderResult {
        rider.sprint_data.insert(
            key.to_string(),
            SprintEffort {
                elapsed_ms: 30_000,
                world_time,
                avg_power: 350,
                rank: 0,
            },
        );
        rider
    }

    #[test]
    fn test_finish_points_scenario() {
        let riders = vec![rider("X", 600_000), rider("Y", 0), rider("Z", 580_000)];
        let config = RaceConfig::default();

        let results = score_race(riders, "A", &config, &settings(), None).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.rider_id.as_str()).collect();
        assert_eq!(ids, vec!["Z", "X", "Y"]);
        assert_eq!(results[0].finish_rank, 1);
        assert_eq!(results[0].finish_points, 10);
        assert_eq!(results[1].finish_rank, 2);
        assert_eq!(results[1].finish_points, 7);
        // DNF: unranked, no points, sorted last.
        assert_eq!(results[2].finish_rank, 0);
        assert_eq!(results[2].finish_points, 0);
    }

    #[test]
    fn test_excluded_riders_never_appear() {
        let riders = vec![rider("1", 600_000), rider("2", 580_000)];
        let config = RaceConfig {
            manual_exclusions: vec!["2".into()],
            ..RaceConfig::default()
        };

        let results = score_race(riders, "A", &config, &settings(), None).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rider_id, "1");
        assert_eq!(results[0].finish_rank, 1);
    }

    #[test]
    fn test_dq_scores_zero_even_when_fastest() {
        let riders = vec![
            with_effort(rider("1", 580_000), "s_1", 100),
            with_effort(rider("2", 600_000), "s_1", 105),
        ];
        let config = RaceConfig {
            sprints: vec![sprint_config("s", 1, None)],
            manual_dqs: vec!["1".into()],
            ..RaceConfig::default()
        };

        let results = score_race(riders, "A", &config, &settings(), None).unwrap();

        let dq = results.iter().find(|r| r.rider_id == "1").unwrap();
        assert!(dq.disqualified);
        assert_eq!(dq.finish_rank, DQ_FINISH_RANK);
        assert_eq!(dq.total_points, 0);
        assert_eq!(dq.sprint_data["s_1"].rank, 0);
        // The valid rider inherits first place everywhere.
        let valid = results.iter().find(|r| r.rider_id == "2").unwrap();
        assert_eq!(valid.finish_rank, 1);
        assert_eq!(valid.sprint_data["s_1"].rank, 1);
        assert_eq!(valid.total_points, 10 + 5);
    }

    #[test]
    fn test_dq_wins_over_declassification() {
        let riders = vec![rider("1", 580_000)];
        let config = RaceConfig {
            manual_dqs: vec!["1".into()],
            manual_declassifications: vec!["1".into()],
            ..RaceConfig::default()
        };

        let results = score_race(riders, "A", &config, &settings(), None).unwrap();

        assert!(results[0].disqualified);
        assert!(!results[0].declassified);
        assert_eq!(results[0].total_points, 0);
    }

    #[test]
    fn test_declassified_scores_last_place() {
        // Two valid finishers, so the declassified rider gets the 3rd-place
        // value despite the fastest time.
        let riders = vec![rider("1", 500_000), rider("2", 580_000), rider("3", 600_000)];
        let config = RaceConfig {
            manual_declassifications: vec!["1".into()],
            ..RaceConfig::default()
        };

        let results = score_race(riders, "A", &config, &settings(), None).unwrap();

        let declassed = results.iter().find(|r| r.rider_id == "1").unwrap();
        assert!(declassed.declassified);
        assert_eq!(declassed.finish_rank, 3);
        assert_eq!(declassed.finish_points, 5);
        // Never more than any valid finisher.
        for valid in results.iter().filter(|r| !r.declassified) {
            assert!(declassed.finish_points <= valid.finish_points);
        }
    }

    #[test]
    fn test_declassified_earns_no_sprint_points() {
        let riders = vec![
            with_effort(rider("1", 500_000), "s_1", 100),
            with_effort(rider("2", 580_000), "s_1", 105),
        ];
        let config = RaceConfig {
            sprints: vec![sprint_config("s", 1, None)],
            manual_declassifications: vec!["1".into()],
            ..RaceConfig::default()
        };

        let results = score_race(riders, "A", &config, &settings(), None).unwrap();

        let declassed = results.iter().find(|r| r.rider_id == "1").unwrap();
        assert_eq!(declassed.sprint_points, 0);
        assert_eq!(declassed.sprint_data["s_1"].rank, 0);
        // Their total is exactly the last-place finish value.
        assert_eq!(declassed.total_points, declassed.finish_points);
    }

    #[test]
    fn test_sprint_tie_group_ranking() {
        let riders = vec![
            with_effort(rider("A", 600_000), "s_1", 100),
            with_effort(rider("B", 610_000), "s_1", 100),
            with_effort(rider("C", 620_000), "s_1", 105),
        ];
        let config = RaceConfig {
            sprints: vec![sprint_config("s", 1, None)],
            ..RaceConfig::default()
        };
        let settings = LeagueSettings {
            finish_points: Vec::new(),
            sprint_points: vec![5, 3, 2],
            ..LeagueSettings::default()
        };

        let results = score_race(riders, "A", &config, &settings, None).unwrap();

        let by_id = |id: &str| results.iter().find(|r| r.rider_id == id).unwrap();
        assert_eq!(by_id("A").sprint_data["s_1"].rank, 1);
        assert_eq!(by_id("A").sprint_points, 5);
        assert_eq!(by_id("B").sprint_data["s_1"].rank, 1);
        assert_eq!(by_id("B").sprint_points, 5);
        // Rank 2 is skipped: C is 3rd and takes the 3rd-place value.
        assert_eq!(by_id("C").sprint_data["s_1"].rank, 3);
        assert_eq!(by_id("C").sprint_points, 2);
    }

    #[test]
    fn test_split_records_time_but_no_points() {
        let riders = vec![
            with_effort(rider("1", 600_000), "s_1", 181_000),
            with_effort(rider("2", 610_000), "s_1", 179_000),
        ];
        let config = RaceConfig {
            sprints: vec![sprint_config("s", 1, Some(SegmentKind::Split))],
            manual_declassifications: vec!["2".into()],
            ..RaceConfig::default()
        };

        let results = score_race(riders, "A", &config, &settings(), None).unwrap();

        let valid = results.iter().find(|r| r.rider_id == "1").unwrap();
        assert_eq!(valid.sprint_points, 0);
        assert_eq!(valid.sprint_data["s_1"].rank, 1);
        assert_eq!(valid.sprint_details["s_1"], 181_000);
        // Declassified crossing stays visible for display, unranked.
        let declassed = results.iter().find(|r| r.rider_id == "2").unwrap();
        assert_eq!(declassed.sprint_details["s_1"], 179_000);
        assert_eq!(declassed.sprint_data["s_1"].rank, 0);
    }

    #[test]
    fn test_fresh_efforts_are_mapped_and_scored() {
        let riders = vec![rider("1", 600_000), rider("2", 610_000)];
        let config = RaceConfig {
            sprints: vec![sprint_config("s", 1, None)],
            ..RaceConfig::default()
        };
        let mut efforts = BTreeMap::new();
        efforts.insert(
            "s".to_string(),
            vec![
                SegmentCrossing {
                    rider_id: "2".into(),
                    world_time: 100,
                    elapsed_ms: 31_000,
                    avg_power: 400,
                },
                SegmentCrossing {
                    rider_id: "1".into(),
                    world_time: 104,
                    elapsed_ms: 30_000,
                    avg_power: 390,
                },
            ],
        );

        let results = score_race(riders, "A", &config, &settings(), Some(&efforts)).unwrap();

        // Rider 2 crossed first and wins the sprint despite the slower
        // elapsed time: arrival order decides.
        let second = results.iter().find(|r| r.rider_id == "2").unwrap();
        assert_eq!(second.sprint_points, 5);
        assert_eq!(second.sprint_details["s_1"], 5);
        let first = results.iter().find(|r| r.rider_id == "1").unwrap();
        assert_eq!(first.sprint_points, 3);
    }

    #[test]
    fn test_total_points_tie_broken_by_finish_time() {
        let riders = vec![rider("slow", 620_000), rider("fast", 580_000)];
        let settings = LeagueSettings {
            finish_points: vec![5, 5],
            ..LeagueSettings::default()
        };

        let results = score_race(riders, "A", &RaceConfig::default(), &settings, None).unwrap();

        assert_eq!(results[0].rider_id, "fast");
        assert_eq!(results[1].rider_id, "slow");
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let riders = vec![
            with_effort(rider("1", 600_000), "s_1", 100),
            with_effort(rider("2", 0), "s_1", 100),
            with_effort(rider("3", 580_000), "s_1", 105),
        ];
        let config = RaceConfig {
            sprints: vec![sprint_config("s", 1, None)],
            manual_declassifications: vec!["3".into()],
            ..RaceConfig::default()
        };

        let a = score_race(riders.clone(), "A", &config, &settings(), None).unwrap();
        let b = score_race(riders, "A", &config, &settings(), None).unwrap();

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_rescoring_replaces_previous_pass() {
        let riders = vec![rider("1", 600_000), rider("2", 580_000)];
        let config = RaceConfig::default();
        let first = score_race(riders, "A", &config, &settings(), None).unwrap();

        // Rescore the persisted results with a DQ added: stale points and
        // flags must not leak through.
        let config = RaceConfig {
            manual_dqs: vec!["2".into()],
            ..RaceConfig::default()
        };
        let second = score_race(first, "A", &config, &settings(), None).unwrap();

        let dq = second.iter().find(|r| r.rider_id == "2").unwrap();
        assert_eq!(dq.total_points, 0);
        let valid = second.iter().find(|r| r.rider_id == "1").unwrap();
        assert_eq!(valid.finish_rank, 1);
        assert_eq!(valid.finish_points, 10);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = RaceConfig {
            sprints: vec![sprint_config("s", 0, None)],
            ..RaceConfig::default()
        };
        let result = score_race(Vec::new(), "A", &config, &settings(), None);
        assert!(result.is_err());

        let bad_settings = LeagueSettings {
            best_races_count: -2,
            ..LeagueSettings::default()
        };
        let result = score_race(Vec::new(), "A", &RaceConfig::default(), &bad_settings, None);
        assert!(result.unwrap_err().to_string().contains("bestRacesCount"));
    }
}
