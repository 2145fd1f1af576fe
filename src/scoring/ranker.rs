use std::cmp::Reverse;
use std::collections::HashSet;

use super::config::LeagueSettings;
use super::points::points_at;
use crate::race::types::{RaceConfig, RaceType, RiderResult, SegmentKind, SprintConfig};

/// Annotate each rider with the preliminary league points for this race.
///
/// League points exist only for season standings; they are distinct from the
/// race's own finish and sprint points. One canonical algorithm per race
/// type. Always: disqualified riders get 0, excluded riders get `None`
/// ("this race does not count for this rider", as opposed to counting as a
/// zero), and riders with no activity at all get `None`.
pub fn assign_league_points(
    riders: &mut [RiderResult],
    category: &str,
    config: &RaceConfig,
    settings: &LeagueSettings,
) {
    let config = config.normalized();
    let dqs = config.dq_set();
    let declassed = config.declassification_set();
    let excluded = config.exclusion_set();

    if settings.league_rank_points.is_empty() {
        assign_from_totals(riders, &settings.finish_points, &dqs, &declassed, &excluded);
        return;
    }

    match config.race_type {
        RaceType::Scratch | RaceType::Points => {
            rank_by_totals(riders, &settings.league_rank_points, &dqs, &declassed, &excluded)
        }
        RaceType::TimeTrial => rank_time_trial(
            riders,
            category,
            &config,
            &settings.league_rank_points,
            &dqs,
            &declassed,
            &excluded,
        ),
    }
}

fn is_active(rider: &RiderResult) -> bool {
    rider.finished() || rider.total_points > 0 || !rider.sprint_data.is_empty()
}

/// No league-rank scheme configured: league points are the raw race totals,
/// except that declassified riders carry the last-place finish value so they
/// cannot outrank anyone through sprints they no longer hold.
fn assign_from_totals(
    riders: &mut [RiderResult],
    finish_scheme: &[i64],
    dqs: &HashSet<&str>,
    declassed: &HashSet<&str>,
    excluded: &HashSet<&str>,
) {
    let valid_finishers = riders
        .iter()
        .filter(|r| {
            let id = r.rider_id.as_str();
            r.finished() && !dqs.contains(id) && !declassed.contains(id) && !excluded.contains(id)
        })
        .count();
    let last_place_points = points_at(finish_scheme, valid_finishers);

    for rider in riders.iter_mut() {
        let id = rider.rider_id.as_str();
        if excluded.contains(id) {
            rider.league_points = None;
        } else if dqs.contains(id) {
            rider.league_points = Some(0);
        } else if !is_active(rider) {
            rider.league_points = None;
        } else if declassed.contains(id) {
            rider.league_points = Some(last_place_points);
        } else {
            rider.league_points = Some(rider.total_points);
        }
    }
}

/// Scratch and points races: candidates ranked by raw totals, finish rank
/// breaking ties, declassified riders forced after every valid candidate.
fn rank_by_totals(
    riders: &mut [RiderResult],
    scheme: &[i64],
    dqs: &HashSet<&str>,
    declassed: &HashSet<&str>,
    excluded: &HashSet<&str>,
) {
    let mut candidates: Vec<usize> = Vec::new();
    for (i, rider) in riders.iter().enumerate() {
        let id = rider.rider_id.as_str();
        if excluded.contains(id) || dqs.contains(id) || !is_active(rider) {
            continue;
        }
        candidates.push(i);
    }

    candidates.sort_by_key(|&i| {
        let rider = &riders[i];
        (
            declassed.contains(rider.rider_id.as_str()),
            Reverse(rider.total_points),
            rank_sort_key(rider.finish_rank),
        )
    });

    apply_defaults(riders, dqs, excluded);
    for (position, &i) in candidates.iter().enumerate() {
        riders[i].league_points = Some(points_at(scheme, position));
    }
}

/// Time trials: finishers by finish time, then non-finishers by how far they
/// got — the last split reached beats less progress, and among equal
/// progress the earlier crossing wins. Declassified riders rank after
/// everyone else.
fn rank_time_trial(
    riders: &mut [RiderResult],
    category: &str,
    config: &RaceConfig,
    scheme: &[i64],
    dqs: &HashSet<&str>,
    declassed: &HashSet<&str>,
    excluded: &HashSet<&str>,
) {
    let splits = ordered_splits(config.sprints_for(category), config.segment_type);

    struct Candidate {
        index: usize,
        declassified: bool,
        finished: bool,
        finish_time_ms: u64,
        split_index: i64,
        world_time: u64,
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for (i, rider) in riders.iter().enumerate() {
        let id = rider.rider_id.as_str();
        if excluded.contains(id) || dqs.contains(id) {
            continue;
        }
        let progress = furthest_split(rider, &splits);
        if !rider.finished() && progress.is_none() {
            continue;
        }
        let (split_index, world_time) = match progress {
            Some((index, world_time)) => (index as i64, world_time),
            None => (-1, u64::MAX),
        };
        candidates.push(Candidate {
            index: i,
            declassified: declassed.contains(id),
            finished: rider.finished(),
            finish_time_ms: rider.finish_time_ms,
            split_index,
            world_time,
        });
    }

    candidates.sort_by_key(|c| {
        if c.finished {
            (c.declassified, 0u8, c.finish_time_ms, Reverse(0), 0)
        } else {
            (c.declassified, 1u8, 0, Reverse(c.split_index), c.world_time)
        }
    });

    apply_defaults(riders, dqs, excluded);
    for (position, candidate) in candidates.iter().enumerate() {
        riders[candidate.index].league_points = Some(points_at(scheme, position));
    }
}

fn apply_defaults(riders: &mut [RiderResult], dqs: &HashSet<&str>, excluded: &HashSet<&str>) {
    for rider in riders.iter_mut() {
        let id = rider.rider_id.as_str();
        rider.league_points = if excluded.contains(id) {
            None
        } else if dqs.contains(id) {
            Some(0)
        } else {
            None
        };
    }
}

fn rank_sort_key(finish_rank: u32) -> u32 {
    if finish_rank == 0 {
        u32::MAX
    } else {
        finish_rank
    }
}

/// The race's split-kind segments in course order.
fn ordered_splits(sprints: &[SprintConfig], race_default: SegmentKind) -> Vec<SprintConfig> {
    let mut splits: Vec<SprintConfig> = sprints
        .iter()
        .filter(|s| s.effective_kind(race_default) == SegmentKind::Split)
        .cloned()
        .collect();
    splits.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.key.cmp(&b.key)));
    splits
}

/// The last split a rider crossed: scan backward through the course for the
/// first crossing with a real worldTime.
fn furthest_split(rider: &RiderResult, splits: &[SprintConfig]) -> Option<(usize, u64)> {
    for (i, split) in splits.iter().enumerate().rev() {
        if let Some(effort) = rider.sprint_data.get(&split.key) {
            if effort.world_time > 0 {
                return Some((i, effort.world_time));
            }
        }
    }
    None
}
