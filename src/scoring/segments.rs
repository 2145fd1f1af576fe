use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::race::types::{RiderResult, SprintConfig, SprintEffort};
use crate::timing::types::SegmentCrossing;

/// Map raw per-segment crossings onto each rider's `sprintData`.
///
/// Crossings are grouped per rider and ordered by `worldTime`; the earliest
/// crossing is occurrence 1, the next occurrence 2, and so on. Each
/// occurrence is matched to the sprint config with that `count` and written
/// under the config's display key. A rider with fewer crossings than
/// configured occurrences simply has no data for the missing ones — they did
/// not reach that point, which is not an error.
///
/// Expects sprint keys to be resolved already (see
/// [`crate::race::types::RaceConfig::normalized`]).
pub fn map_segment_efforts(
    riders: &mut [RiderResult],
    efforts_by_segment: &BTreeMap<String, Vec<SegmentCrossing>>,
    sprints: &[SprintConfig],
) {
    if efforts_by_segment.is_empty() || sprints.is_empty() {
        return;
    }

    let rider_index: HashMap<String, usize> = riders
        .iter()
        .enumerate()
        .map(|(i, r)| (r.rider_id.clone(), i))
        .collect();

    let mut sprints_by_segment: HashMap<&str, Vec<&SprintConfig>> = HashMap::new();
    for sprint in sprints {
        sprints_by_segment.entry(sprint.id.as_str()).or_default().push(sprint);
    }

    for (segment_id, crossings) in efforts_by_segment {
        let Some(configs) = sprints_by_segment.get(segment_id.as_str()) else {
            debug!("segment {segment_id} has no sprint configured, skipping");
            continue;
        };

        // Keep only crossings of riders in this category's result list.
        let mut by_rider: BTreeMap<&str, Vec<&SegmentCrossing>> = BTreeMap::new();
        for crossing in crossings {
            if rider_index.contains_key(crossing.rider_id.as_str()) {
                by_rider.entry(crossing.rider_id.as_str()).or_default().push(crossing);
            }
        }

        for (rider_id, mut entries) in by_rider {
            entries.sort_by_key(|c| c.world_time);
            for (i, entry) in entries.iter().enumerate() {
                let occurrence = i as u32 + 1;
                let Some(config) = configs.iter().find(|s| s.count == occurrence) else {
                    continue;
                };
                let idx = rider_index[rider_id];
                riders[idx].sprint_data.insert(
                    config.key.clone(),
                    SprintEffort {
                        elapsed_ms: entry.elapsed_ms,
                        world_time: entry.world_time,
                        avg_power: entry.avg_power,
                        rank: 0,
                    },
                );
            }
        }
    }
}
