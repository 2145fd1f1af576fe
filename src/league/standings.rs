use std::cmp::Reverse;
use std::collections::BTreeMap;

use anyhow::{bail, Result};
use log::{debug, info};

use super::types::{RaceScore, StandingsEntry};
use crate::race::schedule::race_datetime;
use crate::race::types::{RaceConfig, RiderResult};
use crate::scoring::{assign_league_points, validation, LeagueSettings};

/// Fresh results for a race whose persisted copy may not yet be visible to a
/// re-read. Passing the just-computed document here gives the caller
/// read-your-writes semantics instead of waiting on eventual consistency.
#[derive(Debug, Clone, Copy)]
pub struct StandingsOverride<'a> {
    pub race_id: &'a str,
    pub race: &'a RaceConfig,
}

/// Aggregate every race's results into per-category season standings.
///
/// A full batch recompute over all races — at league scale (tens of races)
/// that is cheaper than being clever. League points are always re-derived
/// from each race's current manual sets; `leaguePoints` values persisted on
/// the results are treated as a display cache, not as authority, so a
/// late-added DQ or exclusion takes effect without rescoring the race.
pub fn compute_standings(
    races: &[RaceConfig],
    settings: &LeagueSettings,
    override_race: Option<StandingsOverride<'_>>,
) -> Result<BTreeMap<String, Vec<StandingsEntry>>> {
    if let Err(errors) = validation::validate_settings(settings) {
        bail!("invalid league settings: {}", errors.join("; "));
    }
    info!(
        "calculating league standings (best {} races)",
        settings.best_races_count
    );

    let mut table: BTreeMap<String, BTreeMap<String, StandingsEntry>> = BTreeMap::new();
    let mut counted_races = 0;

    for race in races {
        let race = match override_race {
            Some(o) if race.id == o.race_id => {
                debug!("using fresh data for race {}", o.race_id);
                o.race
            }
            _ => race,
        };
        if race.results.is_empty() {
            continue;
        }
        counted_races += 1;

        let race_date = race_datetime(race);
        let excluded = race.exclusion_set();

        for (category, riders) in &race.results {
            let mut ranked: Vec<RiderResult> = riders.clone();
            assign_league_points(&mut ranked, category, race, settings);

            let bucket = table.entry(category.clone()).or_default();
            for rider in &ranked {
                if excluded.contains(rider.rider_id.as_str()) {
                    continue;
                }
                let Some(points) = rider.league_points else {
                    continue;
                };
                // A zero from a rider who never finished and never crossed a
                // segment is not a participation; do not burn a race entry.
                if points == 0 && !rider.finished() && rider.sprint_data.is_empty() {
                    continue;
                }

                let entry = bucket
                    .entry(rider.rider_id.clone())
                    .or_insert_with(|| StandingsEntry::new(&rider.rider_id, &rider.name));
                entry.race_count += 1;
                entry.results.push(RaceScore {
                    race_id: race.id.clone(),
                    points,
                });
                if let Some(date) = race_date {
                    if entry.last_race_date.map_or(true, |last| date >= last) {
                        entry.last_race_date = Some(date);
                        entry.last_race_points = points;
                    }
                }
            }
        }
    }
    info!("processed {counted_races} races for standings");

    let best_n = settings.best_races_count.max(0) as usize;
    let mut standings = BTreeMap::new();
    for (category, riders) in table {
        let mut entries: Vec<StandingsEntry> = riders.into_values().collect();
        for entry in entries.iter_mut() {
            // Races beyond the best N stay on record but do not count.
            entry.results.sort_by_key(|r| Reverse(r.points));
            entry.total_points = entry.results.iter().take(best_n).map(|r| r.points).sum();
        }
        entries.sort_by_key(|e| (Reverse(e.total_points), Reverse(e.last_race_points)));
        standings.insert(category, entries);
    }
    Ok(standings)
}
