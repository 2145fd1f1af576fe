use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::Duration;
use log::{debug, warn};

use crate::race::schedule::parse_datetime;
use crate::race::types::{RaceConfig, RiderResult};
use crate::scoring::{assign_league_points, score_race, LeagueSettings};
use crate::timing::types::TimeWindow;
use crate::timing::{RosterProvider, TimingProvider};

/// Where the rider list for a refresh comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Timed results; the normal mode once a race has run.
    Finishers,
    /// Riders who entered the start pen, no times yet.
    Joined,
    /// Everyone signed up, no times yet.
    SignedUp,
}

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub fetch_mode: FetchMode,
    /// Keep only riders the roster knows. When false, unregistered riders
    /// are carried with their platform display name.
    pub filter_registered: bool,
    /// Restrict the refresh to one category; `None` processes all of them.
    pub category_filter: Option<String>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        ProcessOptions {
            fetch_mode: FetchMode::Finishers,
            filter_registered: true,
            category_filter: None,
        }
    }
}

/// Length of the window segment crossings are fetched for, from each
/// category's start. Generous enough for any league race.
const SEGMENT_WINDOW_HOURS: i64 = 3;

/// Fetch, score and league-rank one race.
///
/// This is the whole of an admin "recalculate this race" action: pull event
/// info and rider lists from the timing platform, attach roster names, map
/// raw segment crossings, then run the scorer and the league ranker per
/// category. Returns the per-category results map ready to persist; the
/// caller owns the write (and should hold the race's
/// [`crate::lock::RaceLocks`] guard around fetch-score-persist).
pub fn process_race(
    race: &RaceConfig,
    event_id: &str,
    timing: &dyn TimingProvider,
    roster: &dyn RosterProvider,
    settings: &LeagueSettings,
    options: &ProcessOptions,
) -> Result<BTreeMap<String, Vec<RiderResult>>> {
    let race = race.normalized();
    let event = timing
        .event_info(event_id)
        .with_context(|| format!("failed to fetch event {event_id}"))?;
    debug!(
        "event '{}': {} subgroups, race {}",
        event.name,
        event.subgroups.len(),
        race.id
    );

    let mut all_results = BTreeMap::new();
    for subgroup in &event.subgroups {
        let category = subgroup.label.clone();
        if let Some(filter) = &options.category_filter {
            if *filter != category {
                continue;
            }
        }

        let Some(start) = subgroup.start.as_deref().and_then(parse_datetime) else {
            warn!(
                "race {}: cannot parse start time for category {category}, skipping",
                race.id
            );
            continue;
        };

        let riders = build_riders(subgroup.id, timing, roster, options)
            .with_context(|| format!("failed to fetch riders for category {category}"))?;
        if riders.is_empty() {
            debug!("category {category}: no riders matched, skipping");
            continue;
        }

        // Raw crossings for every configured segment, one query per unique
        // segment id. A failed segment degrades to "no data", not an error.
        let window = TimeWindow {
            from: start,
            to: start + Duration::hours(SEGMENT_WINDOW_HOURS),
        };
        let segment_ids: BTreeSet<&str> =
            race.sprints_for(&category).iter().map(|s| s.id.as_str()).collect();
        let mut efforts = BTreeMap::new();
        for segment_id in segment_ids {
            match timing.segment_results(segment_id, window) {
                Ok(crossings) => {
                    efforts.insert(segment_id.to_string(), crossings);
                }
                Err(e) => warn!("failed to fetch segment {segment_id}: {e:#}"),
            }
        }

        let mut scored = score_race(riders, &category, &race, settings, Some(&efforts))?;
        assign_league_points(&mut scored, &category, &race, settings);

        debug!("category {category}: {} results", scored.len());
        all_results.insert(category, scored);
    }
    Ok(all_results)
}

fn build_riders(
    subgroup_id: u64,
    timing: &dyn TimingProvider,
    roster: &dyn RosterProvider,
    options: &ProcessOptions,
) -> Result<Vec<RiderResult>> {
    match options.fetch_mode {
        FetchMode::Finishers => {
            let mut entries = timing.finishers(subgroup_id)?;
            entries.sort_by_key(|e| e.finish_time_ms);
            let mut riders = Vec::new();
            for entry in entries {
                let Some(name) = resolve_name(
                    roster,
                    &entry.rider_id,
                    entry.name.as_deref(),
                    options.filter_registered,
                ) else {
                    continue;
                };
                let mut rider = RiderResult::new(entry.rider_id.clone(), name, entry.finish_time_ms);
                rider.flagged_cheating = entry.flagged_cheating;
                rider.flagged_sandbagging = entry.flagged_sandbagging;
                riders.push(rider);
            }
            Ok(riders)
        }
        FetchMode::Joined | FetchMode::SignedUp => {
            let joined_only = options.fetch_mode == FetchMode::Joined;
            let entries = timing.participants(subgroup_id, joined_only)?;
            let mut riders = Vec::new();
            for entry in entries {
                let platform_name = entry.display_name();
                let Some(name) = resolve_name(
                    roster,
                    &entry.rider_id,
                    Some(&platform_name),
                    options.filter_registered,
                ) else {
                    continue;
                };
                riders.push(RiderResult::new(entry.rider_id.clone(), name, 0));
            }
            riders.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(riders)
        }
    }
}

/// Registered riders always carry their league name; unregistered riders are
/// dropped or fall back to the platform name depending on the filter.
fn resolve_name(
    roster: &dyn RosterProvider,
    rider_id: &str,
    platform_name: Option<&str>,
    filter_registered: bool,
) -> Option<String> {
    match roster.display_name(rider_id) {
        Some(name) => Some(name),
        None if filter_registered => None,
        None => Some(platform_name.unwrap_or_default().to_string()),
    }
}
