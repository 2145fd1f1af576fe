use std::collections::HashSet;

use super::config::LeagueSettings;
use crate::race::types::{RaceConfig, SprintConfig};

/// Validate league settings before any scoring runs.
/// Returns all validation errors at once (not just the first).
pub fn validate_settings(settings: &LeagueSettings) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if settings.best_races_count < 0 {
        errors.push(format!(
            "settings.bestRacesCount: must be non-negative, got {}",
            settings.best_races_count
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a race configuration. Occurrence counts are 1-based, and display
/// keys must be unique once derived — a duplicate would make two sprint
/// occurrences overwrite each other's data.
pub fn validate_race(race: &RaceConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let race = race.normalized();

    check_sprints(&race.sprints, "race.sprints", &mut errors);
    for category in &race.event_configuration {
        if let Some(sprints) = &category.sprints {
            let path = format!("race.eventConfiguration[{}].sprints", category.category);
            check_sprints(sprints, &path, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_sprints(sprints: &[SprintConfig], path: &str, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for (i, sprint) in sprints.iter().enumerate() {
        if sprint.count == 0 {
            errors.push(format!(
                "{}[{}].count: occurrence index is 1-based, got 0",
                path, i
            ));
        }
        if !seen.insert(sprint.key.as_str()) {
            errors.push(format!(
                "{}[{}].key: duplicate display key '{}'",
                path, i, sprint.key
            ));
        }
    }
}
