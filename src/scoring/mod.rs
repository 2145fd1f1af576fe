pub mod config;
pub mod engine;
pub mod points;
pub mod ranker;
pub mod segments;
pub mod validation;

pub use config::LeagueSettings;
pub use engine::score_race;
pub use ranker::assign_league_points;
pub use segments::map_segment_efforts;
pub use validation::{validate_race, validate_settings};
