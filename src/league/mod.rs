pub mod standings;
pub mod types;

pub use standings::{compute_standings, StandingsOverride};
pub use types::{RaceScore, StandingsEntry};
