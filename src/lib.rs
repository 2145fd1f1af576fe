//! Race scoring and season standings for a recreational cycling league.
//!
//! The crate is the computation core of the league backend: it turns raw
//! per-rider timing and segment data into race points, and rolls per-race
//! scores into season standings with a best-N-races rule. Everything here is
//! synchronous and side-effect-free — adapters fetch the data
//! ([`timing::TimingProvider`], [`timing::RosterProvider`]) and the caller
//! owns persistence.
//!
//! The usual flow:
//!
//! 1. [`processor::process_race`] — fetch riders and segment crossings for
//!    one race, score every category ([`scoring::score_race`]) and attach
//!    league points ([`scoring::assign_league_points`]), under a
//!    [`lock::RaceLocks`] guard.
//! 2. Persist the returned results map on the race document.
//! 3. [`league::compute_standings`] — re-read all races and rebuild the
//!    season tables, passing the fresh race as an override when the write
//!    may not be visible yet.

pub mod league;
pub mod lock;
pub mod processor;
pub mod race;
pub mod scoring;
pub mod timing;

pub use league::{compute_standings, RaceScore, StandingsEntry, StandingsOverride};
pub use lock::{RaceGuard, RaceLocks};
pub use processor::{process_race, FetchMode, ProcessOptions};
pub use race::{RaceConfig, RaceType, RiderResult, SegmentKind, SprintConfig};
pub use scoring::{assign_league_points, score_race, LeagueSettings};
