pub mod schedule;
pub mod types;

pub use schedule::race_datetime;
pub use types::{
    CategoryConfig, RaceConfig, RaceType, RiderResult, SegmentKind, SprintConfig, SprintEffort,
    DQ_FINISH_RANK,
};
