use anyhow::Result;

use super::types::{EventInfo, FinisherEntry, ParticipantEntry, SegmentCrossing, TimeWindow};

/// Boundary to the external race-timing platform.
///
/// Implementations own every network, auth and decoding concern; the engine
/// only ever sees plain data. All methods are synchronous — the engine has
/// no suspension points, and cancellation belongs to the caller.
pub trait TimingProvider {
    fn event_info(&self, event_id: &str) -> Result<EventInfo>;

    /// Timed results for one subgroup, unordered.
    fn finishers(&self, subgroup_id: u64) -> Result<Vec<FinisherEntry>>;

    /// Signed-up riders for one subgroup; `joined_only` restricts to riders
    /// that actually entered the start pen.
    fn participants(&self, subgroup_id: u64, joined_only: bool) -> Result<Vec<ParticipantEntry>>;

    /// Raw crossings of one course segment inside a time window.
    fn segment_results(&self, segment_id: &str, window: TimeWindow) -> Result<Vec<SegmentCrossing>>;
}

/// Registered-rider lookup: external rider id to the league display name.
/// Registration status itself is not the engine's concern.
pub trait RosterProvider {
    fn display_name(&self, rider_id: &str) -> Option<String>;
}
