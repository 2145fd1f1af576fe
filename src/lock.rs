use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

/// Serializes "refresh results" actions per race id.
///
/// Two concurrent refreshes of the same race would interleave their
/// read-score-write cycles and the slower one would silently overwrite the
/// faster one's results. Callers take the race's guard around the whole
/// fetch-score-persist sequence; distinct race ids never contend.
#[derive(Default)]
pub struct RaceLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl RaceLocks {
    pub fn new() -> Self {
        RaceLocks::default()
    }

    /// Block until `race_id` is free, then hold it until the guard drops.
    pub fn lock(&self, race_id: &str) -> RaceGuard<'_> {
        let mut held = self.held.lock().expect("race lock poisoned");
        while held.contains(race_id) {
            held = self.released.wait(held).expect("race lock poisoned");
        }
        held.insert(race_id.to_string());
        RaceGuard {
            locks: self,
            race_id: race_id.to_string(),
        }
    }

    /// Non-blocking variant: `None` when a refresh of `race_id` is already
    /// in flight, which callers typically surface as "refresh already
    /// running".
    pub fn try_lock(&self, race_id: &str) -> Option<RaceGuard<'_>> {
        let mut held = self.held.lock().expect("race lock poisoned");
        if held.contains(race_id) {
            return None;
        }
        held.insert(race_id.to_string());
        Some(RaceGuard {
            locks: self,
            race_id: race_id.to_string(),
        })
    }
}

/// Releases the race id on drop.
pub struct RaceGuard<'a> {
    locks: &'a RaceLocks,
    race_id: String,
}

impl Drop for RaceGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().expect("race lock poisoned");
        held.remove(&self.race_id);
        self.locks.released.notify_all();
    }
}
