/// Points value for a 0-based position in an ordered scheme; positions past
/// the end of the scheme are worth nothing.
pub fn points_at(scheme: &[i64], index: usize) -> i64 {
    scheme.get(index).copied().unwrap_or(0)
}

/// Standard competition ranking over an ascending sequence of crossing
/// times: tied values share one rank, and the next distinct value skips
/// ahead by the size of the tie group (1, 1, 3, 4, ...).
///
/// The input must already be sorted ascending.
pub fn competition_ranks(times: &[u64]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(times.len());
    for (i, time) in times.iter().enumerate() {
        if i > 0 && *time == times[i - 1] {
            let shared = ranks[i - 1];
            ranks.push(shared);
        } else {
            ranks.push(i as u32 + 1);
        }
    }
    ranks
}
