use mandeltile_core::EscapeTimeBuffer;

/// Occurrence count of every escape time within one buffer.
///
/// Indexed `0..=max_iterations`: bounded orbits record exactly
/// `max_iterations`, so that value needs its own bucket.
#[derive(Debug, Clone)]
pub struct Histogram {
    counts: Vec<u32>,
    total: u64,
}

impl Histogram {
    pub fn build(buffer: &EscapeTimeBuffer) -> Self {
        let mut counts = vec![0u32; buffer.max_iterations as usize + 1];
        for &t in &buffer.data {
            // Values above the budget would break the buffer invariant; clamp
            // them into the interior bucket instead of indexing out of range.
            let idx = (t as usize).min(counts.len() - 1);
            counts[idx] += 1;
        }
        Self {
            counts,
            total: buffer.data.len() as u64,
        }
    }

    /// Number of pixels with escape time `t`.
    pub fn count(&self, t: u32) -> u32 {
        self.counts.get(t as usize).copied().unwrap_or(0)
    }

    /// Number of pixels counted, equal to the sum of all buckets.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn buckets(&self) -> &[u32] {
        &self.counts
    }
}
