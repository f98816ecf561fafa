use crate::cell::Cell;
use std::collections::{HashSet, VecDeque};
use tracing::{info, trace};

/// A detected repetition of whole-grid state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cycle {
    /// Number of generations between repeats (1 for a still life).
    pub period: usize,
    /// First generation of the repeating sequence.
    pub start_generation: u64,
}

/// Fingerprint of a full grid: blake3 over every cell code in row-major order, truncated to 64 bits.
pub fn fingerprint<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> u64 {
    let mut hasher = blake3::Hasher::new();
    let mut code = String::with_capacity(64);
    for cell in cells {
        code.clear();
        cell.write_code(&mut code);
        hasher.update(code.as_bytes());
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Bounded FIFO of generation fingerprints that reports the first repeat it sees.
///
/// Periods longer than the history capacity are never detected.
#[derive(Clone, Debug)]
pub struct CycleDetector {
    generation: u64,
    history: VecDeque<u64>,
    // Mirror of `history` for O(1) membership; history never holds duplicates.
    seen: HashSet<u64>,
    capacity: usize,
    repeat_period: usize,
    message: Option<String>,
}

impl CycleDetector {
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be positive");
        Self {
            generation: 0,
            history: VecDeque::with_capacity(capacity.min(1024)),
            seen: HashSet::with_capacity(capacity.min(1024)),
            capacity,
            repeat_period: 0,
            message: None,
        }
    }

    /// Forget everything, including the generation counter.
    pub fn reset(&mut self) {
        self.generation = 0;
        self.reset_detection();
    }

    /// Forget history and any detected cycle but keep counting generations.
    pub fn reset_detection(&mut self) {
        self.history.clear();
        self.seen.clear();
        self.repeat_period = 0;
        self.message = None;
    }

    /// Record the fingerprint of the current generation without advancing the counter.
    ///
    /// Used for the seeded generation 0 and after edits.
    pub fn record(&mut self, fingerprint: u64) -> Option<Cycle> {
        trace!(generation = self.generation, fingerprint, "generation fingerprint");
        if self.seen.contains(&fingerprint) {
            if self.repeat_period != 0 {
                return None;
            }
            while let Some(front) = self.history.front() {
                if *front == fingerprint {
                    break;
                }
                if let Some(evicted) = self.history.pop_front() {
                    self.seen.remove(&evicted);
                }
            }
            self.repeat_period = self.history.len();
            let cycle = Cycle {
                period: self.repeat_period,
                start_generation: self.generation.saturating_sub(self.repeat_period as u64),
            };
            info!(
                period = cycle.period,
                start_generation = cycle.start_generation,
                "cycle detected"
            );
            self.message = Some(format!(
                "cycle detected: period {}, starting at generation {}",
                cycle.period, cycle.start_generation
            ));
            return Some(cycle);
        }

        self.history.push_back(fingerprint);
        self.seen.insert(fingerprint);
        if self.history.len() > self.capacity {
            if let Some(evicted) = self.history.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        None
    }

    /// Advance the generation counter and record its fingerprint.
    ///
    /// Returns the cycle only on the generation where it is first detected.
    pub fn observe(&mut self, fingerprint: u64) -> Option<Cycle> {
        self.generation = self.generation.saturating_add(1);
        self.record(fingerprint)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Detected period, or 0 while none has been found.
    pub fn repeat_period(&self) -> usize {
        self.repeat_period
    }

    pub fn cycle(&self) -> Option<Cycle> {
        (self.repeat_period != 0).then(|| Cycle {
            period: self.repeat_period,
            start_generation: self.generation.saturating_sub(self.repeat_period as u64),
        })
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
