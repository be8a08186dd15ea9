//! Host integration points
//!
//! The profiler core does not own the sampling engine, the wall clock, live
//! configuration or profile storage; the embedding process supplies them
//! through these traits. Reference implementations cover the common cases and
//! keep tests honest.

use crate::error::Result;
use crate::profile::{ProfileCandidate, Reason, TaskProfile};
use crate::sample::{MemorySample, SampleSet, StackSample};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of timestamped stack samples, usually a wrapped sampling engine
pub trait Sampler: Send {
    /// Drain every sample buffered since the previous flush, oldest first
    fn flush(&mut self) -> Vec<StackSample>;

    /// Stop sample production. Later flushes return only what was already
    /// buffered when the stop took effect.
    fn stop(&mut self);
}

/// Process-level measurements the profiler reads but does not own
pub trait HostProbe: Send {
    /// Current memory usage in bytes
    fn memory_usage(&self) -> u64;

    /// Current wall-clock time, epoch seconds
    fn now(&self) -> f64;
}

/// Live configuration reads.
///
/// Queried on every evaluation rather than cached, so operators can change
/// thresholds while a worker is running.
pub trait ConfigSource: Send + Sync {
    /// Minimum window duration worth profiling, in seconds.
    /// An error means the configuration store is unreachable, which is fatal.
    fn min_duration(&self) -> Result<f64>;
}

/// Classifies closed windows by why they might be worth keeping
pub trait ReasonEvaluator: Send + Sync {
    /// Evaluate a candidate against the current minimum duration
    fn evaluate(&self, candidate: &ProfileCandidate, min_duration: f64) -> Reason;
}

/// Receives profiles that passed eligibility
pub trait ProfileSink: Send {
    /// Persist one profile record
    fn store(&mut self, profile: &TaskProfile) -> Result<()>;
}

/// Receives closed windows from the segment processor
pub trait WindowSink {
    /// Take ownership of a closed window's sample sets.
    /// `finish_time` is the absolute end of the window, epoch seconds.
    fn close_window(
        &mut self,
        task: SampleSet<StackSample>,
        memory: SampleSet<MemorySample>,
        finish_time: f64,
    ) -> Result<()>;
}

/// Reference evaluator keeping only windows that ran at least the configured
/// minimum duration. A threshold of zero disables the slow-window signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdEvaluator;

impl ReasonEvaluator for ThresholdEvaluator {
    fn evaluate(&self, candidate: &ProfileCandidate, min_duration: f64) -> Reason {
        if min_duration > 0.0 && candidate.duration >= min_duration {
            Reason::SLOW
        } else {
            Reason::NONE
        }
    }
}

/// Profile sink that collects records in memory.
///
/// Clones share the same backing store, so a handle kept outside the engine
/// observes everything stored inside it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    profiles: Arc<Mutex<Vec<TaskProfile>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records stored so far
    pub fn profiles(&self) -> Vec<TaskProfile> {
        self.profiles.lock().clone()
    }

    /// Number of records stored so far
    pub fn len(&self) -> usize {
        self.profiles.lock().len()
    }

    /// Whether nothing has been stored
    pub fn is_empty(&self) -> bool {
        self.profiles.lock().is_empty()
    }
}

impl ProfileSink for MemorySink {
    fn store(&mut self, profile: &TaskProfile) -> Result<()> {
        self.profiles.lock().push(profile.clone());
        Ok(())
    }
}
