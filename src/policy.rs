//! Window eligibility and profile persistence
//!
//! Every closed window becomes a candidate; most candidates are dropped.
//! Three signals can keep one: it ran longer than the configured minimum, an
//! external evaluator flagged it, or the per-task admission counter selected
//! it. Admission probability halves as a task's invocation count grows, so
//! frequent tasks stay cheap while rare ones are still seen.

use crate::counter::{estimated_total, AdaptiveCounter};
use crate::error::Result;
use crate::flame::FlameNode;
use crate::host::{ConfigSource, ProfileSink, ReasonEvaluator, WindowSink};
use crate::profile::{ProfileCandidate, Reason};
use crate::sample::{MemorySample, SampleSet, StackSample};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::info;

/// Decides, per closed window, whether a profile is persisted
pub struct EligibilityPolicy {
    config: Arc<dyn ConfigSource>,
    evaluator: Arc<dyn ReasonEvaluator>,
    sink: Box<dyn ProfileSink>,
    counter: AdaptiveCounter,
    invocations: FxHashMap<String, u64>,
}

impl EligibilityPolicy {
    /// Create a policy wiring a config source, an evaluator and a sink
    pub fn new(
        config: Arc<dyn ConfigSource>,
        evaluator: Arc<dyn ReasonEvaluator>,
        sink: Box<dyn ProfileSink>,
    ) -> Self {
        Self {
            config,
            evaluator,
            sink,
            counter: AdaptiveCounter::new(),
            invocations: FxHashMap::default(),
        }
    }

    /// Replace the entropy-seeded admission counter, for reproducible behavior
    pub fn with_counter(mut self, counter: AdaptiveCounter) -> Self {
        self.counter = counter;
        self
    }

    /// Stored approximate invocation value for a task
    pub fn invocation_count(&self, task: &str) -> u64 {
        self.invocations.get(task).copied().unwrap_or(0)
    }

    /// Restore a stored approximate invocation value, as persisted across
    /// worker restarts
    pub fn set_invocation_count(&mut self, task: impl Into<String>, value: u64) {
        self.invocations.insert(task.into(), value);
    }

    /// Estimated number of times a task has run
    pub fn estimated_invocations(&self, task: &str) -> u64 {
        estimated_total(self.invocation_count(task))
    }

    /// Count one more invocation of `task`; true if the stored value advanced
    fn admit(&mut self, task: &str) -> bool {
        let entry = self.invocations.entry(task.to_string()).or_insert(0);
        let next = self.counter.advance(*entry, 1);
        let advanced = next != *entry;
        *entry = next;
        advanced
    }
}

impl WindowSink for EligibilityPolicy {
    fn close_window(
        &mut self,
        task: SampleSet<StackSample>,
        memory: SampleSet<MemorySample>,
        finish_time: f64,
    ) -> Result<()> {
        let candidate = ProfileCandidate {
            task: task.name().to_string(),
            created: task.start_time() as i64,
            duration: finish_time - task.start_time(),
        };

        // Read the threshold fresh on every window so live edits apply.
        let min_duration = self.config.min_duration()?;
        let mut reason = self.evaluator.evaluate(&candidate, min_duration);
        if self.admit(&candidate.task) {
            reason |= Reason::SAMPLED;
        }

        if reason.is_none() {
            return Ok(());
        }

        let profile = candidate.into_profile(
            finish_time as i64,
            reason,
            memory.into_samples(),
            FlameNode::from_samples(task.samples()),
        );
        self.sink.store(&profile)?;
        info!(
            "Stored profile for '{}' ({:.3}s, reason {})",
            profile.task, profile.duration, profile.reason
        );
        Ok(())
    }
}
