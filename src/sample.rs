//! Sample data model and the bounded per-window sample collection

use serde::{Deserialize, Serialize};

/// Default cap on the number of samples retained per window
pub const DEFAULT_SAMPLE_LIMIT: usize = 1024;

/// One frame of a captured call stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Function name
    pub function: String,
    /// Class or type the function belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl StackFrame {
    /// Create a frame for a free function
    pub fn func(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            class: None,
        }
    }

    /// Create a frame for a method on a class
    pub fn method(class: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            class: Some(class.into()),
        }
    }

    /// Identifier used when aggregating frames: `Class::function`, or the
    /// bare function name for free functions
    pub fn identifier(&self) -> String {
        match &self.class {
            Some(class) => format!("{}::{}", class, self.function),
            None => self.function.clone(),
        }
    }
}

/// One timestamped stack capture produced by the sampling engine.
///
/// Frames are ordered leaf first: `frames[0]` is the innermost frame at
/// capture time and the last frame is the process entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSample {
    /// Seconds since the sampling engine started
    pub timestamp: f64,
    /// Captured call stack, innermost frame first
    pub frames: Vec<StackFrame>,
}

impl StackSample {
    /// Create a sample from a timestamp and a leaf-first stack
    pub fn new(timestamp: f64, frames: Vec<StackFrame>) -> Self {
        Self { timestamp, frames }
    }
}

/// One point of the memory-usage series attached to a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySample {
    /// Position within the window's combined sample ordering
    pub index: u64,
    /// Memory usage in bytes
    pub value: u64,
}

/// Append-only, bounded collection of samples recorded over one job window.
///
/// Every offered sample counts toward `total_added`, but only every
/// `current_period`-th offer is retained. When the retained count reaches the
/// limit, the period doubles and every second retained sample is discarded, so
/// a long window keeps a bounded set of samples spread over its whole
/// lifetime.
#[derive(Debug, Clone)]
pub struct SampleSet<T> {
    name: String,
    start_time: f64,
    samples: Vec<T>,
    sample_limit: usize,
    current_period: u64,
    total_added: u64,
}

impl<T> SampleSet<T> {
    /// Create a set with the default sample limit
    pub fn new(name: impl Into<String>, start_time: f64) -> Self {
        Self::with_limit(name, start_time, DEFAULT_SAMPLE_LIMIT)
    }

    /// Create a set retaining at most `sample_limit` samples
    pub fn with_limit(name: impl Into<String>, start_time: f64, sample_limit: usize) -> Self {
        Self {
            name: name.into(),
            start_time,
            samples: Vec::new(),
            sample_limit: sample_limit.max(1),
            current_period: 1,
            total_added: 0,
        }
    }

    /// Offer a sample to the set.
    ///
    /// The offer always counts toward [`total_added`](Self::total_added);
    /// whether the sample is retained depends on the current period.
    pub fn add_sample(&mut self, sample: T) {
        self.total_added += 1;
        if self.total_added % self.current_period != 0 {
            return;
        }
        self.samples.push(sample);
        if self.samples.len() >= self.sample_limit {
            self.apply_doubling();
        }
    }

    /// Double the retention period and drop every second retained sample
    fn apply_doubling(&mut self) {
        self.samples = std::mem::take(&mut self.samples)
            .into_iter()
            .step_by(2)
            .collect();
        self.current_period = self.current_period.saturating_mul(2);
    }

    /// Name identifying what this window recorded
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute time the window was opened, epoch seconds
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Number of samples currently retained
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been retained
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total number of samples offered over the window's lifetime
    pub fn total_added(&self) -> u64 {
        self.total_added
    }

    /// Current retention period; only every period-th offer is kept
    pub fn current_period(&self) -> u64 {
        self.current_period
    }

    /// Retained samples, oldest first
    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    /// Consume the set, yielding the retained samples
    pub fn into_samples(self) -> Vec<T> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retains_everything_below_the_limit() {
        let mut set = SampleSet::with_limit("task", 0.0, 8);
        for i in 0..7u64 {
            set.add_sample(i);
        }
        assert_eq!(set.count(), 7);
        assert_eq!(set.total_added(), 7);
        assert_eq!(set.current_period(), 1);
        assert_eq!(set.samples(), &[0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_doubles_the_period_at_the_limit() {
        let mut set = SampleSet::with_limit("task", 0.0, 4);
        for i in 0..4u64 {
            set.add_sample(i);
        }
        // Reaching the limit halves the retained samples and doubles the period.
        assert_eq!(set.samples(), &[0, 2]);
        assert_eq!(set.current_period(), 2);
        assert_eq!(set.total_added(), 4);
    }

    #[test]
    fn test_long_windows_keep_doubling() {
        let mut set = SampleSet::with_limit("task", 0.0, 4);
        for i in 0..20u64 {
            set.add_sample(i);
        }
        // Doubling fired three times: periods 1 -> 2 -> 4 -> 8.
        assert_eq!(set.samples(), &[0, 11]);
        assert_eq!(set.current_period(), 8);
        assert_eq!(set.total_added(), 20);
        assert!(set.count() < 4);
    }

    #[test]
    fn test_skipped_offers_still_count() {
        let mut set = SampleSet::with_limit("task", 0.0, 2);
        for i in 0..100u64 {
            set.add_sample(i);
        }
        assert_eq!(set.total_added(), 100);
        assert!(set.count() <= 2);
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let mut set = SampleSet::with_limit("task", 0.0, 0);
        for i in 0..10u64 {
            set.add_sample(i);
        }
        assert_eq!(set.total_added(), 10);
        assert!(set.count() <= 1);
    }

    #[test]
    fn test_consuming_yields_retained_samples() {
        let mut set = SampleSet::with_limit("task", 1.5, 8);
        set.add_sample("a");
        set.add_sample("b");
        assert_eq!(set.name(), "task");
        assert_eq!(set.start_time(), 1.5);
        assert_eq!(set.into_samples(), vec!["a", "b"]);
    }

    #[test]
    fn test_frame_identifier_includes_the_class() {
        assert_eq!(StackFrame::func("main").identifier(), "main");
        assert_eq!(
            StackFrame::method("SendReports", "execute").identifier(),
            "SendReports::execute"
        );
    }
}
