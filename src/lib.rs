//! Taskprof
//!
//! This crate turns the continuous output of a stack-sampling profiler inside
//! a background-job worker into per-job profiles. It includes:
//! - Online segmentation of the sample stream into task windows, using only
//!   stack-trace shape
//! - Bounded per-window sample retention with period doubling
//! - Approximate invocation counting for cheap per-task admission
//! - Flame-graph aggregation and a persisted profile record
//! - A periodic drain loop with cooperative shutdown
//!
//! The worker runs jobs strictly one at a time, so at most one window is open
//! at any moment; window boundaries are recognized purely from the shape of
//! the sampled call stacks.

pub mod boundary;
pub mod config;
pub mod counter;
pub mod engine;
pub mod error;
pub mod flame;
pub mod host;
pub mod policy;
pub mod processor;
pub mod profile;
pub mod sample;

pub use boundary::{BoundaryMarker, TaskBoundaryDetector};
pub use config::{FileConfigSource, ProfilerConfig};
pub use counter::{approximate_increment, estimated_total, AdaptiveCounter};
pub use engine::{ProfilerEngine, ProfilerEngineBuilder, ShutdownHandle};
pub use error::{ProfilerError, Result};
pub use flame::FlameNode;
pub use host::{
    ConfigSource, HostProbe, MemorySink, ProfileSink, ReasonEvaluator, Sampler,
    ThresholdEvaluator, WindowSink,
};
pub use policy::EligibilityPolicy;
pub use processor::SegmentProcessor;
pub use profile::{ProfileCandidate, Reason, TaskProfile};
pub use sample::{MemorySample, SampleSet, StackFrame, StackSample, DEFAULT_SAMPLE_LIMIT};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        AdaptiveCounter, BoundaryMarker, EligibilityPolicy, FlameNode, MemorySample, MemorySink,
        ProfilerConfig, ProfilerEngine, ProfilerError, Reason, Result, SampleSet,
        SegmentProcessor, StackFrame, StackSample, TaskBoundaryDetector, TaskProfile,
    };
    pub use crate::{ConfigSource, HostProbe, ProfileSink, ReasonEvaluator, Sampler, WindowSink};
}
