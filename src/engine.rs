//! Profiler engine - owns the pipeline and drives it on a timer

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::boundary::TaskBoundaryDetector;
use crate::config::ProfilerConfig;
use crate::counter::AdaptiveCounter;
use crate::error::{ProfilerError, Result};
use crate::host::{ConfigSource, HostProbe, ProfileSink, ReasonEvaluator, Sampler, ThresholdEvaluator};
use crate::policy::EligibilityPolicy;
use crate::processor::SegmentProcessor;

/// Longest accepted flush interval, in seconds
const MAX_FLUSH_INTERVAL: f64 = 3600.0;

/// Requests a cooperative engine shutdown from outside the run loop
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the engine to stop after the current tick; idempotent
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether shutdown has been requested
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Profiler engine.
///
/// Owns the sampling engine, the segment processor and the eligibility
/// policy, drains the sampler on a fixed period, and on shutdown flushes what
/// remains and closes any window still open.
pub struct ProfilerEngine {
    sampler: Box<dyn Sampler>,
    probe: Box<dyn HostProbe>,
    processor: SegmentProcessor,
    policy: EligibilityPolicy,
    period: Duration,
    stop: Arc<AtomicBool>,
}

impl fmt::Debug for ProfilerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilerEngine")
            .field("period", &self.period)
            .field("current_task", &self.processor.current_task())
            .field("stopped", &self.stop.load(Ordering::Acquire))
            .finish()
    }
}

impl ProfilerEngine {
    /// Create a builder
    pub fn builder() -> ProfilerEngineBuilder {
        ProfilerEngineBuilder::new()
    }

    /// Handle other threads can use to request shutdown
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: self.stop.clone(),
        }
    }

    /// The eligibility policy, for inspecting invocation counts
    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    /// Name of the job whose window is currently open, if any
    pub fn current_task(&self) -> Option<&str> {
        self.processor.current_task()
    }

    /// Drive the pipeline until shutdown is requested, then flush and close.
    ///
    /// A persistence or configuration failure stops the run and surfaces the
    /// error; sampling is stopped first so the engine never spins on a sink
    /// that keeps failing.
    pub fn run(&mut self) -> Result<()> {
        info!("Profiler engine started (period {:?})", self.period);
        while !self.stop.load(Ordering::Acquire) {
            self.sleep_one_period();
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            if let Err(e) = self.tick() {
                self.sampler.stop();
                return Err(e);
            }
        }
        self.finalize()
    }

    /// One drain-and-process pass
    pub fn tick(&mut self) -> Result<()> {
        let log = self.sampler.flush();
        if !log.is_empty() {
            debug!("Drained {} samples", log.len());
        }
        self.processor
            .on_interval(log, self.probe.as_ref(), &mut self.policy)
    }

    /// Stop sampling, drain what remains, and close any open window using the
    /// current wall-clock time as its finish time
    pub fn finalize(&mut self) -> Result<()> {
        self.sampler.stop();
        self.tick()?;
        let finish = self.probe.now();
        self.processor.finalize(finish, &mut self.policy)?;
        info!("Profiler engine stopped");
        Ok(())
    }

    /// Sleep one period in short slices so shutdown is honored promptly
    fn sleep_one_period(&self) {
        const SLICE: Duration = Duration::from_millis(5);
        let mut remaining = self.period;
        while !remaining.is_zero() && !self.stop.load(Ordering::Acquire) {
            let step = remaining.min(SLICE);
            std::thread::sleep(step);
            remaining -= step;
        }
    }
}

/// Builder for constructing a profiler engine with injected collaborators
pub struct ProfilerEngineBuilder {
    /// Profiler configuration
    config: ProfilerConfig,
    /// Boundary detector; defaults to the conventional worker markers
    detector: TaskBoundaryDetector,
    /// The sampling engine to drain (required)
    sampler: Option<Box<dyn Sampler>>,
    /// Clock and memory readings (required)
    probe: Option<Box<dyn HostProbe>>,
    /// Where eligible profiles go (required)
    sink: Option<Box<dyn ProfileSink>>,
    /// Live configuration reads; defaults to the static configuration
    config_source: Option<Arc<dyn ConfigSource>>,
    /// Reason evaluator; defaults to the duration threshold
    evaluator: Arc<dyn ReasonEvaluator>,
    /// Admission counter; defaults to an entropy-seeded one
    counter: Option<AdaptiveCounter>,
    /// Absolute start time override, epoch seconds
    start_time: Option<f64>,
}

impl ProfilerEngineBuilder {
    /// Create a new engine builder
    pub fn new() -> Self {
        Self {
            config: ProfilerConfig::default(),
            detector: TaskBoundaryDetector::worker_defaults(),
            sampler: None,
            probe: None,
            sink: None,
            config_source: None,
            evaluator: Arc::new(ThresholdEvaluator),
            counter: None,
            start_time: None,
        }
    }

    /// Set the profiler configuration
    pub fn with_config(mut self, config: ProfilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the boundary detector
    pub fn with_detector(mut self, detector: TaskBoundaryDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Set the sampling engine to drain
    pub fn with_sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Set the host probe supplying clock and memory readings
    pub fn with_probe(mut self, probe: impl HostProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Set the sink receiving eligible profiles
    pub fn with_sink(mut self, sink: impl ProfileSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Set a live configuration source
    pub fn with_config_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.config_source = Some(Arc::new(source));
        self
    }

    /// Set a custom reason evaluator
    pub fn with_evaluator(mut self, evaluator: impl ReasonEvaluator + 'static) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    /// Set the admission counter, for reproducible behavior
    pub fn with_counter(mut self, counter: AdaptiveCounter) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Override the absolute start time; defaults to the probe's clock
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Build the engine.
    ///
    /// Fails when a required collaborator is missing or the configured
    /// flush interval is not a usable duration.
    pub fn build(self) -> Result<ProfilerEngine> {
        let sampler = self
            .sampler
            .ok_or_else(|| ProfilerError::config("Engine requires a sampler"))?;
        let probe = self
            .probe
            .ok_or_else(|| ProfilerError::config("Engine requires a host probe"))?;
        let sink = self
            .sink
            .ok_or_else(|| ProfilerError::config("Engine requires a profile sink"))?;

        let interval = self.config.flush_interval;
        if !interval.is_finite() || interval < 0.0 || interval > MAX_FLUSH_INTERVAL {
            return Err(ProfilerError::config(format!(
                "Flush interval {} is not between 0 and {} seconds",
                interval, MAX_FLUSH_INTERVAL
            )));
        }

        let config_source: Arc<dyn ConfigSource> = match self.config_source {
            Some(source) => source,
            None => Arc::new(self.config.clone()),
        };
        let start_time = match self.start_time {
            Some(time) => time,
            None => probe.now(),
        };

        let processor = SegmentProcessor::new(self.detector, start_time, self.config.sample_limit);
        let mut policy = EligibilityPolicy::new(config_source, self.evaluator, sink);
        if let Some(counter) = self.counter {
            policy = policy.with_counter(counter);
        }

        Ok(ProfilerEngine {
            sampler,
            probe,
            processor,
            policy,
            period: Duration::from_secs_f64(interval.max(0.001)),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl Default for ProfilerEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
