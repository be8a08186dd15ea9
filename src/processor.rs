//! Segmentation of the sample stream into per-task windows
//!
//! A worker process runs jobs strictly one at a time, so at most one window is
//! open at any moment. The processor consumes periodic drains of the sampling
//! engine, attributes each sample to a job by stack shape, and emits a closed
//! window whenever the attributed name changes.

use crate::boundary::TaskBoundaryDetector;
use crate::error::Result;
use crate::host::{HostProbe, WindowSink};
use crate::sample::{MemorySample, SampleSet, StackSample};
use tracing::debug;

/// The pair of sample sets recorded over one open job window
struct OpenWindow {
    task: SampleSet<StackSample>,
    memory: SampleSet<MemorySample>,
}

/// Assigns drained samples to per-task windows and emits closed windows
pub struct SegmentProcessor {
    detector: TaskBoundaryDetector,
    sample_limit: usize,
    start_time: f64,
    sample_time: f64,
    window: Option<OpenWindow>,
}

impl SegmentProcessor {
    /// Create a processor. `start_time` is the absolute time the sampling
    /// engine started, epoch seconds; sample timestamps are relative to it.
    pub fn new(detector: TaskBoundaryDetector, start_time: f64, sample_limit: usize) -> Self {
        Self {
            detector,
            sample_limit,
            start_time,
            sample_time: start_time,
            window: None,
        }
    }

    /// Name of the job whose window is currently open, if any
    pub fn current_task(&self) -> Option<&str> {
        self.window.as_ref().map(|w| w.task.name())
    }

    /// Process one drain of the sampling engine.
    ///
    /// Samples arrive oldest first. Each is attributed to a job by stack
    /// shape; a change of attributed name closes the open window before the
    /// sample is placed. The boundary belongs to the last sample confirmed to
    /// be inside the closing window, so closes use the carried-over time of
    /// the previous sample rather than the current one. The same carried-over
    /// time stamps newly opened windows.
    pub fn on_interval(
        &mut self,
        log: Vec<StackSample>,
        probe: &dyn HostProbe,
        sink: &mut dyn WindowSink,
    ) -> Result<()> {
        // Memory usage at drain start seeds the first window opened below.
        let mut drain_memory = Some(probe.memory_usage());

        for sample in log {
            let task_name = self.detector.find_task_name(&sample.frames);
            let sample_time = self.start_time + sample.timestamp;

            let changed = match (&self.window, task_name.as_deref()) {
                (Some(open), name) => name != Some(open.task.name()),
                (None, _) => false,
            };
            if changed {
                self.close(sink, self.sample_time)?;
            }

            if let Some(name) = &task_name {
                if self.window.is_none() {
                    self.open(name, drain_memory.take());
                }
            }

            if let Some(open) = &mut self.window {
                open.task.add_sample(sample);
                // Memory readings share the window's sample ordering; the
                // combined index keeps the two series loosely aligned even
                // though they are capped independently.
                let index = open.task.total_added() + open.memory.count() as u64 - 1;
                open.memory.add_sample(MemorySample {
                    index,
                    value: probe.memory_usage(),
                });
            }

            // The cursor advances only after the sample is placed, so the
            // next boundary is attributed to this sample's time.
            self.sample_time = sample_time;
        }
        Ok(())
    }

    /// Close any window left open at process shutdown.
    /// `finish_time` is the absolute shutdown time, epoch seconds.
    pub fn finalize(&mut self, finish_time: f64, sink: &mut dyn WindowSink) -> Result<()> {
        if self.window.is_some() {
            self.close(sink, finish_time)?;
        }
        Ok(())
    }

    fn open(&mut self, name: &str, seed: Option<u64>) {
        debug!("Opening window for '{}' at {:.3}", name, self.sample_time);
        let task = SampleSet::with_limit(name, self.sample_time, self.sample_limit);
        let mut memory = SampleSet::with_limit(name, self.sample_time, self.sample_limit);
        if let Some(value) = seed {
            memory.add_sample(MemorySample { index: 0, value });
        }
        self.window = Some(OpenWindow { task, memory });
    }

    fn close(&mut self, sink: &mut dyn WindowSink, finish_time: f64) -> Result<()> {
        if let Some(open) = self.window.take() {
            debug!(
                "Closing window for '{}' with {} samples",
                open.task.name(),
                open.task.count()
            );
            sink.close_window(open.task, open.memory, finish_time)?;
        }
        Ok(())
    }
}
