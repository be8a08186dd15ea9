//! Task boundary detection from stack-trace shape
//!
//! A worker process runs jobs one after another inside the same call stack, so
//! the only signal for "which job is running" is the shape of the stack
//! itself. A job is recognized by a runner frame with the job's entry method
//! nested directly inside it; the class of the entry frame names the job.

use crate::sample::StackFrame;

/// A marker signature locating job execution in a call stack: the function
/// name of a job-runner frame paired with the entry method it invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMarker {
    /// Function name of the job-runner frame
    pub runner: String,
    /// Function name expected on the frame nested directly inside the runner
    pub entry: String,
}

impl BoundaryMarker {
    /// Create a marker from a runner function and its entry method
    pub fn new(runner: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            runner: runner.into(),
            entry: entry.into(),
        }
    }
}

/// Identifies which job, if any, a stack sample belongs to
#[derive(Debug, Clone)]
pub struct TaskBoundaryDetector {
    markers: Vec<BoundaryMarker>,
}

impl TaskBoundaryDetector {
    /// Create a detector matching the given marker signatures
    pub fn new(markers: Vec<BoundaryMarker>) -> Self {
        Self { markers }
    }

    /// Markers for the conventional worker entry points: scheduled and queued
    /// job runners, both dispatching through an `execute` method
    pub fn worker_defaults() -> Self {
        Self::new(vec![
            BoundaryMarker::new("run_scheduled_task", "execute"),
            BoundaryMarker::new("run_queued_task", "execute"),
        ])
    }

    /// Configured marker signatures
    pub fn markers(&self) -> &[BoundaryMarker] {
        &self.markers
    }

    /// Find the name of the job executing in a leaf-first stack.
    ///
    /// Walks the stack from the process entry point toward the leaf looking
    /// for a runner frame whose direct callee carries the marker's entry
    /// method; the class of that callee names the job. A runner frame whose
    /// callee does not qualify is skipped and the walk continues, so nested
    /// dispatch through an outer runner still resolves. Returns `None` when
    /// no marker matches or the matched entry frame has no class.
    pub fn find_task_name(&self, frames: &[StackFrame]) -> Option<String> {
        let trace: Vec<&StackFrame> = frames.iter().rev().collect();
        for i in 0..trace.len() {
            for marker in &self.markers {
                if trace[i].function == marker.runner {
                    if let Some(callee) = trace.get(i + 1) {
                        if callee.function == marker.entry {
                            return callee.class.clone();
                        }
                    }
                }
            }
        }
        None
    }
}
