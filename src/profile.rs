//! Profile records and the reasons they are kept

use crate::flame::FlameNode;
use crate::sample::MemorySample;
use serde::Serialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Why a finished window's profile is worth keeping.
///
/// A bitmask so independent signals can accumulate; persisted as its raw
/// integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reason(u8);

impl Reason {
    /// Not worth keeping
    pub const NONE: Reason = Reason(0);
    /// Ran at least as long as the configured minimum duration
    pub const SLOW: Reason = Reason(0b001);
    /// Externally flagged for collection
    pub const FLAGGED: Reason = Reason(0b010);
    /// Selected by the admission counter
    pub const SAMPLED: Reason = Reason(0b100);

    /// Whether no signal fired
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set
    pub fn contains(self, other: Reason) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bitmask value
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Reason {
    type Output = Reason;

    fn bitor(self, rhs: Reason) -> Reason {
        Reason(self.0 | rhs.0)
    }
}

impl BitOrAssign for Reason {
    fn bitor_assign(&mut self, rhs: Reason) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        let mut first = true;
        for (bit, label) in [
            (Reason::SLOW, "slow"),
            (Reason::FLAGGED, "flagged"),
            (Reason::SAMPLED, "sampled"),
        ] {
            if self.contains(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", label)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A closed window before eligibility has been decided
#[derive(Debug, Clone, Serialize)]
pub struct ProfileCandidate {
    /// Identifying name of the job
    pub task: String,
    /// Window start, epoch seconds
    pub created: i64,
    /// Window length in seconds
    pub duration: f64,
}

impl ProfileCandidate {
    /// Attach the post-eligibility fields, producing the persisted record
    pub fn into_profile(
        self,
        finished: i64,
        reason: Reason,
        memory_usage: Vec<MemorySample>,
        flame: FlameNode,
    ) -> TaskProfile {
        TaskProfile {
            task: self.task,
            created: self.created,
            duration: self.duration,
            finished,
            reason,
            memory_usage,
            flame,
        }
    }
}

/// The persisted record of one profiled job execution
#[derive(Debug, Clone, Serialize)]
pub struct TaskProfile {
    /// Identifying name of the job
    pub task: String,
    /// Window start, epoch seconds
    pub created: i64,
    /// Window length in seconds
    pub duration: f64,
    /// Window end, epoch seconds
    pub finished: i64,
    /// Why the profile was kept; never [`Reason::NONE`]
    pub reason: Reason,
    /// Memory-usage series recorded over the window
    pub memory_usage: Vec<MemorySample>,
    /// Aggregated call tree of the window's retained samples
    pub flame: FlameNode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_accumulate() {
        let mut reason = Reason::NONE;
        assert!(reason.is_none());
        reason |= Reason::SLOW;
        reason |= Reason::SAMPLED;
        assert!(!reason.is_none());
        assert!(reason.contains(Reason::SLOW));
        assert!(reason.contains(Reason::SAMPLED));
        assert!(!reason.contains(Reason::FLAGGED));
        assert_eq!(reason.bits(), 0b101);
    }

    #[test]
    fn test_reason_displays_its_flags() {
        assert_eq!(Reason::NONE.to_string(), "none");
        assert_eq!(Reason::SLOW.to_string(), "slow");
        assert_eq!((Reason::SLOW | Reason::SAMPLED).to_string(), "slow|sampled");
    }

    #[test]
    fn test_reason_serializes_as_its_bitmask() {
        let json = serde_json::to_value(Reason::SLOW | Reason::FLAGGED).unwrap();
        assert_eq!(json, 3);
    }

    #[test]
    fn test_candidate_carries_identity_into_the_profile() {
        let candidate = ProfileCandidate {
            task: "SendReports".to_string(),
            created: 1_700_000_000,
            duration: 4.25,
        };
        let profile = candidate.into_profile(
            1_700_000_004,
            Reason::SLOW,
            vec![MemorySample { index: 0, value: 1024 }],
            FlameNode::from_samples(&[]),
        );
        assert_eq!(profile.task, "SendReports");
        assert_eq!(profile.created, 1_700_000_000);
        assert_eq!(profile.duration, 4.25);
        assert_eq!(profile.finished, 1_700_000_004);
        assert_eq!(profile.reason, Reason::SLOW);
        assert_eq!(profile.memory_usage.len(), 1);
    }
}
