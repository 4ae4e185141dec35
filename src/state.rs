//! Pipeline lifecycle state
//!
//! One state instance per pipeline, mutated only by the controller. Reads
//! happen on every `append`, so the state lives in an atomic rather than
//! behind a lock.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    /// Constructed but not yet started
    Unstarted = 0,
    /// Initialization failed; terminal, all appends are rejected
    Failed = 1,
    /// Accepting and dispatching records
    Running = 2,
    /// Shutdown begun; draining queued work, no new admissions
    Draining = 3,
    /// Fully stopped
    Stopped = 4,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Failed,
            2 => Self::Running,
            3 => Self::Draining,
            4 => Self::Stopped,
            _ => Self::Unstarted,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unstarted => "unstarted",
            Self::Failed => "failed",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Atomic cell holding a [`PipelineState`]
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: PipelineState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> PipelineState {
        PipelineState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: PipelineState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Transition `from -> to`; returns false if the current state differs
    pub(crate) fn transition(&self, from: PipelineState, to: PipelineState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
