//! Resource limits for a single solve call.

use std::time::{Duration, Instant};

/// Limits applied to each `solve_limited` call, relative to its start.
///
/// `None` means unlimited. Hitting any limit makes the call return
/// `lbool::UNDEF`; the solver stays usable afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceLimits {
    /// Wall-clock time.
    pub time: Option<Duration>,
    /// Estimated memory footprint of the clause database, in MiB.
    pub memory_mb: Option<u64>,
    pub conflicts: Option<u64>,
    pub propagations: Option<u64>,
}

impl ResourceLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn is_unlimited(&self) -> bool {
        self.time.is_none()
            && self.memory_mb.is_none()
            && self.conflicts.is_none()
            && self.propagations.is_none()
    }
}

/// Limits resolved into absolute thresholds when a solve starts.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Budget {
    deadline: Option<Instant>,
    max_bytes: Option<usize>,
    max_conflicts: Option<u64>,
    max_propagations: Option<u64>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn start(limits: &ResourceLimits, conflicts: u64, propagations: u64) -> Self {
        Budget {
            deadline: limits.time.map(|d| Instant::now() + d),
            max_bytes: limits.memory_mb.map(|mb| (mb as usize).saturating_mul(1 << 20)),
            max_conflicts: limits.conflicts.map(|n| conflicts.saturating_add(n)),
            max_propagations: limits.propagations.map(|n| propagations.saturating_add(n)),
        }
    }

    /// Is any threshold reached? `mem` is only evaluated if a memory
    /// ceiling is set.
    pub fn exhausted<F>(&self, conflicts: u64, propagations: u64, mem: F) -> bool
    where
        F: FnOnce() -> usize,
    {
        self.max_conflicts.map_or(false, |m| conflicts >= m)
            || self.max_propagations.map_or(false, |m| propagations >= m)
            || self.deadline.map_or(false, |d| Instant::now() >= d)
            || self.max_bytes.map_or(false, |m| mem() >= m)
    }
}
