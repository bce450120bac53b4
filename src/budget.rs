//! Resource guard for very large inputs.
//!
//! A [`Budget`] bounds the number of nodes a diff may look at and the wall
//! clock time it may spend. Stages call [`Budget::check_time`] from their main
//! loops; an exhausted budget turns into [`DiffError::BudgetExceeded`] and the
//! partial work is dropped.

use crate::error::{DiffError, Result};
use crate::syn_tree::SynTree;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Only look at the clock every that many steps.
const TIME_CHECK_INTERVAL: u32 = 256;

#[derive(Debug)]
pub struct Budget {
    max_nodes: Option<usize>,
    time_limit: Option<Duration>,
    started: Instant,
    steps: AtomicU32,
}

impl Budget {
    pub fn new(max_nodes: Option<usize>, time_limit: Option<Duration>) -> Self {
        Budget {
            max_nodes,
            time_limit,
            started: Instant::now(),
            steps: AtomicU32::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Budget::new(None, None)
    }

    pub fn max_nodes(&self) -> Option<usize> {
        self.max_nodes
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Refuse inputs whose combined node count is over the limit.
    pub fn check_size(&self, src: &SynTree, dst: &SynTree) -> Result<()> {
        match self.max_nodes {
            Some(limit) if src.len() + dst.len() > limit => Err(DiffError::BudgetExceeded {
                what: "node count",
                limit: limit as u64,
            }),
            _ => Ok(()),
        }
    }

    /// Count one unit of work and fail once the time limit has passed.
    pub fn check_time(&self) -> Result<()> {
        let Some(limit) = self.time_limit else {
            return Ok(());
        };
        let steps = self.steps.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if steps % TIME_CHECK_INTERVAL != 0 && !limit.is_zero() {
            return Ok(());
        }
        if self.started.elapsed() >= limit {
            return Err(DiffError::BudgetExceeded {
                what: "time",
                limit: limit.as_millis().try_into().unwrap_or(u64::MAX),
            });
        }
        Ok(())
    }
}

impl Default for Budget {
    fn default() -> Self {
        Budget::unlimited()
    }
}
