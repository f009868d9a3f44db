//! The per-process run slot.

use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

/// Lifecycle of the single run slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Done,
}

/// Owner of the process-wide run slot.
///
/// One run occupies the slot at a time; trying to begin a second while one
/// is active fails with [`Error::RunActive`] so the caller can observe the
/// active run instead. Transitions are guarded: Idle/Done → Running via
/// [`RunContext::try_begin`], Running → Done when the returned guard drops.
#[derive(Debug)]
pub struct RunContext {
    state: Mutex<RunState>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RunState::Idle),
        }
    }

    /// Current slot state.
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the slot for a new run.
    pub fn try_begin(&self) -> Result<RunGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RunState::Running {
            return Err(Error::RunActive);
        }
        *state = RunState::Running;
        Ok(RunGuard { context: self })
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the run slot on drop.
#[derive(Debug)]
pub struct RunGuard<'a> {
    context: &'a RunContext,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut state = self
            .context
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *state = RunState::Done;
    }
}
