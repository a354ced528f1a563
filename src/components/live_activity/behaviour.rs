//! Failure injection for the in-memory activity service

use crate::error::{activity_error, PulseResult};
use tracing::debug;

/// Describes how the in-memory activity service behaves during a test
///
/// So that an operation fails _n_ times after _m_ initial successes, set `(m, n)` for it
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct ActivityBehaviour {
    /// If this is true, every operation is allowed
    pub is_suspended: bool,

    pub running_behaviour: (u32, u32),
    pub start_behaviour: (u32, u32),
    pub update_behaviour: (u32, u32),
    pub end_behaviour: (u32, u32),
}

impl ActivityBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mutating operation fails at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            running_behaviour: (0, 0),
            start_behaviour: (0, n_fails),
            update_behaviour: (0, n_fails),
            end_behaviour: (0, n_fails),
        }
    }

    /// Suspend this behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }

    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_list(&mut self) -> PulseResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.running_behaviour, "running")
    }

    pub fn can_start(&mut self) -> PulseResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.start_behaviour, "start")
    }

    pub fn can_update(&mut self) -> PulseResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.update_behaviour, "update")
    }

    pub fn can_end(&mut self) -> PulseResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.end_behaviour, "end")
    }
}

/// Ok while successes remain or once failures are used up; otherwise consume one failure
fn decrement(value: &mut (u32, u32), descr: &str) -> PulseResult<()> {
    let (successes, failures) = *value;

    if successes > 0 {
        value.0 -= 1;
        debug!("Activity behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if failures > 0 {
        value.1 -= 1;
        debug!("Activity behaviour: failing a {} ({:?})", descr, value);
        Err(activity_error(&format!(
            "{} refused by the activity service ({:?})",
            descr, value
        )))
    } else {
        debug!("Activity behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}
