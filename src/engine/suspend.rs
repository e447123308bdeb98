// src/engine/suspend.rs

/// Reference count of active "hold removes" requests.
///
/// Lives inside the coalescer's state mutex; it does no locking itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuspendCounter {
    count: usize,
}

/// What a `resume` did to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Still suspended by other holders.
    StillSuspended(usize),
    /// The last holder resumed; held-back records may now be released.
    Released,
    /// The counter was already 0. Nothing changed.
    Unbalanced,
}

impl SuspendCounter {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_suspended(&self) -> bool {
        self.count > 0
    }

    /// Returns the new count.
    pub fn suspend(&mut self) -> usize {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn resume(&mut self) -> Resume {
        match self.count {
            0 => Resume::Unbalanced,
            1 => {
                self.count = 0;
                Resume::Released
            }
            n => {
                self.count = n - 1;
                Resume::StillSuspended(self.count)
            }
        }
    }
}
