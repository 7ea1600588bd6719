/// Generation of one scheduled draw loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoopHandle(u64);

/// Bookkeeping for the periodic draw schedule.
///
/// Every `start` is matched by exactly one cancellation: restarting cancels the previous
/// handle first, and `stop` cancels the running one. Ticks carrying a cancelled handle must
/// not draw.
#[derive(Debug, Default)]
pub struct DrawLoop {
    next: u64,
    active: Option<LoopHandle>,
    starts: u64,
    cancellations: u64,
}

impl DrawLoop {
    /// Idle loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the loop, replacing (and cancelling) any running handle.
    pub fn start(&mut self) -> LoopHandle {
        self.stop();
        self.next += 1;
        let h = LoopHandle(self.next);
        self.active = Some(h);
        self.starts += 1;
        tracing::debug!(handle = h.0, "draw loop started");
        h
    }

    /// Cancel the running handle. Returns `false` when nothing was running.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(h) => {
                self.cancellations += 1;
                tracing::debug!(handle = h.0, "draw loop cancelled");
                true
            }
            None => false,
        }
    }

    /// Running handle, if any.
    pub fn handle(&self) -> Option<LoopHandle> {
        self.active
    }

    /// Whether a loop is scheduled.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a tick issued for `handle` may still draw.
    pub fn accepts(&self, handle: LoopHandle) -> bool {
        self.active == Some(handle)
    }

    /// Total starts.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Total cancellations.
    pub fn cancellations(&self) -> u64 {
        self.cancellations
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/draw_loop.rs"]
mod tests;
