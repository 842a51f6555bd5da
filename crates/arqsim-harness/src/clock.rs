//! Virtual time.

/// Monotonic tick counter standing in for wall-clock milliseconds.
///
/// Both endpoints see the same value within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualClock {
    now: u32,
    increment: u32,
    ticks: u64,
}

impl VirtualClock {
    /// Start at zero, advancing by `increment` per tick.
    pub fn new(increment: u32) -> Self {
        Self { now: 0, increment, ticks: 0 }
    }

    /// Current virtual time.
    pub fn now(&self) -> u32 {
        self.now
    }

    /// Completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Move to the next tick. Wraps like the engine's clock does.
    pub fn advance(&mut self) {
        self.now = self.now.wrapping_add(self.increment);
        self.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_increment() {
        let mut clock = VirtualClock::new(100);
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), 200);
        assert_eq!(clock.ticks(), 2);
    }
}
