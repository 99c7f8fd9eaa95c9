//! Length counter used by the pulse, triangle and noise channels.

/// Counter reload values indexed by bits 3-7 of the length register write.
pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Silences its channel when it reaches zero. Clocked on half frames.
#[derive(Debug, Clone, Default)]
pub struct LengthCounter {
    value: u8,
    halt: bool,
    /// Channel enable bit from `$4015`
    enabled: bool,
}

impl LengthCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&mut self) {
        if !self.halt && self.value > 0 {
            self.value -= 1;
        }
    }

    /// Reload from the length table. Ignored while the channel is disabled.
    pub fn load(&mut self, index: u8) {
        if self.enabled {
            self.value = LENGTH_TABLE[(index & 0x1F) as usize];
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn set_halt(&mut self, halt: bool) {
        self.halt = halt;
    }

    /// Disabling clears the counter immediately
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.value = 0;
        }
    }

    pub fn is_active(&self) -> bool {
        self.value > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counter_loads_and_decrements() {
        let mut lc = LengthCounter::new();
        lc.set_enabled(true);
        lc.load(0);
        assert_eq!(lc.value(), 10);
        lc.clock();
        assert_eq!(lc.value(), 9);
    }

    #[test]
    fn length_counter_halt() {
        let mut lc = LengthCounter::new();
        lc.set_enabled(true);
        lc.load(31);
        lc.set_halt(true);
        lc.clock();
        assert_eq!(lc.value(), 30);
    }

    #[test]
    fn length_counter_disabled() {
        let mut lc = LengthCounter::new();
        lc.load(1);
        assert_eq!(lc.value(), 0);
        lc.set_enabled(true);
        lc.load(1);
        assert_eq!(lc.value(), 254);
        lc.set_enabled(false);
        assert!(!lc.is_active());
    }
}
