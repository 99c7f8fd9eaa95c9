//! Pulse channel sweep unit.

/// Periodically moves the pulse timer period up or down.
///
/// The unit also mutes its channel whenever the current period is below 8 or
/// the computed target exceeds `0x7FF`, even while the sweep itself is
/// disabled.
#[derive(Debug, Clone)]
pub struct Sweep {
    pub enabled: bool,
    /// Divider period (0-7)
    pub period: u8,
    pub negate: bool,
    /// Shift count (0-7)
    pub shift: u8,
    divider: u8,
    reload: bool,
    /// Pulse 1 subtracts one more when negating
    ones_complement: bool,
}

impl Sweep {
    pub fn new(ones_complement: bool) -> Self {
        Self {
            enabled: false,
            period: 0,
            negate: false,
            shift: 0,
            divider: 0,
            reload: false,
            ones_complement,
        }
    }

    /// `$4001`/`$4005` write
    pub fn write(&mut self, val: u8) {
        self.enabled = val & 0x80 != 0;
        self.period = (val >> 4) & 0x07;
        self.negate = val & 0x08 != 0;
        self.shift = val & 0x07;
        self.reload = true;
    }

    pub fn target_period(&self, current: u16) -> u16 {
        let change = current >> self.shift;
        if self.negate {
            let extra = u16::from(self.ones_complement);
            current.saturating_sub(change).saturating_sub(extra)
        } else {
            current.saturating_add(change)
        }
    }

    pub fn muting(&self, current: u16) -> bool {
        current < 8 || self.target_period(current) > 0x7FF
    }

    /// Half frame clock. Returns the new timer period when the sweep fires.
    pub fn clock(&mut self, current: u16) -> Option<u16> {
        let mut result = None;
        if self.divider == 0 && self.enabled && self.shift > 0 && !self.muting(current) {
            result = Some(self.target_period(current));
        }
        if self.divider == 0 || self.reload {
            self.divider = self.period;
            self.reload = false;
        } else {
            self.divider -= 1;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_negate_differs_between_pulses() {
        let mut p1 = Sweep::new(true);
        let mut p2 = Sweep::new(false);
        p1.write(0x89); // enabled, negate, shift 1
        p2.write(0x89);
        assert_eq!(p1.target_period(0x100), 0x7F);
        assert_eq!(p2.target_period(0x100), 0x80);
    }

    #[test]
    fn sweep_mutes_out_of_range() {
        let mut sweep = Sweep::new(false);
        sweep.write(0x00);
        // shift 0 doubles the period
        assert!(sweep.muting(0x400));
        assert!(!sweep.muting(0x3FF));
        assert!(sweep.muting(7));
        // negate keeps the target in range
        sweep.write(0x08);
        assert!(!sweep.muting(0x7FF));
    }

    #[test]
    fn sweep_clock_updates_period() {
        let mut sweep = Sweep::new(false);
        sweep.write(0x81); // enabled, period 0, up, shift 1
        assert_eq!(sweep.clock(0x100), Some(0x180));
        sweep.write(0x08);
        assert_eq!(sweep.clock(0x100), None);
    }
}
