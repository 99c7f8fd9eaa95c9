//! Envelope generator shared by the pulse and noise channels.

/// Decaying volume envelope, or a constant volume when the constant flag is
/// set in the control register.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    /// Set by a length register write, consumed on the next quarter frame
    start_flag: bool,
    decay_level: u8,
    divider: u8,
    /// Divider reload, doubles as the constant volume
    period: u8,
    loop_flag: bool,
    constant: bool,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the low six bits of a `$4000`/`$4004`/`$400C` write
    pub fn write(&mut self, val: u8) {
        self.period = val & 0x0F;
        self.constant = val & 0x10 != 0;
        self.loop_flag = val & 0x20 != 0;
    }

    /// Quarter frame clock
    pub fn clock(&mut self) {
        if self.start_flag {
            self.start_flag = false;
            self.decay_level = 15;
            self.divider = self.period;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.period;
            if self.decay_level > 0 {
                self.decay_level -= 1;
            } else if self.loop_flag {
                self.decay_level = 15;
            }
        }
    }

    pub fn restart(&mut self) {
        self.start_flag = true;
    }

    /// Current volume (0-15)
    pub fn output(&self) -> u8 {
        if self.constant {
            self.period
        } else {
            self.decay_level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_constant_volume() {
        let mut env = Envelope::new();
        env.write(0x30 | 9);
        assert_eq!(env.output(), 9);
        env.restart();
        env.clock();
        env.clock();
        assert_eq!(env.output(), 9);
    }

    #[test]
    fn envelope_decays_and_loops() {
        let mut env = Envelope::new();
        env.write(0x20); // loop, period 0
        env.restart();
        env.clock();
        assert_eq!(env.output(), 15);
        for expected in (0..15).rev() {
            env.clock();
            assert_eq!(env.output(), expected);
        }
        env.clock();
        assert_eq!(env.output(), 15);
    }

    #[test]
    fn envelope_period_slows_decay() {
        let mut env = Envelope::new();
        env.write(0x02);
        env.restart();
        env.clock(); // level 15, divider 2
        env.clock();
        env.clock();
        assert_eq!(env.output(), 15);
        env.clock();
        assert_eq!(env.output(), 14);
    }
}
