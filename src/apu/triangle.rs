//! Triangle channel.

use super::length_counter::LengthCounter;

/// 32-step output sequence
const SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

/// Fixed-volume triangle. The sequencer only moves while both the length
/// counter and the linear counter are nonzero, and the channel is silent
/// otherwise.
#[derive(Debug, Clone, Default)]
pub struct Triangle {
    pub timer_period: u16,
    timer: u16,
    step: u8,
    pub length: LengthCounter,
    pub linear_counter: u8,
    linear_reload: u8,
    reload_flag: bool,
    /// Halts the length counter and keeps the linear reload flag set
    control: bool,
}

impl Triangle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register write, `reg` is the offset within the channel (0-3)
    pub fn write(&mut self, reg: u32, val: u8) {
        match reg {
            0 => {
                self.control = val & 0x80 != 0;
                self.length.set_halt(self.control);
                self.linear_reload = val & 0x7F;
            }
            2 => self.timer_period = (self.timer_period & 0x0700) | val as u16,
            3 => {
                self.timer_period = (self.timer_period & 0x00FF) | ((val as u16 & 0x07) << 8);
                self.length.load(val >> 3);
                self.reload_flag = true;
            }
            _ => {}
        }
    }

    /// One CPU cycle
    pub fn clock_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
        } else {
            self.timer = self.timer_period;
            if self.length.is_active() && self.linear_counter > 0 {
                self.step = (self.step + 1) & 31;
            }
        }
    }

    /// Linear counter clock
    pub fn quarter_frame(&mut self) {
        if self.reload_flag {
            self.linear_counter = self.linear_reload;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control {
            self.reload_flag = false;
        }
    }

    pub fn half_frame(&mut self) {
        self.length.clock();
    }

    pub fn output(&self) -> u8 {
        if self.length.is_active() && self.linear_counter > 0 {
            SEQUENCE[self.step as usize]
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_needs_linear_counter() {
        let mut tri = Triangle::new();
        tri.length.set_enabled(true);
        tri.write(0, 0xFF);
        tri.write(2, 0);
        tri.write(3, 0xF8);
        // linear counter not loaded yet
        tri.clock_timer();
        assert_eq!(tri.output(), 0);

        tri.quarter_frame();
        assert_eq!(tri.linear_counter, 0x7F);
        tri.clock_timer();
        assert_eq!(tri.output(), 14);
        tri.clock_timer();
        assert_eq!(tri.output(), 13);
    }

    #[test]
    fn triangle_linear_counter_expires() {
        let mut tri = Triangle::new();
        tri.length.set_enabled(true);
        tri.write(0, 0x02); // control clear, reload 2
        tri.write(3, 0xF8);
        tri.quarter_frame();
        assert_eq!(tri.linear_counter, 2);
        tri.quarter_frame();
        tri.quarter_frame();
        assert_eq!(tri.linear_counter, 0);
        tri.clock_timer();
        assert_eq!(tri.output(), 0);
    }
}
