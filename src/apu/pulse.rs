//! Pulse (square wave) channel.

use super::envelope::Envelope;
use super::length_counter::LengthCounter;
use super::sweep::Sweep;

/// Duty sequences (12.5%, 25%, 50%, 25% negated)
const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

#[derive(Debug, Clone)]
pub struct Pulse {
    pub duty: u8,
    /// 11-bit timer period from the registers
    pub timer_period: u16,
    timer: u16,
    phase: u8,
    pub envelope: Envelope,
    pub length: LengthCounter,
    pub sweep: Sweep,
}

impl Pulse {
    /// `second` selects pulse 2's sweep negate behaviour
    pub fn new(second: bool) -> Self {
        Self {
            duty: 0,
            timer_period: 0,
            timer: 0,
            phase: 0,
            envelope: Envelope::new(),
            length: LengthCounter::new(),
            sweep: Sweep::new(!second),
        }
    }

    /// Register write, `reg` is the offset within the channel (0-3)
    pub fn write(&mut self, reg: u32, val: u8) {
        match reg {
            0 => {
                self.duty = val >> 6;
                self.length.set_halt(val & 0x20 != 0);
                self.envelope.write(val);
            }
            1 => self.sweep.write(val),
            2 => self.timer_period = (self.timer_period & 0x0700) | val as u16,
            3 => {
                self.timer_period = (self.timer_period & 0x00FF) | ((val as u16 & 0x07) << 8);
                self.length.load(val >> 3);
                self.phase = 0;
                self.envelope.restart();
            }
            _ => {}
        }
    }

    /// One CPU cycle. The sequencer steps every `(t + 1) * 2` cycles.
    pub fn clock_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
        } else {
            self.timer = (self.timer_period + 1) * 2 - 1;
            self.phase = (self.phase + 1) & 7;
        }
    }

    pub fn quarter_frame(&mut self) {
        self.envelope.clock();
    }

    pub fn half_frame(&mut self) {
        self.length.clock();
        if let Some(period) = self.sweep.clock(self.timer_period) {
            self.timer_period = period;
        }
    }

    /// Current level (0-15)
    pub fn output(&self) -> u8 {
        if !self.length.is_active() || self.sweep.muting(self.timer_period) {
            return 0;
        }
        if DUTY_TABLE[(self.duty & 3) as usize][self.phase as usize] == 0 {
            return 0;
        }
        self.envelope.output()
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(period: u16) -> Pulse {
        let mut pulse = Pulse::new(false);
        pulse.length.set_enabled(true);
        pulse.write(0, 0xB0 | 12); // 50% duty, halt, constant volume 12
        pulse.write(1, 0x08);
        pulse.write(2, (period & 0xFF) as u8);
        pulse.write(3, 0xF8 | (period >> 8) as u8);
        pulse
    }

    #[test]
    fn pulse_timer_period() {
        let mut pulse = keyed(1);
        assert_eq!(pulse.timer_period, 1);
        // timer starts at 0, first cycle advances the phase
        pulse.clock_timer();
        assert_eq!(pulse.phase(), 1);
        for _ in 0..3 {
            pulse.clock_timer();
        }
        assert_eq!(pulse.phase(), 1);
        pulse.clock_timer();
        assert_eq!(pulse.phase(), 2);
    }

    #[test]
    fn pulse_duty_output() {
        let mut pulse = keyed(0x100);
        let mut levels = Vec::new();
        for _ in 0..8 {
            levels.push(pulse.output());
            for _ in 0..(0x101 * 2) {
                pulse.clock_timer();
            }
        }
        assert_eq!(levels, vec![0, 12, 12, 12, 12, 0, 0, 0]);
    }

    #[test]
    fn pulse_silent_without_length() {
        let mut pulse = keyed(0x100);
        pulse.length.set_enabled(false);
        pulse.clock_timer();
        assert_eq!(pulse.output(), 0);
    }

    #[test]
    fn pulse_low_period_is_muted() {
        let mut pulse = keyed(4);
        pulse.clock_timer();
        assert_eq!(pulse.output(), 0);
    }
}
