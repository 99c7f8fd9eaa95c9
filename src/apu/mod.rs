//! 2A03 / 2A07 APU model.
//!
//! Register-level model of the NES audio unit: two pulse channels, a
//! triangle, a noise generator and the DMC output level, driven by the
//! frame counter and mixed through the nonlinear DAC tables. One call to
//! [`Apu::clock`] advances one CPU cycle.

pub mod dmc;
pub mod envelope;
pub mod frame_counter;
pub mod length_counter;
pub mod mixer;
pub mod noise;
pub mod pulse;
pub mod sweep;
pub mod triangle;

pub use dmc::Dmc;
pub use envelope::Envelope;
pub use frame_counter::{FrameCounter, FrameSignal};
pub use length_counter::{LengthCounter, LENGTH_TABLE};
pub use noise::Noise;
pub use pulse::Pulse;
pub use sweep::Sweep;
pub use triangle::Triangle;

use crate::config::Region;
use crate::dispatch::ChipModel;

/// First APU register
pub const REG_BASE: u32 = 0x4000;
/// Number of registers from `$4000` to `$4017`
pub const REG_COUNT: usize = 0x18;

/// Instantaneous levels: pulse 1, pulse 2, triangle, noise (0-15) and
/// DMC (0-127)
pub type ChannelLevels = [u8; 5];

#[derive(Debug, Clone)]
pub struct Apu {
    pub pulse1: Pulse,
    pub pulse2: Pulse,
    pub triangle: Triangle,
    pub noise: Noise,
    pub dmc: Dmc,
    pub frame_counter: FrameCounter,
    region: Region,
    cycles: u64,
}

impl Apu {
    /// Power-on state for `region`
    pub fn new(region: Region) -> Self {
        Self {
            pulse1: Pulse::new(false),
            pulse2: Pulse::new(true),
            triangle: Triangle::new(),
            noise: Noise::new(region.uses_pal_tables()),
            dmc: Dmc::new(),
            frame_counter: FrameCounter::new(region.quarter_frame_cycles()),
            region,
            cycles: 0,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Switch region timing. Channel state is kept.
    pub fn set_region(&mut self, region: Region) {
        self.region = region;
        self.noise.set_pal(region.uses_pal_tables());
        self.frame_counter.set_quarter_cycles(region.quarter_frame_cycles());
    }

    /// CPU cycles since the last reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Advance one CPU cycle
    pub fn clock(&mut self) {
        let signal = self.frame_counter.clock();
        self.apply_frame_signal(signal);

        self.pulse1.clock_timer();
        self.pulse2.clock_timer();
        self.triangle.clock_timer();
        self.noise.clock_timer();
        self.cycles += 1;
    }

    fn apply_frame_signal(&mut self, signal: FrameSignal) {
        if signal.quarter {
            self.pulse1.quarter_frame();
            self.pulse2.quarter_frame();
            self.triangle.quarter_frame();
            self.noise.quarter_frame();
        }
        if signal.half {
            self.pulse1.half_frame();
            self.pulse2.half_frame();
            self.triangle.half_frame();
            self.noise.half_frame();
        }
    }

    pub fn levels(&self) -> ChannelLevels {
        [
            self.pulse1.output(),
            self.pulse2.output(),
            self.triangle.output(),
            self.noise.output(),
            self.dmc.output(),
        ]
    }

    /// Mixed output sample
    pub fn output(&self) -> i16 {
        let [p1, p2, t, n, d] = self.levels();
        mixer::mix(p1, p2, t, n, d)
    }

    /// `$4015` read: length counter status of each channel
    pub fn status(&self) -> u8 {
        u8::from(self.pulse1.length.is_active())
            | u8::from(self.pulse2.length.is_active()) << 1
            | u8::from(self.triangle.length.is_active()) << 2
            | u8::from(self.noise.length.is_active()) << 3
    }

    fn write_control(&mut self, val: u8) {
        self.pulse1.length.set_enabled(val & 0x01 != 0);
        self.pulse2.length.set_enabled(val & 0x02 != 0);
        self.triangle.length.set_enabled(val & 0x04 != 0);
        self.noise.length.set_enabled(val & 0x08 != 0);
    }
}

impl ChipModel for Apu {
    fn write_register(&mut self, addr: u32, val: u16) {
        let val = val as u8;
        match addr {
            0x4000..=0x4003 => self.pulse1.write(addr & 3, val),
            0x4004..=0x4007 => self.pulse2.write(addr & 3, val),
            0x4008..=0x400B => self.triangle.write(addr & 3, val),
            0x400C..=0x400F => self.noise.write(addr & 3, val),
            0x4010..=0x4013 => self.dmc.write(addr & 3, val),
            0x4015 => self.write_control(val),
            0x4017 => {
                let signal = self.frame_counter.write_control(val);
                self.apply_frame_signal(signal);
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.region);
    }
}
