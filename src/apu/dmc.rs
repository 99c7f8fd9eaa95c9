//! Delta modulation channel.
//!
//! Only the 7-bit output level is modelled. There is no CPU address space
//! to fetch sample bytes from, so PCM reaches this channel as direct loads
//! of `$4011`. The remaining registers are latched for inspection.

/// DMC register state and output level
#[derive(Debug, Clone, Default)]
pub struct Dmc {
    pub irq_enabled: bool,
    pub loop_flag: bool,
    pub rate_index: u8,
    /// Current output level (0-127)
    pub output_level: u8,
    /// `$C000 + addr * 64`
    pub sample_address: u16,
    /// `len * 16 + 1` bytes
    pub sample_length: u16,
}

impl Dmc {
    pub fn new() -> Self {
        Self {
            sample_address: 0xC000,
            sample_length: 1,
            ..Self::default()
        }
    }

    /// Register write, `reg` is the offset within the channel (0-3)
    pub fn write(&mut self, reg: u32, val: u8) {
        match reg {
            0 => {
                self.irq_enabled = val & 0x80 != 0;
                self.loop_flag = val & 0x40 != 0;
                self.rate_index = val & 0x0F;
            }
            1 => self.output_level = val & 0x7F,
            2 => self.sample_address = 0xC000 | ((val as u16) << 6),
            3 => self.sample_length = ((val as u16) << 4) | 1,
            _ => {}
        }
    }

    pub fn output(&self) -> u8 {
        self.output_level
    }
}
