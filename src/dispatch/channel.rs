//! Per-channel synthesis state

use crate::instrument::Instrument;
use crate::macro_int::MacroInterpreter;
use std::sync::Arc;

/// What a channel is wired to on the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Period-driven tone with duty control
    Pulse,
    /// Period-driven tone without volume or duty
    Triangle,
    /// Noise generator addressed through a period lookup table
    Noise,
    /// PCM playback through the DAC
    Dac,
}

impl ChannelRole {
    /// Period-driven tone channel
    pub fn is_tone(&self) -> bool {
        matches!(self, Self::Pulse | Self::Triangle)
    }
}

/// Mutable state of one channel
#[derive(Debug, Clone)]
pub struct Channel {
    pub role: ChannelRole,
    /// Final value last computed for the frequency registers
    pub freq: i32,
    /// Note-derived frequency before pitch offsets
    pub base_freq: i32,
    /// Pitch offset from pitch commands
    pub pitch: i32,
    /// Pitch offset from the pitch macro
    pub pitch2: i32,
    /// Frequency last written, 65535 forces a high byte rewrite
    pub prev_freq: i32,
    pub note: i32,
    /// Instrument id (-1 for none)
    pub ins: i32,
    /// Duty cycle, or noise mode on the noise channel
    pub duty: i32,
    /// Sweep register value
    pub sweep: u8,
    pub vol: i32,
    pub out_vol: i32,
    pub active: bool,
    pub ins_changed: bool,
    pub freq_changed: bool,
    pub sweep_changed: bool,
    pub key_on: bool,
    pub key_off: bool,
    pub in_porta: bool,
    /// DAC rate follows the note instead of the sample's own rate
    pub native_dac: bool,
    pub std: MacroInterpreter,
}

impl Channel {
    pub fn new(role: ChannelRole, max_vol: i32) -> Self {
        Self {
            role,
            freq: 0,
            base_freq: 0,
            pitch: 0,
            pitch2: 0,
            prev_freq: 65535,
            note: 0,
            ins: -1,
            duty: 0,
            sweep: 0x08,
            vol: max_vol,
            out_vol: max_vol,
            active: false,
            ins_changed: true,
            freq_changed: false,
            sweep_changed: false,
            key_on: false,
            key_off: false,
            in_porta: false,
            native_dac: false,
            std: MacroInterpreter::new(),
        }
    }

    /// Restart macros from `ins` and drop the macro pitch offset
    pub fn macro_init(&mut self, ins: Option<Arc<Instrument>>) {
        self.std.init(ins);
        self.pitch2 = 0;
    }

    /// Back to power-on defaults, keeping the role
    pub fn reset(&mut self, max_vol: i32) {
        *self = Self::new(self.role, max_vol);
    }
}
