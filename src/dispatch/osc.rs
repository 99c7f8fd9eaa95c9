//! Per-channel oscilloscope ring buffer (visualisation only)

/// Ring buffer length
pub const OSC_BUFFER_LEN: usize = 65536;

#[derive(Debug, Clone)]
pub struct OscBuffer {
    data: Vec<i16>,
    needle: usize,
    /// Rate the buffer is filled at (Hz)
    pub rate: u32,
}

impl OscBuffer {
    pub fn new(rate: u32) -> Self {
        Self {
            data: vec![0; OSC_BUFFER_LEN],
            needle: 0,
            rate,
        }
    }

    pub fn push(&mut self, level: i16) {
        self.data[self.needle] = level;
        self.needle = (self.needle + 1) % OSC_BUFFER_LEN;
    }

    /// Write position
    pub fn needle(&self) -> usize {
        self.needle
    }

    /// The `count` most recent levels, oldest first
    pub fn latest(&self, count: usize) -> impl Iterator<Item = i16> + '_ {
        let count = count.min(OSC_BUFFER_LEN);
        let start = (self.needle + OSC_BUFFER_LEN - count) % OSC_BUFFER_LEN;
        (0..count).map(move |i| self.data[(start + i) % OSC_BUFFER_LEN])
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.needle = 0;
    }
}
