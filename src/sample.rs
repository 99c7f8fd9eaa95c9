//! PCM sample data as seen by chip backends
//!
//! Samples are owned by the host's sample manager. Backends only read the
//! current rendered buffer through [`Sample`]; editing, resampling and
//! history live elsewhere.

/// Reference rate for sample center-rate scaling (Hz)
pub const REFERENCE_RATE: u32 = 8363;

/// Rendered sample data for the current bit depth
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    /// 8-bit signed PCM
    Pcm8(Vec<i8>),
    /// 16-bit signed PCM
    Pcm16(Vec<i16>),
}

/// A read-only PCM sample
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub data: SampleData,
    /// Playback rate used in bank mode (Hz)
    pub rate: u32,
    /// Rate at which the sample sounds at its written pitch (Hz)
    pub center_rate: u32,
    /// Loop start index (-1 if no loop)
    pub loop_start: i32,
}

impl Sample {
    pub fn new(data: SampleData) -> Self {
        Self {
            name: String::new(),
            data,
            rate: 32000,
            center_rate: REFERENCE_RATE,
            loop_start: -1,
        }
    }

    pub fn from_pcm8(data: Vec<i8>) -> Self {
        Self::new(SampleData::Pcm8(data))
    }

    pub fn from_pcm16(data: Vec<i16>) -> Self {
        Self::new(SampleData::Pcm16(data))
    }

    pub fn with_loop(mut self, loop_start: i32) -> Self {
        self.loop_start = loop_start;
        self
    }

    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_center_rate(mut self, center_rate: u32) -> Self {
        self.center_rate = center_rate;
        self
    }

    /// Bits per sample of the rendered data
    pub fn depth(&self) -> u8 {
        match self.data {
            SampleData::Pcm8(_) => 8,
            SampleData::Pcm16(_) => 16,
        }
    }

    /// Number of rendered samples
    pub fn len(&self) -> usize {
        match &self.data {
            SampleData::Pcm8(d) => d.len(),
            SampleData::Pcm16(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loop point, if it lies within the sample
    pub fn loop_point(&self) -> Option<usize> {
        if self.loop_start >= 0 && self.loop_start as usize <= self.len() {
            Some(self.loop_start as usize)
        } else {
            None
        }
    }

    /// Unsigned sample value at `pos` reduced to `bits` of resolution.
    ///
    /// The sign bias is removed before shifting, so silence maps to the
    /// middle of the output range.
    pub fn unsigned_at(&self, pos: usize, bits: u32) -> Option<u16> {
        match &self.data {
            SampleData::Pcm8(d) => d
                .get(pos)
                .map(|&v| ((v as u8) ^ 0x80) as u16 >> (8 - bits)),
            SampleData::Pcm16(d) => d
                .get(pos)
                .map(|&v| ((v as u16) ^ 0x8000) >> (16 - bits)),
        }
    }
}
