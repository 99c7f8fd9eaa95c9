//! Instrument data and macro tables
//!
//! Instruments belong to the song; backends hold them through `Arc` and
//! never mutate them.

/// Maximum macro table length
pub const MAX_MACRO_LEN: usize = 256;

/// Macro kinds understood by the macro interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MacroKind {
    Volume = 0,
    Arpeggio = 1,
    Duty = 2,
    Pitch = 3,
}

impl MacroKind {
    pub const COUNT: usize = 4;

    pub fn name(&self) -> &'static str {
        match self {
            Self::Volume => "vol",
            Self::Arpeggio => "arp",
            Self::Duty => "duty",
            Self::Pitch => "pitch",
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        [Self::Volume, Self::Arpeggio, Self::Duty, Self::Pitch].into_iter()
    }
}

/// One per-parameter macro sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroTable {
    /// Step values
    pub data: Vec<i32>,
    /// Loop start index (None if no loop)
    pub loop_start: Option<usize>,
    /// Release point index (None if the macro has no release section)
    pub release: Option<usize>,
}

impl MacroTable {
    pub fn new(data: Vec<i32>) -> Self {
        let mut data = data;
        data.truncate(MAX_MACRO_LEN);
        Self {
            data,
            loop_start: None,
            release: None,
        }
    }

    pub fn with_loop(mut self, loop_start: usize) -> Self {
        self.loop_start = Some(loop_start);
        self
    }

    pub fn with_release(mut self, release: usize) -> Self {
        self.release = Some(release);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Loop start, if it points inside the table
    pub fn valid_loop(&self) -> Option<usize> {
        self.loop_start.filter(|&l| l < self.data.len())
    }

    /// Release point, if it points inside the table
    pub fn valid_release(&self) -> Option<usize> {
        self.release.filter(|&r| r < self.data.len())
    }
}

/// Macro tables of an instrument
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroSet {
    pub vol: MacroTable,
    pub arp: MacroTable,
    pub duty: MacroTable,
    pub pitch: MacroTable,
    /// Arpeggio values are absolute notes rather than offsets
    pub arp_fixed: bool,
}

impl MacroSet {
    pub fn table(&self, kind: MacroKind) -> &MacroTable {
        match kind {
            MacroKind::Volume => &self.vol,
            MacroKind::Arpeggio => &self.arp,
            MacroKind::Duty => &self.duty,
            MacroKind::Pitch => &self.pitch,
        }
    }
}

/// Instrument type as far as backends care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstrumentKind {
    /// Chip-native tone instrument
    #[default]
    Standard,
    /// Sample playback instrument
    Sample,
}

/// Sample instrument settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSettings {
    /// Sample table index played on note on (-1 = none)
    pub init_sample: i32,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self { init_sample: -1 }
    }
}

/// An instrument
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instrument {
    pub name: String,
    pub kind: InstrumentKind,
    pub std: MacroSet,
    pub sample: SampleSettings,
}

impl Instrument {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Sample instrument playing `init_sample`
    pub fn sample(name: &str, init_sample: i32) -> Self {
        Self {
            name: name.to_string(),
            kind: InstrumentKind::Sample,
            sample: SampleSettings { init_sample },
            ..Self::default()
        }
    }

    pub fn with_macro(mut self, kind: MacroKind, table: MacroTable) -> Self {
        match kind {
            MacroKind::Volume => self.std.vol = table,
            MacroKind::Arpeggio => self.std.arp = table,
            MacroKind::Duty => self.std.duty = table,
            MacroKind::Pitch => self.std.pitch = table,
        }
        self
    }

    pub fn with_fixed_arp(mut self, fixed: bool) -> Self {
        self.std.arp_fixed = fixed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_truncates() {
        let t = MacroTable::new(vec![1; MAX_MACRO_LEN + 10]);
        assert_eq!(t.len(), MAX_MACRO_LEN);
    }

    #[test]
    fn test_invalid_points_ignored() {
        let t = MacroTable::new(vec![1, 2, 3]).with_loop(3).with_release(5);
        assert_eq!(t.valid_loop(), None);
        assert_eq!(t.valid_release(), None);
        let t = MacroTable::new(vec![1, 2, 3]).with_loop(1).with_release(2);
        assert_eq!(t.valid_loop(), Some(1));
        assert_eq!(t.valid_release(), Some(2));
    }
}
