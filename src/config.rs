//! Chip configuration (region / timing profile)

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// NTSC color subcarrier (Hz)
pub const COLOR_NTSC: f64 = 315_000_000.0 / 88.0;

/// PAL color subcarrier (Hz)
pub const COLOR_PAL: f64 = 4_433_618.75;

/// Console timing profile. Exactly one is active per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// 2A03, NTSC consoles
    #[default]
    Ntsc,
    /// 2A07, PAL consoles
    Pal,
    /// UA6527P, Dendy clones (PAL clock, NTSC-style APU)
    Dendy,
}

impl Region {
    /// Map the legacy integer flag word. Unknown values fall back to NTSC.
    pub fn from_flags(flags: u32) -> Self {
        match flags {
            1 => Self::Pal,
            2 => Self::Dendy,
            _ => Self::Ntsc,
        }
    }

    /// Chip clock in Hz. The backend renders one output sample per cycle,
    /// so this is also the output rate.
    pub fn chip_clock(&self) -> f64 {
        match self {
            Self::Ntsc => COLOR_NTSC / 2.0,
            Self::Pal => COLOR_PAL * 3.0 / 8.0,
            Self::Dendy => COLOR_PAL * 2.0 / 5.0,
        }
    }

    /// Emulation variant selector for the APU model
    pub fn apu_type(&self) -> u8 {
        match self {
            Self::Ntsc => 0,
            Self::Pal => 1,
            Self::Dendy => 2,
        }
    }

    /// Whether the APU uses the PAL period tables
    pub fn uses_pal_tables(&self) -> bool {
        self.apu_type() == 1
    }

    /// Frame counter quarter-frame period in CPU cycles
    pub fn quarter_frame_cycles(&self) -> u32 {
        match self {
            Self::Ntsc | Self::Dendy => 7457,
            Self::Pal => 8313,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ntsc => "NTSC",
            Self::Pal => "PAL",
            Self::Dendy => "Dendy",
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipConfig {
    /// Timing profile
    pub region: Region,
    /// Record every register write into the write queue
    pub dump_writes: bool,
}

impl ChipConfig {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }

    /// Build from the legacy integer flag word
    pub fn from_flags(flags: u32) -> Self {
        Self::new(Region::from_flags(flags))
    }

    /// Parse a JSON configuration
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_flags() {
        assert_eq!(Region::from_flags(0), Region::Ntsc);
        assert_eq!(Region::from_flags(1), Region::Pal);
        assert_eq!(Region::from_flags(2), Region::Dendy);
        assert_eq!(Region::from_flags(7), Region::Ntsc);
    }

    #[test]
    fn test_only_pal_uses_pal_tables() {
        assert_eq!(Region::Dendy.apu_type(), 2);
        assert!(Region::Pal.uses_pal_tables());
        assert!(!Region::Dendy.uses_pal_tables());
        assert!(!Region::Ntsc.uses_pal_tables());
    }

    #[test]
    fn test_chip_clocks() {
        assert_eq!(Region::Ntsc.chip_clock() as u32, 1_789_772);
        assert_eq!(Region::Pal.chip_clock() as u32, 1_662_607);
        assert_eq!(Region::Dendy.chip_clock() as u32, 1_773_447);
    }

    #[test]
    fn test_json_defaults() {
        let config = ChipConfig::from_json(r#"{"region":"dendy"}"#).unwrap();
        assert_eq!(config.region, Region::Dendy);
        assert!(!config.dump_writes);

        let config = ChipConfig::from_json("{}").unwrap();
        assert_eq!(config, ChipConfig::default());
    }

    #[test]
    fn test_json_rejects_unknown_region() {
        assert!(ChipConfig::from_json(r#"{"region":"secam"}"#).is_err());
    }
}
