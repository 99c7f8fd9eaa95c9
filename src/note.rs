//! Note and frequency calculations
//!
//! Notes are semitone indices starting at C; note 60 sounds at 1046.5 Hz
//! with the default 440 Hz tuning.

/// "No note" sentinel for note-valued command payloads
pub const NOTE_NULL: i32 = i32::MAX;

/// Number of notes covered by a [`NoteTable`]
pub const NOTE_COUNT: usize = 180;

/// Pitch of `note` in Hz
pub fn note_frequency(note: i32, tuning: f64) -> f64 {
    tuning * 0.0625 * 2.0_f64.powf((note + 3) as f64 / 12.0)
}

/// Playback rate that makes a sample sound at `note`, so that C-4 (48)
/// lands on roughly 8372 Hz.
pub fn sample_rate_for_note(note: i32, tuning: f64) -> f64 {
    tuning * 2.0_f64.powf((note + 3) as f64 / 12.0)
}

/// Apply a pitch offset to a base frequency value.
///
/// Period-based chips subtract the offset (a shorter period is a higher
/// pitch); frequency-based values scale by `pitch / 128`.
pub fn calc_freq(base: i32, pitch: i32, period: bool) -> i32 {
    let v = if period {
        base as i64 - pitch as i64
    } else {
        base as i64 + ((pitch as i64 * base as i64) >> 7)
    };
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Precomputed note values for a chip
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTable {
    /// Period (or frequency) value per note
    pub values: Vec<i32>,
}

impl NoteTable {
    /// Period table for a chip whose tone timer divides `clock` by
    /// `divider` per output step.
    pub fn periodic(clock: f64, divider: f64, tuning: f64) -> Self {
        let values = (0..NOTE_COUNT as i32)
            .map(|n| {
                let freq = note_frequency(n, tuning);
                (clock / freq / divider) as i32
            })
            .collect();
        Self { values }
    }

    /// Value for `note`, clamping out-of-range notes to the table ends
    pub fn get(&self, note: i32) -> i32 {
        let idx = note.clamp(0, self.values.len() as i32 - 1) as usize;
        self.values[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_frequency() {
        // note 60 is C
        let f = note_frequency(60, 440.0);
        assert!((f - 1046.502).abs() < 0.01);
        assert!((note_frequency(72, 440.0) - 2.0 * f).abs() < 0.01);
    }

    #[test]
    fn test_sample_rate_for_note() {
        let r = sample_rate_for_note(48, 440.0);
        assert!((r - 8372.018).abs() < 0.01);
    }

    #[test]
    fn test_calc_freq() {
        assert_eq!(calc_freq(400, 10, true), 390);
        assert_eq!(calc_freq(400, -10, true), 410);
        assert_eq!(calc_freq(1280, 0, false), 1280);
        assert_eq!(calc_freq(1280, 64, false), 1920);
    }

    #[test]
    fn test_periodic_table() {
        let table = NoteTable::periodic(1_789_772.7, 16.0, 440.0);
        assert_eq!(table.get(60), 106);
        // periods shrink as notes rise
        assert!(table.get(61) < table.get(60));
        assert_eq!(table.get(-5), table.get(0));
        assert_eq!(table.get(1000), table.get(NOTE_COUNT as i32 - 1));
    }
}
