//! Nonlinear output mixer.
//!
//! Lookup approximation of the 2A03 DAC network, scaled by 500 and
//! truncated to integers.

use std::sync::LazyLock;

/// Indexed by `pulse1 + pulse2` (0-30)
pub static PULSE_TABLE: LazyLock<[i32; 31]> = LazyLock::new(|| {
    let mut table = [0; 31];
    for (n, v) in table.iter_mut().enumerate().skip(1) {
        *v = (95.52 / (8128.0 / n as f64 + 100.0) * 500.0) as i32;
    }
    table
});

/// Indexed by `3 * triangle + 2 * noise + dmc` (0-202)
pub static TND_TABLE: LazyLock<[i32; 203]> = LazyLock::new(|| {
    let mut table = [0; 203];
    for (n, v) in table.iter_mut().enumerate().skip(1) {
        *v = (163.67 / (24329.0 / n as f64 + 100.0) * 500.0) as i32;
    }
    table
});

/// Mix channel levels into one output sample
pub fn mix(pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> i16 {
    let pulse = PULSE_TABLE[(pulse1 as usize + pulse2 as usize).min(30)];
    let tnd_index = 3 * triangle as usize + 2 * noise as usize + dmc as usize;
    let tnd = TND_TABLE[tnd_index.min(202)];
    ((pulse + tnd) * 30) as i16
}
