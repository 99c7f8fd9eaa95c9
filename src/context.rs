//! Read-only view of song data used by chip backends

use crate::instrument::Instrument;
use crate::sample::Sample;
use std::sync::Arc;

/// Default tuning (A-4, Hz)
pub const DEFAULT_TUNING: f64 = 440.0;

/// Lookups a backend performs against the song.
///
/// The host must not mutate the data behind this trait while a backend call
/// is in progress.
pub trait EngineContext: Send + Sync {
    /// Instrument by id. Negative or unknown ids yield `None`.
    fn instrument(&self, id: i32) -> Option<Arc<Instrument>>;

    /// Sample by table index
    fn sample(&self, index: usize) -> Option<Arc<Sample>>;

    /// Number of entries in the sample table
    fn sample_count(&self) -> usize;

    /// Song tuning (frequency of A-4)
    fn tuning(&self) -> f64 {
        DEFAULT_TUNING
    }
}

/// Plain in-memory song data
#[derive(Debug, Clone)]
pub struct SongData {
    pub instruments: Vec<Arc<Instrument>>,
    pub samples: Vec<Arc<Sample>>,
    pub tuning: f64,
}

impl SongData {
    pub fn new() -> Self {
        Self {
            instruments: Vec::new(),
            samples: Vec::new(),
            tuning: DEFAULT_TUNING,
        }
    }

    /// Append an instrument and return its id
    pub fn add_instrument(&mut self, ins: Instrument) -> i32 {
        self.instruments.push(Arc::new(ins));
        (self.instruments.len() - 1) as i32
    }

    /// Append a sample and return its index
    pub fn add_sample(&mut self, sample: Sample) -> usize {
        self.samples.push(Arc::new(sample));
        self.samples.len() - 1
    }
}

impl Default for SongData {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineContext for SongData {
    fn instrument(&self, id: i32) -> Option<Arc<Instrument>> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.instruments.get(i))
            .cloned()
    }

    fn sample(&self, index: usize) -> Option<Arc<Sample>> {
        self.samples.get(index).cloned()
    }

    fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn tuning(&self) -> f64 {
        self.tuning
    }
}
