//! Chip backends

pub mod nes;

pub use nes::NesDispatch;
