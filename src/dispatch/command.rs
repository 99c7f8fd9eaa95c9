//! Command protocol between the sequencer and chip backends

pub use crate::note::NOTE_NULL;

/// Command kinds. Payload meaning is documented per variant as
/// `value` / `value2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Start a note. `value`: note or [`NOTE_NULL`] to keep the current one
    NoteOn,
    /// Stop the note and detach macros
    NoteOff,
    /// Stop the note but let macros play their release section
    NoteOffEnv,
    /// Release macros without stopping the note
    EnvRelease,
    /// Change instrument. `value`: id, `value2`: 1 forces a reload
    Instrument,
    /// Set volume. `value`: chip-native volume
    Volume,
    /// Query the stored volume
    GetVolume,
    /// Query the maximum volume
    GetVolMax,
    /// Set pitch offset. `value`: offset in chip units
    Pitch,
    /// Glide toward a note. `value`: step, `value2`: target note
    NotePorta,
    /// Change note without retriggering. `value`: note
    Legato,
    /// Prepare for portamento. `value`: nonzero enters glide mode
    PrePorta,
    /// Duty cycle / noise mode. `value`: mode
    StdNoiseMode,
    /// NES sweep unit. `value`: 0 = down, else up; `value2`: amount
    NesSweep,
    /// Select sample bank. `value`: bank
    SampleBank,
    /// Stereo panning. `value`: left, `value2`: right
    Panning,
    /// Select wavetable. `value`: wave id
    Wave,
    /// Ask whether volume must be resent on every row
    AlwaysSetVolume,
}

/// A command addressed to one channel of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub channel: usize,
    pub value: i32,
    pub value2: i32,
}

impl Command {
    pub fn new(kind: CommandKind, channel: usize, value: i32, value2: i32) -> Self {
        Self {
            kind,
            channel,
            value,
            value2,
        }
    }

    pub fn note_on(channel: usize, note: i32) -> Self {
        Self::new(CommandKind::NoteOn, channel, note, 0)
    }

    pub fn note_off(channel: usize) -> Self {
        Self::new(CommandKind::NoteOff, channel, 0, 0)
    }

    pub fn instrument(channel: usize, ins: i32) -> Self {
        Self::new(CommandKind::Instrument, channel, ins, 0)
    }

    pub fn volume(channel: usize, vol: i32) -> Self {
        Self::new(CommandKind::Volume, channel, vol, 0)
    }

    pub fn pitch(channel: usize, pitch: i32) -> Self {
        Self::new(CommandKind::Pitch, channel, pitch, 0)
    }

    pub fn note_porta(channel: usize, step: i32, target: i32) -> Self {
        Self::new(CommandKind::NotePorta, channel, step, target)
    }
}

/// Result of a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Command processed or ignored
    Done,
    /// Portamento reached its target
    PortaArrived,
    /// Query answer
    Value(i32),
}
