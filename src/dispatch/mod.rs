//! Chip dispatch contract
//!
//! Every chip backend implements [`ChipDispatch`]. The sequencer talks to all
//! of them the same way: commands through [`ChipDispatch::dispatch`], one
//! [`ChipDispatch::tick`] per musical tick and [`ChipDispatch::acquire`] to
//! render audio at the chip's own rate.

pub mod channel;
pub mod command;
pub mod osc;
pub mod regwrite;

pub use channel::{Channel, ChannelRole};
pub use command::{Command, CommandKind, DispatchStatus, NOTE_NULL};
pub use osc::OscBuffer;
pub use regwrite::{ChipModel, RegisterBus, RegisterWrite, WriteQueue};

use crate::config::ChipConfig;
use crate::context::EngineContext;
use crate::error::{Error, Result};
use crate::instrument::Instrument;
use crate::macro_int::MacroInterpreter;
use crate::platform::nes::NesDispatch;
use std::sync::Arc;

/// Sound chip backend
pub trait ChipDispatch: Send {
    /// Chip name (e.g., "2A03")
    fn name(&self) -> &'static str;

    /// Number of channels
    fn channel_count(&self) -> usize;

    /// Output rate of [`ChipDispatch::acquire`] in Hz
    fn rate(&self) -> u32;

    /// Execute one command
    fn dispatch(&mut self, command: Command) -> DispatchStatus;

    /// Advance macros and flush pending channel changes to the chip
    fn tick(&mut self);

    /// Render `len` samples into `buf_l[start..]` and `buf_r[start..]`
    fn acquire(&mut self, buf_l: &mut [i16], buf_r: &mut [i16], start: usize, len: usize);

    /// Return every channel and the chip to power-on state
    fn reset(&mut self);

    /// Mark instruments for reapplication and rewrite latched registers
    fn force_ins(&mut self);

    /// Mute or unmute a channel. Channel state keeps updating while muted.
    fn mute_channel(&mut self, channel: usize, mute: bool);

    /// Switch timing profile
    fn set_flags(&mut self, config: &ChipConfig);

    /// An instrument is about to be deleted
    fn notify_ins_deletion(&mut self, ins: &Arc<Instrument>);

    /// Raw register write through the normal write path
    fn poke(&mut self, addr: u32, val: u16);

    fn poke_all(&mut self, writes: &[RegisterWrite]) {
        for w in writes {
            self.poke(w.addr, w.val);
        }
    }

    /// Register name to address table for debugging views
    fn register_sheet(&self) -> &'static [(&'static str, u32)];

    /// Last value written to each register
    fn register_pool(&self) -> &[u8];

    fn channel_state(&self, channel: usize) -> Option<&Channel>;

    fn channel_macro(&self, channel: usize) -> Option<&MacroInterpreter> {
        self.channel_state(channel).map(|c| &c.std)
    }

    fn osc_buffer(&self, channel: usize) -> Option<&OscBuffer>;

    /// Record register writes into the write queue
    fn set_dump_writes(&mut self, enable: bool);

    /// Drop hardware writes (used while seeking)
    fn set_skip_register_writes(&mut self, skip: bool);

    fn write_queue(&self) -> &WriteQueue;

    fn write_queue_mut(&mut self) -> &mut WriteQueue;

    fn is_stereo(&self) -> bool {
        false
    }

    /// Whether note off cancels a running arpeggio
    fn key_off_affects_arp(&self, _channel: usize) -> bool {
        false
    }

    /// Shut the backend down
    fn quit(self: Box<Self>) {}
}

/// Create a backend by chip name
pub fn create_dispatch(
    name: &str,
    context: Arc<dyn EngineContext>,
    channels: usize,
    config: &ChipConfig,
) -> Result<Box<dyn ChipDispatch>> {
    let chip: Box<dyn ChipDispatch> = match name {
        "2A03" | "NES" | "FAMICOM" => Box::new(NesDispatch::new(context, channels, config)?),
        _ => return Err(Error::UnknownChip(name.to_string())),
    };
    Ok(chip)
}

/// List all available chip names
pub fn list_chips() -> Vec<&'static str> {
    vec!["2A03"]
}

/// Channel count a chip must be created with
pub fn chip_channels(name: &str) -> Result<usize> {
    match name {
        "2A03" | "NES" | "FAMICOM" => Ok(crate::platform::nes::CHANNELS),
        _ => Err(Error::UnknownChip(name.to_string())),
    }
}
