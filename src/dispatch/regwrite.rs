//! Register write path and write trace

use serde::Serialize;

/// Reserved trace addresses. Anything in `0xFFFF0000..` is a meta event,
/// not a hardware register.
pub mod meta {
    /// Start of the reserved block
    pub const BASE: u32 = 0xFFFF_0000;
    /// DAC sample selected, value = sample index
    pub const DAC_SAMPLE: u32 = 0xFFFF_0000;
    /// DAC playback rate changed, value = rate in Hz
    pub const DAC_RATE: u32 = 0xFFFF_0001;
    /// DAC stopped or no valid sample
    pub const DAC_STOP: u32 = 0xFFFF_0002;
    /// Chip reset
    pub const RESET: u32 = 0xFFFF_FFFF;
}

/// One bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RegisterWrite {
    pub addr: u32,
    pub val: u16,
}

impl RegisterWrite {
    pub fn new(addr: u32, val: u16) -> Self {
        Self { addr, val }
    }

    /// Entry in the reserved meta block
    pub fn is_meta(&self) -> bool {
        self.addr >= meta::BASE
    }
}

/// Ordered log of writes awaiting an external consumer.
///
/// The producer only appends; consumers drain or clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WriteQueue {
    writes: Vec<RegisterWrite>,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: RegisterWrite) {
        self.writes.push(write);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterWrite> {
        self.writes.iter()
    }

    pub fn as_slice(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Take every pending write, leaving the queue empty
    pub fn drain(&mut self) -> Vec<RegisterWrite> {
        std::mem::take(&mut self.writes)
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    /// Writes to one address, oldest first
    pub fn to_addr(&self, addr: u32) -> impl Iterator<Item = u16> + '_ {
        self.writes
            .iter()
            .filter(move |w| w.addr == addr)
            .map(|w| w.val)
    }

    /// Most recent value written to `addr`
    pub fn last_to(&self, addr: u32) -> Option<u16> {
        self.to_addr(addr).last()
    }
}

/// Hardware model that register writes land in
pub trait ChipModel {
    fn write_register(&mut self, addr: u32, val: u16);

    /// Power-on state
    fn reset(&mut self);
}

/// Routes register writes to the chip model, the register pool and, when
/// dumping is on, the write queue.
#[derive(Debug, Clone)]
pub struct RegisterBus<M: ChipModel> {
    pub model: M,
    writes: WriteQueue,
    pool: Vec<u8>,
    pool_base: u32,
    dump_writes: bool,
    skip_writes: bool,
}

impl<M: ChipModel> RegisterBus<M> {
    /// `pool_size` registers starting at `pool_base` are mirrored in the pool
    pub fn new(model: M, pool_base: u32, pool_size: usize) -> Self {
        Self {
            model,
            writes: WriteQueue::new(),
            pool: vec![0; pool_size],
            pool_base,
            dump_writes: false,
            skip_writes: false,
        }
    }

    /// Hardware write. Dropped entirely while writes are skipped.
    pub fn write(&mut self, addr: u32, val: u16) {
        if self.skip_writes {
            return;
        }
        self.model.write_register(addr, val);
        if let Some(slot) = addr
            .checked_sub(self.pool_base)
            .and_then(|offset| self.pool.get_mut(offset as usize))
        {
            *slot = val as u8;
        }
        if self.dump_writes {
            self.writes.push(RegisterWrite::new(addr, val));
        }
    }

    /// Trace-only event in the reserved address block
    pub fn meta(&mut self, addr: u32, val: u16) {
        if self.dump_writes {
            self.writes.push(RegisterWrite::new(addr, val));
        }
    }

    /// Reset the model and clear the register pool
    pub fn reset(&mut self) {
        self.model.reset();
        self.pool.fill(0);
    }

    pub fn set_dump_writes(&mut self, enable: bool) {
        self.dump_writes = enable;
    }

    pub fn dump_writes(&self) -> bool {
        self.dump_writes
    }

    pub fn set_skip_writes(&mut self, skip: bool) {
        self.skip_writes = skip;
    }

    pub fn skip_writes(&self) -> bool {
        self.skip_writes
    }

    pub fn pool(&self) -> &[u8] {
        &self.pool
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.writes
    }

    pub fn queue_mut(&mut self) -> &mut WriteQueue {
        &mut self.writes
    }
}
