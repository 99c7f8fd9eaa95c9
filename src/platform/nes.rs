//! Ricoh 2A03 / 2A07 (NES APU) backend
//!
//! Channels: pulse 1, pulse 2, triangle, noise and a PCM channel that
//! streams sample data into the DMC direct-load register.

use crate::apu::{Apu, REG_BASE, REG_COUNT};
use crate::config::{ChipConfig, Region};
use crate::context::EngineContext;
use crate::dispatch::regwrite::meta;
use crate::dispatch::{
    Channel, ChannelRole, ChipDispatch, Command, CommandKind, DispatchStatus, OscBuffer,
    RegisterBus, WriteQueue, NOTE_NULL,
};
use crate::error::{Error, Result};
use crate::instrument::{Instrument, InstrumentKind};
use crate::note::{calc_freq, sample_rate_for_note, NoteTable};
use crate::sample::{Sample, REFERENCE_RATE};
use log::{debug, trace, warn};
use std::sync::Arc;

pub const CHIP_NAME: &str = "2A03";

/// Channel count
pub const CHANNELS: usize = 5;

const ROLES: [ChannelRole; CHANNELS] = [
    ChannelRole::Pulse,
    ChannelRole::Pulse,
    ChannelRole::Triangle,
    ChannelRole::Noise,
    ChannelRole::Dac,
];

/// Index of the PCM channel
const DAC_CHANNEL: usize = 4;

const MAX_VOL: i32 = 15;

/// Highest PCM playback rate (Hz)
const DAC_RATE_LIMIT: f64 = 32000.0;

/// Tone timer divider (16 CPU cycles per pulse sequencer period unit)
const PERIOD_DIVIDER: f64 = 16.0;

/// Noise period index per note, so that higher notes sound higher
static NOISE_TABLE: [u8; 256] = [
    6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 5, 4, //
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, //
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, //
    3, 2, 1, 0, 11, 10, 9, 8, 7, 6, 5, 4, //
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, //
    3, 2, 1, 0, 11, 10, 9, 8, 7, 6, 5, 4, //
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, //
    3, 2, 1, 0, 11, 10, 9, 8, 7, 6, 5, 4, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 0, 0, 0,
];

/// Register names for debugging views
pub static REGISTER_SHEET: &[(&str, u32)] = &[
    ("S0Volume", 0x4000),
    ("S0Sweep", 0x4001),
    ("S0PeriodL", 0x4002),
    ("S0PeriodH", 0x4003),
    ("S1Volume", 0x4004),
    ("S1Sweep", 0x4005),
    ("S1PeriodL", 0x4006),
    ("S1PeriodH", 0x4007),
    ("TRVolume", 0x4008),
    ("TRPeriodL", 0x400A),
    ("TRPeriodH", 0x400B),
    ("NSVolume", 0x400C),
    ("NSPeriod", 0x400E),
    ("NSLength", 0x400F),
    ("DMCControl", 0x4010),
    ("DMCLoad", 0x4011),
    ("DMCAddr", 0x4012),
    ("DMCLength", 0x4013),
    ("APUControl", 0x4015),
    ("APUFrameCtl", 0x4017),
];

const REG_DMC_LOAD: u32 = 0x4011;
const REG_CONTROL: u32 = 0x4015;

/// Pulse/noise volume register value
fn volume_reg(vol: i32, duty: i32) -> u16 {
    (0x30 | (vol & 15) | ((duty & 3) << 6)) as u16
}

/// Sample currently streamed by the PCM channel
#[derive(Debug, Clone)]
struct DacSample {
    index: usize,
    data: Arc<Sample>,
}

/// PCM playback position and rate
#[derive(Debug, Clone, Default)]
struct DacState {
    sample: Option<DacSample>,
    pos: usize,
    /// Rate accumulator, one DAC write each time it passes the chip rate
    period: u32,
    /// Playback rate (Hz)
    rate: u32,
}

pub struct NesDispatch {
    context: Arc<dyn EngineContext>,
    chan: [Channel; CHANNELS],
    osc: Vec<OscBuffer>,
    muted: [bool; CHANNELS],
    bus: RegisterBus<Apu>,
    dac: DacState,
    sample_bank: usize,
    notes: NoteTable,
    region: Region,
    rate: u32,
}

impl NesDispatch {
    /// Create and reset a backend. `channels` must be 5.
    pub fn new(context: Arc<dyn EngineContext>, channels: usize, config: &ChipConfig) -> Result<Self> {
        if channels != CHANNELS {
            return Err(Error::ChannelCount {
                chip: CHIP_NAME,
                expected: CHANNELS,
                got: channels,
            });
        }
        let rate = config.region.chip_clock() as u32;
        if rate == 0 {
            return Err(Error::Init(format!("zero clock for {}", config.region.name())));
        }
        let notes = NoteTable::periodic(config.region.chip_clock(), PERIOD_DIVIDER, context.tuning());

        let mut nes = Self {
            context,
            chan: ROLES.map(|role| Channel::new(role, MAX_VOL)),
            osc: (0..CHANNELS).map(|_| OscBuffer::new(rate)).collect(),
            muted: [false; CHANNELS],
            bus: RegisterBus::new(Apu::new(config.region), REG_BASE, REG_COUNT),
            dac: DacState::default(),
            sample_bank: 0,
            notes,
            region: config.region,
            rate,
        };
        nes.bus.set_dump_writes(config.dump_writes);
        nes.reset();
        debug!("{} initialised ({}, {} Hz)", CHIP_NAME, nes.region.name(), nes.rate);
        Ok(nes)
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Hardware model
    pub fn apu(&self) -> &Apu {
        &self.bus.model
    }

    pub fn sample_bank(&self) -> usize {
        self.sample_bank
    }

    /// Sample index the PCM channel is playing
    pub fn dac_sample(&self) -> Option<usize> {
        self.dac.sample.as_ref().map(|s| s.index)
    }

    pub fn dac_rate(&self) -> u32 {
        self.dac.rate
    }

    /// Period value for `note` on the tone channels
    pub fn note_period(&self, note: i32) -> i32 {
        self.notes.get(note)
    }

    fn enable_mask(&self) -> u16 {
        self.muted
            .iter()
            .enumerate()
            .fold(0, |mask, (i, &m)| if m { mask } else { mask | 1 << i })
    }

    fn dac_stop(&mut self) {
        self.dac.sample = None;
        self.bus.meta(meta::DAC_STOP, 0);
    }

    fn dac_start(&mut self, index: usize, data: Arc<Sample>) {
        self.bus.meta(meta::DAC_SAMPLE, index as u16);
        self.dac.sample = Some(DacSample { index, data });
        self.dac.pos = 0;
        self.dac.period = 0;
    }

    fn dac_missing(&mut self, index: i64) {
        warn!("{}: sample {} not available, stopping DAC", CHIP_NAME, index);
        self.dac_stop();
        self.chan[DAC_CHANNEL].active = false;
    }

    fn set_dac_rate(&mut self, rate: u32) {
        self.dac.rate = rate;
        self.bus.meta(meta::DAC_RATE, rate.min(u16::MAX as u32) as u16);
        trace!("{}: DAC rate {} Hz", CHIP_NAME, rate);
    }

    fn dac_note_on(&mut self, value: i32) {
        let ins = self.context.instrument(self.chan[DAC_CHANNEL].ins);
        match ins.as_deref() {
            Some(Instrument {
                kind: InstrumentKind::Sample,
                sample,
                ..
            }) => {
                let init = sample.init_sample;
                let found = usize::try_from(init)
                    .ok()
                    .and_then(|i| self.context.sample(i).map(|s| (i, s)));
                let Some((index, data)) = found else {
                    self.dac_missing(init as i64);
                    return;
                };
                self.dac_start(index, data);

                let tuning = self.context.tuning();
                let ch = &mut self.chan[DAC_CHANNEL];
                let note = if value != NOTE_NULL { value } else { ch.note };
                ch.base_freq = sample_rate_for_note(note, tuning) as i32;
                if value != NOTE_NULL {
                    ch.freq_changed = true;
                    ch.note = value;
                }
                ch.active = true;
                ch.key_on = true;
                ch.native_dac = true;
            }
            _ => {
                let ch = &mut self.chan[DAC_CHANNEL];
                if value != NOTE_NULL {
                    ch.note = value;
                }
                let index = 12 * self.sample_bank + ch.note.rem_euclid(12) as usize;
                let Some(data) = self.context.sample(index) else {
                    self.dac_missing(index as i64);
                    return;
                };
                let rate = (data.rate as f64).min(DAC_RATE_LIMIT) as u32;
                self.dac_start(index, data);
                self.set_dac_rate(rate);
                let ch = &mut self.chan[DAC_CHANNEL];
                ch.active = true;
                ch.key_on = true;
                ch.native_dac = false;
            }
        }
    }

    fn note_on(&mut self, channel: usize, value: i32) {
        let ins = self.context.instrument(self.chan[channel].ins);
        let ch = &mut self.chan[channel];
        if value != NOTE_NULL {
            ch.base_freq = match ch.role {
                ChannelRole::Noise => value,
                _ => self.notes.get(value),
            };
            ch.freq_changed = true;
            ch.note = value;
        }
        ch.active = true;
        ch.key_on = true;
        ch.macro_init(ins);
        let val = match ch.role {
            ChannelRole::Triangle => 0xFF,
            _ => volume_reg(ch.vol, ch.duty),
        };
        self.bus.write(REG_BASE + 4 * channel as u32, val);
    }

    fn note_off(&mut self, channel: usize, release: bool) {
        if self.chan[channel].role == ChannelRole::Dac {
            self.dac_stop();
        }
        let ch = &mut self.chan[channel];
        ch.active = false;
        ch.key_off = true;
        if release {
            ch.std.release();
        } else {
            ch.macro_init(None);
        }
    }

    fn porta_target(&self, role: ChannelRole, note: i32) -> i32 {
        match role {
            ChannelRole::Noise => note,
            ChannelRole::Dac => sample_rate_for_note(note, self.context.tuning()) as i32,
            _ => self.notes.get(note),
        }
    }

    fn tick_channel(&mut self, i: usize) {
        let Self {
            chan, bus, notes, ..
        } = self;
        let ch = &mut chan[i];
        let base = REG_BASE + 4 * i as u32;

        ch.std.next();

        if ch.std.vol.had {
            ch.out_vol = (ch.std.vol.val.min(MAX_VOL) - (MAX_VOL - (ch.vol & 15))).max(0);
            if ch.role == ChannelRole::Triangle {
                bus.write(base, if ch.out_vol == 0 { 0 } else { 0xFF });
                ch.freq_changed = true;
            } else {
                bus.write(base, volume_reg(ch.out_vol, ch.duty));
            }
        }

        if ch.std.arp.had {
            let arp = ch.std.arp.val;
            let target = if ch.std.arp_mode { arp } else { ch.note + arp };
            match ch.role {
                ChannelRole::Noise => ch.base_freq = target.clamp(0, 255),
                _ if !ch.in_porta => ch.base_freq = notes.get(target),
                _ => {}
            }
            ch.freq_changed = true;
        } else if ch.std.arp_mode && ch.std.arp.finished {
            ch.base_freq = match ch.role {
                ChannelRole::Noise => ch.note.clamp(0, 255),
                _ => notes.get(ch.note),
            };
            ch.freq_changed = true;
        }

        if ch.std.duty.had {
            ch.duty = ch.std.duty.val;
            if ch.role == ChannelRole::Noise {
                ch.duty = ch.duty.clamp(0, 1);
                ch.freq_changed = true;
            }
            if ch.role != ChannelRole::Triangle {
                bus.write(base, volume_reg(ch.out_vol, ch.duty));
            }
        }

        if ch.std.pitch.had {
            ch.pitch2 = ch.std.pitch.val;
            ch.freq_changed = true;
        }

        // sweep is latched as soon as it is set
        ch.sweep_changed = false;

        if ch.freq_changed || ch.key_on || ch.key_off {
            ch.freq = match ch.role {
                ChannelRole::Noise => NOISE_TABLE[ch.base_freq.clamp(0, 255) as usize] as i32,
                _ => calc_freq(ch.base_freq, ch.pitch.saturating_add(ch.pitch2), true).clamp(0, 2047),
            };
            if ch.key_off {
                let silence = if ch.role == ChannelRole::Triangle { 0x00 } else { 0x30 };
                bus.write(base, silence);
            }
            if ch.role == ChannelRole::Noise {
                bus.write(base + 2, ((ch.duty.clamp(0, 1) << 7) | ch.freq) as u16);
                bus.write(base + 3, 0xF0);
            } else {
                bus.write(base + 2, (ch.freq & 0xFF) as u16);
                if (ch.prev_freq >> 8) != (ch.freq >> 8) || ch.role == ChannelRole::Triangle {
                    bus.write(base + 3, (0xF8 | (ch.freq >> 8)) as u16);
                }
                if ch.freq != 65535 && ch.freq != 0 {
                    ch.prev_freq = ch.freq;
                }
            }
            ch.key_on = false;
            ch.key_off = false;
            ch.freq_changed = false;
        }
    }

    fn tick_dac(&mut self) {
        let ch = &mut self.chan[DAC_CHANNEL];
        ch.key_on = false;
        ch.key_off = false;
        if !ch.freq_changed {
            return;
        }
        ch.freq_changed = false;
        ch.freq = calc_freq(ch.base_freq, ch.pitch, false);
        if ch.native_dac {
            let off = self.dac.sample.as_ref().map_or(1.0, |s| {
                s.data.center_rate as f64 / REFERENCE_RATE as f64
            });
            let rate = (ch.freq as f64 * off).clamp(0.0, DAC_RATE_LIMIT) as u32;
            self.set_dac_rate(rate);
        }
    }

    /// Advance PCM playback by one output sample
    fn step_dac(&mut self) {
        let Some(current) = self.dac.sample.as_ref() else {
            return;
        };
        self.dac.period = self.dac.period.saturating_add(self.dac.rate);
        if self.dac.period < self.rate {
            return;
        }
        let data = &current.data;
        if data.is_empty() {
            self.dac.sample = None;
            return;
        }
        let level = data.unsigned_at(self.dac.pos, 7);
        let len = data.len();
        let loop_point = data.loop_point();

        if !self.muted[DAC_CHANNEL] {
            if let Some(level) = level {
                self.bus.write(REG_DMC_LOAD, level);
            }
        }
        self.dac.pos += 1;
        if self.dac.pos >= len {
            match loop_point {
                Some(pos) => self.dac.pos = pos,
                None => self.dac.sample = None,
            }
        }
        self.dac.period -= self.rate;
    }
}

impl ChipDispatch for NesDispatch {
    fn name(&self) -> &'static str {
        CHIP_NAME
    }

    fn channel_count(&self) -> usize {
        CHANNELS
    }

    fn rate(&self) -> u32 {
        self.rate
    }

    fn dispatch(&mut self, c: Command) -> DispatchStatus {
        if c.channel >= CHANNELS {
            debug!("{}: ignoring {:?} for channel {}", CHIP_NAME, c.kind, c.channel);
            return DispatchStatus::Done;
        }
        let role = self.chan[c.channel].role;
        match c.kind {
            CommandKind::NoteOn => {
                if role == ChannelRole::Dac {
                    self.dac_note_on(c.value);
                } else {
                    self.note_on(c.channel, c.value);
                }
            }
            CommandKind::NoteOff => self.note_off(c.channel, false),
            CommandKind::NoteOffEnv => self.note_off(c.channel, true),
            CommandKind::EnvRelease => self.chan[c.channel].std.release(),
            CommandKind::Instrument => {
                let ch = &mut self.chan[c.channel];
                if ch.ins != c.value || c.value2 == 1 {
                    ch.ins = c.value;
                    ch.ins_changed = true;
                }
            }
            CommandKind::Volume => {
                let vol = c.value.clamp(0, MAX_VOL);
                let ch = &mut self.chan[c.channel];
                if ch.vol != vol {
                    ch.vol = vol;
                    if !ch.std.has_vol() {
                        ch.out_vol = vol;
                    }
                    if ch.active {
                        let val = match role {
                            ChannelRole::Dac => None,
                            ChannelRole::Triangle => Some(0xFF),
                            _ => Some(volume_reg(ch.vol, ch.duty)),
                        };
                        if let Some(val) = val {
                            self.bus.write(REG_BASE + 4 * c.channel as u32, val);
                        }
                    }
                }
            }
            CommandKind::GetVolume => return DispatchStatus::Value(self.chan[c.channel].vol),
            CommandKind::GetVolMax => return DispatchStatus::Value(MAX_VOL),
            CommandKind::AlwaysSetVolume => return DispatchStatus::Value(1),
            CommandKind::Pitch => {
                let ch = &mut self.chan[c.channel];
                ch.pitch = c.value;
                ch.freq_changed = true;
            }
            CommandKind::NotePorta => {
                let dest = self.porta_target(role, c.value2);
                let ch = &mut self.chan[c.channel];
                let arrived = if dest > ch.base_freq {
                    ch.base_freq = ch.base_freq.saturating_add(c.value);
                    ch.base_freq >= dest
                } else {
                    ch.base_freq = ch.base_freq.saturating_sub(c.value);
                    ch.base_freq <= dest
                };
                ch.freq_changed = true;
                if arrived {
                    ch.base_freq = dest;
                    ch.in_porta = false;
                    return DispatchStatus::PortaArrived;
                }
            }
            CommandKind::Legato => {
                if role.is_tone() {
                    let ch = &mut self.chan[c.channel];
                    let arp = if ch.std.will_arp() && !ch.std.arp_mode {
                        ch.std.arp.val
                    } else {
                        0
                    };
                    ch.base_freq = self.notes.get(c.value.saturating_add(arp));
                    ch.freq_changed = true;
                    ch.note = c.value;
                }
            }
            CommandKind::PrePorta => {
                let ins = self.context.instrument(self.chan[c.channel].ins);
                let ch = &mut self.chan[c.channel];
                ch.macro_init(ins);
                ch.in_porta = c.value != 0;
            }
            CommandKind::StdNoiseMode => {
                let ch = &mut self.chan[c.channel];
                ch.duty = c.value;
                if role == ChannelRole::Noise {
                    ch.freq_changed = true;
                }
            }
            CommandKind::NesSweep => {
                if role != ChannelRole::Pulse {
                    return DispatchStatus::Done;
                }
                let ch = &mut self.chan[c.channel];
                ch.sweep = if c.value2 == 0 {
                    0x08
                } else if c.value == 0 {
                    0x88 | (c.value2 & 0x77) as u8
                } else {
                    0x80 | (c.value2 & 0x77) as u8
                };
                ch.sweep_changed = true;
                let sweep = ch.sweep;
                self.bus.write(0x4001 + 4 * c.channel as u32, sweep as u16);
            }
            CommandKind::SampleBank => {
                let max = self.context.sample_count() / 12;
                self.sample_bank = usize::try_from(c.value).unwrap_or(0).min(max);
            }
            CommandKind::Panning | CommandKind::Wave => {}
        }
        DispatchStatus::Done
    }

    fn tick(&mut self) {
        for i in 0..CHANNELS {
            match self.chan[i].role {
                ChannelRole::Dac => self.tick_dac(),
                _ => self.tick_channel(i),
            }
        }
    }

    fn acquire(&mut self, buf_l: &mut [i16], buf_r: &mut [i16], start: usize, len: usize) {
        let end = (start + len).min(buf_l.len()).min(buf_r.len());
        for i in start..end {
            self.step_dac();

            let apu = &mut self.bus.model;
            apu.clock();
            let out = apu.output();
            buf_l[i] = out;
            buf_r[i] = out;

            let levels = apu.levels();
            for (ch, osc) in self.osc.iter_mut().enumerate() {
                let shift = if ch == DAC_CHANNEL { 8 } else { 11 };
                osc.push((levels[ch] as i16) << shift);
            }
        }
    }

    fn reset(&mut self) {
        for ch in self.chan.iter_mut() {
            ch.reset(MAX_VOL);
        }
        self.bus.meta(meta::RESET, 0);

        self.dac = DacState::default();
        self.sample_bank = 0;
        self.bus.reset();
        for osc in self.osc.iter_mut() {
            osc.clear();
        }

        let mask = self.enable_mask();
        self.bus.write(REG_CONTROL, mask);
        self.bus.write(0x4001, self.chan[0].sweep as u16);
        self.bus.write(0x4005, self.chan[1].sweep as u16);
        debug!("{} reset", CHIP_NAME);
    }

    fn force_ins(&mut self) {
        for ch in self.chan.iter_mut() {
            ch.ins_changed = true;
            ch.prev_freq = 65535;
        }
        self.bus.write(0x4001, self.chan[0].sweep as u16);
        self.bus.write(0x4005, self.chan[1].sweep as u16);
    }

    fn mute_channel(&mut self, channel: usize, mute: bool) {
        let Some(slot) = self.muted.get_mut(channel) else {
            return;
        };
        *slot = mute;
        let mask = self.enable_mask();
        self.bus.write(REG_CONTROL, mask);
        if self.muted[DAC_CHANNEL] {
            self.bus.write(REG_DMC_LOAD, 0);
        }
    }

    fn set_flags(&mut self, config: &ChipConfig) {
        self.region = config.region;
        self.rate = config.region.chip_clock() as u32;
        self.notes = NoteTable::periodic(config.region.chip_clock(), PERIOD_DIVIDER, self.context.tuning());
        self.bus.model.set_region(config.region);
        for osc in self.osc.iter_mut() {
            osc.rate = self.rate;
        }
        debug!(
            "{}: {} timing, APU type {}, {} Hz",
            CHIP_NAME,
            self.region.name(),
            self.region.apu_type(),
            self.rate
        );
    }

    fn notify_ins_deletion(&mut self, ins: &Arc<Instrument>) {
        for ch in self.chan.iter_mut() {
            ch.std.notify_ins_deletion(ins);
        }
    }

    fn poke(&mut self, addr: u32, val: u16) {
        self.bus.write(addr, val);
    }

    fn register_sheet(&self) -> &'static [(&'static str, u32)] {
        REGISTER_SHEET
    }

    fn register_pool(&self) -> &[u8] {
        self.bus.pool()
    }

    fn channel_state(&self, channel: usize) -> Option<&Channel> {
        self.chan.get(channel)
    }

    fn osc_buffer(&self, channel: usize) -> Option<&OscBuffer> {
        self.osc.get(channel)
    }

    fn set_dump_writes(&mut self, enable: bool) {
        self.bus.set_dump_writes(enable);
    }

    fn set_skip_register_writes(&mut self, skip: bool) {
        self.bus.set_skip_writes(skip);
    }

    fn write_queue(&self) -> &WriteQueue {
        self.bus.queue()
    }

    fn write_queue_mut(&mut self) -> &mut WriteQueue {
        self.bus.queue_mut()
    }

    fn key_off_affects_arp(&self, _channel: usize) -> bool {
        true
    }

    fn quit(self: Box<Self>) {
        debug!("{} quit", CHIP_NAME);
    }
}
