//! Per-channel macro interpreter
//!
//! Steps the macro tables of the channel's instrument once per tick and
//! reports, per macro kind, whether a value was produced this tick (`had`)
//! and whether the macro ran out on the previous tick (`finished`).

use crate::instrument::{Instrument, MacroKind, MacroTable};
use std::sync::Arc;

/// Cursor and output of one macro
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroState {
    /// Value produced by the last step
    pub val: i32,
    /// Next index into the table
    pos: usize,
    /// Macro is still running
    pub has: bool,
    /// A value was produced this tick
    pub had: bool,
    /// The macro stopped producing values this tick
    pub finished: bool,
    /// The instrument defines this macro (set at init, never stepped)
    pub will: bool,
}

impl MacroState {
    fn start(&mut self, table: &MacroTable) {
        *self = Self::default();
        self.has = !table.is_empty();
        self.will = self.has;
    }

    fn step(&mut self, table: &MacroTable, released: bool) {
        self.finished = self.had && !self.has;
        self.had = self.has;
        if !self.has {
            return;
        }

        let len = table.len();
        let Some(&val) = table.data.get(self.pos) else {
            self.has = false;
            return;
        };
        self.val = val;
        self.pos += 1;

        let loop_start = table.valid_loop();
        let release = table.valid_release();

        if let Some(rel) = release {
            if self.pos > rel && !released {
                match loop_start {
                    Some(l) if l < rel => self.pos = l,
                    _ => self.pos -= 1,
                }
            }
        }

        if self.pos >= len {
            match loop_start {
                Some(l) if release.map_or(true, |rel| l >= rel) => self.pos = l,
                _ => self.has = false,
            }
        }
    }

    /// Current table position
    pub fn pos(&self) -> usize {
        self.pos
    }
}

/// Macro interpreter bound to one channel
#[derive(Debug, Clone, Default)]
pub struct MacroInterpreter {
    ins: Option<Arc<Instrument>>,
    pub vol: MacroState,
    pub arp: MacroState,
    pub duty: MacroState,
    pub pitch: MacroState,
    /// Arpeggio values are absolute notes
    pub arp_mode: bool,
    released: bool,
}

impl MacroInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart all macros from `ins`, or deactivate them with `None`.
    pub fn init(&mut self, ins: Option<Arc<Instrument>>) {
        self.released = false;
        match ins.as_deref() {
            Some(i) => {
                self.vol.start(&i.std.vol);
                self.arp.start(&i.std.arp);
                self.duty.start(&i.std.duty);
                self.pitch.start(&i.std.pitch);
                self.arp_mode = i.std.arp_fixed;
            }
            None => {
                self.vol = MacroState::default();
                self.arp = MacroState::default();
                self.duty = MacroState::default();
                self.pitch = MacroState::default();
                self.arp_mode = false;
            }
        }
        self.ins = ins;
    }

    /// Advance every active macro by one tick
    pub fn next(&mut self) {
        let Self {
            ins,
            vol,
            arp,
            duty,
            pitch,
            released,
            ..
        } = self;
        match ins.as_deref() {
            Some(i) => {
                vol.step(&i.std.vol, *released);
                arp.step(&i.std.arp, *released);
                duty.step(&i.std.duty, *released);
                pitch.step(&i.std.pitch, *released);
            }
            None => {
                for state in [vol, arp, duty, pitch] {
                    state.finished = state.had && !state.has;
                    state.had = false;
                }
            }
        }
    }

    /// Let macros run past their release points
    pub fn release(&mut self) {
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Detach if bound to an instrument that is being deleted
    pub fn notify_ins_deletion(&mut self, which: &Arc<Instrument>) {
        if self.ins.as_ref().is_some_and(|i| Arc::ptr_eq(i, which)) {
            self.init(None);
        }
    }

    /// Instrument the macros are read from
    pub fn instrument(&self) -> Option<&Arc<Instrument>> {
        self.ins.as_ref()
    }

    pub fn state(&self, kind: MacroKind) -> &MacroState {
        match kind {
            MacroKind::Volume => &self.vol,
            MacroKind::Arpeggio => &self.arp,
            MacroKind::Duty => &self.duty,
            MacroKind::Pitch => &self.pitch,
        }
    }

    /// Volume macro is running
    pub fn has_vol(&self) -> bool {
        self.vol.has
    }

    /// Instrument defines an arpeggio macro
    pub fn will_arp(&self) -> bool {
        self.arp.will
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins_with(kind: MacroKind, table: MacroTable) -> Arc<Instrument> {
        Arc::new(Instrument::new("test").with_macro(kind, table))
    }

    fn collect_vol(m: &mut MacroInterpreter, ticks: usize) -> Vec<Option<i32>> {
        (0..ticks)
            .map(|_| {
                m.next();
                m.vol.had.then_some(m.vol.val)
            })
            .collect()
    }

    #[test]
    fn test_one_shot_then_finished() {
        let mut m = MacroInterpreter::new();
        m.init(Some(ins_with(MacroKind::Volume, MacroTable::new(vec![15, 10, 5]))));
        assert_eq!(collect_vol(&mut m, 3), vec![Some(15), Some(10), Some(5)]);
        assert!(!m.vol.finished);
        m.next();
        assert!(!m.vol.had);
        assert!(m.vol.finished);
        m.next();
        assert!(!m.vol.finished);
    }

    #[test]
    fn test_loop() {
        let mut m = MacroInterpreter::new();
        let table = MacroTable::new(vec![1, 2, 3]).with_loop(1);
        m.init(Some(ins_with(MacroKind::Volume, table)));
        assert_eq!(
            collect_vol(&mut m, 7),
            vec![Some(1), Some(2), Some(3), Some(2), Some(3), Some(2), Some(3)]
        );
    }

    #[test]
    fn test_release_holds_until_released() {
        let mut m = MacroInterpreter::new();
        let table = MacroTable::new(vec![15, 12, 8, 4, 0]).with_release(1);
        m.init(Some(ins_with(MacroKind::Volume, table)));
        assert_eq!(
            collect_vol(&mut m, 4),
            vec![Some(15), Some(12), Some(12), Some(12)]
        );
        assert_eq!(m.state(MacroKind::Volume).pos(), 1);
        assert!(!m.is_released());
        m.release();
        assert!(m.is_released());
        assert_eq!(
            collect_vol(&mut m, 5),
            vec![Some(12), Some(8), Some(4), Some(0), None]
        );
    }

    #[test]
    fn test_release_loops_sustain_section() {
        let mut m = MacroInterpreter::new();
        let table = MacroTable::new(vec![1, 2, 3, 9]).with_loop(1).with_release(2);
        m.init(Some(ins_with(MacroKind::Volume, table)));
        assert_eq!(
            collect_vol(&mut m, 6),
            vec![Some(1), Some(2), Some(3), Some(2), Some(3), Some(2)]
        );
        m.release();
        assert_eq!(collect_vol(&mut m, 3), vec![Some(3), Some(9), None]);
    }

    #[test]
    fn test_init_none_deactivates() {
        let mut m = MacroInterpreter::new();
        m.init(Some(ins_with(MacroKind::Volume, MacroTable::new(vec![3; 8]))));
        m.next();
        assert!(m.vol.had);
        m.init(None);
        for _ in 0..4 {
            m.next();
            assert!(!m.vol.had);
        }
        assert!(!m.has_vol());
    }

    #[test]
    fn test_will_arp_and_mode() {
        let mut m = MacroInterpreter::new();
        let ins = Instrument::new("arp")
            .with_macro(MacroKind::Arpeggio, MacroTable::new(vec![0, 4, 7]))
            .with_fixed_arp(true);
        m.init(Some(Arc::new(ins)));
        assert!(m.will_arp());
        assert!(m.arp_mode);
        assert!(!m.vol.will);
    }

    #[test]
    fn test_notify_deletion() {
        let ins = ins_with(MacroKind::Volume, MacroTable::new(vec![1; 4]));
        let other = ins_with(MacroKind::Volume, MacroTable::new(vec![1; 4]));
        let mut m = MacroInterpreter::new();
        m.init(Some(ins.clone()));
        m.notify_ins_deletion(&other);
        assert!(m.instrument().is_some());
        m.notify_ins_deletion(&ins);
        assert!(m.instrument().is_none());
    }
}
