//! Frame counter that clocks envelopes, linear counter, length counters
//! and sweeps.

/// Signals produced by one frame counter clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSignal {
    /// Envelopes and the triangle linear counter
    pub quarter: bool,
    /// Length counters and sweep units
    pub half: bool,
}

impl FrameSignal {
    const BOTH: Self = Self {
        quarter: true,
        half: true,
    };
}

/// 4-step / 5-step sequencer
#[derive(Debug, Clone)]
pub struct FrameCounter {
    five_step: bool,
    irq_inhibit: bool,
    step: u8,
    cycle_count: u32,
    /// CPU cycles per quarter frame
    quarter_cycles: u32,
}

impl FrameCounter {
    pub fn new(quarter_cycles: u32) -> Self {
        Self {
            five_step: false,
            irq_inhibit: false,
            step: 0,
            cycle_count: 0,
            quarter_cycles,
        }
    }

    pub fn set_quarter_cycles(&mut self, quarter_cycles: u32) {
        self.quarter_cycles = quarter_cycles;
    }

    /// One CPU cycle
    pub fn clock(&mut self) -> FrameSignal {
        self.cycle_count += 1;
        if self.cycle_count < self.quarter_cycles {
            return FrameSignal::default();
        }
        self.cycle_count = 0;
        self.step += 1;
        let steps = if self.five_step { 5 } else { 4 };
        if self.step >= steps {
            self.step = 0;
        }
        let half = if self.five_step {
            self.step == 1 || self.step == 4
        } else {
            self.step == 1 || self.step == 3
        };
        FrameSignal {
            quarter: true,
            half,
        }
    }

    /// `$4017` write. Selecting 5-step mode clocks every unit at once.
    pub fn write_control(&mut self, val: u8) -> FrameSignal {
        self.five_step = val & 0x80 != 0;
        self.irq_inhibit = val & 0x40 != 0;
        self.step = 0;
        self.cycle_count = 0;
        if self.five_step {
            FrameSignal::BOTH
        } else {
            FrameSignal::default()
        }
    }

    pub fn is_five_step(&self) -> bool {
        self.five_step
    }

    pub fn irq_inhibit(&self) -> bool {
        self.irq_inhibit
    }
}
