//! Display-only readout of the phase: the "Rev" band and the month counter.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimelinePhase {
    RevA,
    RevB,
    RevC,
}

impl TimelinePhase {
    pub fn from_phase(phase: f32) -> Self {
        if phase < 1.0 / 3.0 {
            TimelinePhase::RevA
        } else if phase < 2.0 / 3.0 {
            TimelinePhase::RevB
        } else {
            TimelinePhase::RevC
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimelinePhase::RevA => "Rev A",
            TimelinePhase::RevB => "Rev B",
            TimelinePhase::RevC => "Rev C",
        }
    }
}

impl fmt::Display for TimelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `clamp(round(6 + phase * 54), 6, 48)`.
pub fn month_for(phase: f32) -> u32 {
    let month = (6.0 + phase * 54.0).round();
    if month.is_nan() {
        return 6;
    }
    month.clamp(6.0, 48.0) as u32
}

/// What the page shows for the current phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseReadout {
    pub phase: f32,
    pub sub_phase: TimelinePhase,
    pub month: u32,
}

impl PhaseReadout {
    pub fn for_phase(phase: f32) -> Self {
        Self {
            phase,
            sub_phase: TimelinePhase::from_phase(phase),
            month: month_for(phase),
        }
    }
}
