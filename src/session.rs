use tracing::info;

use crate::config::SessionConfig;

// ============================================================================
// Phase
// ============================================================================

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Phase {
    Work,
    Rest,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Work => "Focus time",
            Self::Rest => "Rest time",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Work => "🍅💪",
            Self::Rest => "🍅☕",
        }
    }
}

/// What happened when a phase ran out.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Transition {
    EnteredRest { cycle: u32 },
    EnteredWork { cycle: u32 },
    Completed,
}

// ============================================================================
// Session State Machine
// ============================================================================

/// Work/rest cycling over a fixed [`SessionConfig`].
///
/// `running` and `phase` are orthogonal; `complete` is terminal until
/// [`Session::reset`] or a fresh [`Session::start`]. A session that is
/// neither running, paused nor complete is *idle*, and an idle session
/// always shows the full length of its current phase.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    phase: Phase,
    cycle: u32,
    remaining: u32,
    running: bool,
    paused: bool,
    complete: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: Phase::Work,
            cycle: 1,
            remaining: config.work_seconds,
            running: false,
            paused: false,
            complete: false,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_idle(&self) -> bool {
        !self.running && !self.paused && !self.complete
    }

    pub fn phase_length(&self) -> u32 {
        match self.phase {
            Phase::Work => self.config.work_seconds,
            Phase::Rest => self.config.rest_seconds,
        }
    }

    /// Fraction of the current phase already elapsed, 0.0..=1.0.
    pub fn progress_ratio(&self) -> f64 {
        let total = self.phase_length() as f64;
        if total == 0.0 {
            return 0.0;
        }
        (1.0 - self.remaining as f64 / total).clamp(0.0, 1.0)
    }

    /// Applies a freshly committed configuration. Idle sessions snap their
    /// countdown to the new phase length; running or paused ones keep it.
    pub fn reconfigure(&mut self, config: SessionConfig) {
        self.config = config;
        // Shrinking the cycle count below the current index keeps it in range.
        self.cycle = self.cycle.min(config.total_cycles);
        self.sync_idle();
    }

    /// Returns false when already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        if self.complete {
            self.reset();
        }
        self.running = true;
        self.paused = false;
        info!(phase = ?self.phase, cycle = self.cycle, remaining = self.remaining, "session started");
        true
    }

    /// Freezes the countdown in place. Returns false when not running.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.paused = true;
        info!(phase = ?self.phase, remaining = self.remaining, "session paused");
        true
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Work;
        self.cycle = 1;
        self.running = false;
        self.paused = false;
        self.complete = false;
        self.remaining = self.config.work_seconds;
        info!(remaining = self.remaining, "session reset");
    }

    /// One-second decrement. The zero check happens in the same call, so
    /// a running session never exposes a zero countdown without having
    /// transitioned.
    pub fn tick(&mut self) -> Option<Transition> {
        if !self.running || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            Some(self.complete_phase())
        } else {
            None
        }
    }

    fn complete_phase(&mut self) -> Transition {
        match self.phase {
            Phase::Work => {
                self.phase = Phase::Rest;
                self.remaining = self.config.rest_seconds;
                info!(cycle = self.cycle, "entering rest");
                Transition::EnteredRest { cycle: self.cycle }
            }
            Phase::Rest if self.cycle < self.config.total_cycles => {
                self.cycle += 1;
                self.phase = Phase::Work;
                self.remaining = self.config.work_seconds;
                info!(cycle = self.cycle, "entering work");
                Transition::EnteredWork { cycle: self.cycle }
            }
            Phase::Rest => {
                self.running = false;
                self.complete = true;
                info!(cycles = self.config.total_cycles, "session complete");
                Transition::Completed
            }
        }
    }

    fn sync_idle(&mut self) {
        if self.is_idle() {
            self.remaining = self.phase_length();
        }
    }
}
