//! Non-blocking beep sequencing.
//!
//! [`BeepSequencer`] turns a [`Beep`] into on/off levels over time, so a
//! buzzer driver only has to call `update` once per tick and write the level
//! to its pin. Error patterns repeat `count` times with equal on and off
//! phases.
//!
//! ```text
//! Error(2), error_ms = 50
//!
//!   on  ___     ___
//!      |   |   |   |
//!   off     ---     ------
//!      0   50  100 150
//! ```

use log::info;

use crate::config::BuzzerConfig;
use crate::traits::{Beep, Feedback};

/// Time-driven beep pattern.
#[derive(Clone, Debug)]
pub struct BeepSequencer {
    config: BuzzerConfig,
    pending: Option<Beep>,
    remaining: u8,
    on: bool,
    phase_ms: u64,
    phase_end_ms: u64,
}

impl BeepSequencer {
    /// Idle sequencer.
    pub fn new(config: BuzzerConfig) -> Self {
        Self {
            config,
            pending: None,
            remaining: 0,
            on: false,
            phase_ms: 0,
            phase_end_ms: 0,
        }
    }

    /// Timing in use.
    pub fn config(&self) -> &BuzzerConfig {
        &self.config
    }

    /// Queue a pattern. It replaces the current one at the next update.
    pub fn start(&mut self, beep: Beep) {
        self.pending = Some(beep);
    }

    /// True while a pattern is playing or queued.
    pub fn is_active(&self) -> bool {
        self.pending.is_some() || self.remaining > 0
    }

    /// Advance to `now_ms`. Returns the level the buzzer should have.
    pub fn update(&mut self, now_ms: u64) -> bool {
        if let Some(beep) = self.pending.take() {
            let (count, duration) = match beep {
                Beep::Click => (1, self.config.click_ms),
                Beep::Error(n) => (n, self.config.error_ms),
            };
            if !self.config.enabled || count == 0 || duration == 0 {
                self.remaining = 0;
                self.on = false;
                return false;
            }
            self.remaining = count;
            self.on = true;
            self.phase_ms = u64::from(duration);
            self.phase_end_ms = now_ms + self.phase_ms;
            return true;
        }

        if self.remaining > 0 && now_ms >= self.phase_end_ms {
            if self.on {
                self.on = false;
                self.remaining -= 1;
            } else {
                self.on = true;
            }
            self.phase_end_ms = now_ms + self.phase_ms;
        }
        self.on && self.remaining > 0
    }
}

/// Feedback that only logs, for hosts without a buzzer.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn signal(&mut self, beep: Beep) {
        match beep {
            Beep::Click => info!("beep"),
            Beep::Error(n) => info!("error beep x{}", n),
        }
    }
}
