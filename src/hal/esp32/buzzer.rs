//! Piezo buzzer on a GPIO output.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use log::warn;

use crate::config::BuzzerConfig;
use crate::hal::BeepSequencer;
use crate::traits::{Beep, Feedback};

/// Active buzzer driven high while a beep plays.
///
/// Patterns advance in [`Feedback::update`], so the control loop never
/// blocks on a beep.
pub struct Esp32Buzzer {
    pin: PinDriver<'static, AnyOutputPin, Output>,
    sequencer: BeepSequencer,
    high: bool,
}

impl Esp32Buzzer {
    /// Take the pin and drive it low.
    pub fn new(pin: AnyOutputPin, config: BuzzerConfig) -> anyhow::Result<Self> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self {
            pin,
            sequencer: BeepSequencer::new(config),
            high: false,
        })
    }
}

impl Feedback for Esp32Buzzer {
    fn signal(&mut self, beep: Beep) {
        self.sequencer.start(beep);
    }

    fn update(&mut self, now_ms: u64) {
        let high = self.sequencer.update(now_ms);
        if high == self.high {
            return;
        }
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.high = high,
            Err(e) => warn!("buzzer write failed: {}", e),
        }
    }
}
