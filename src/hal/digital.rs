//! Adapters from `embedded-hal` 1.0 digital pins.
//!
//! Any HAL that implements `embedded_hal::digital` (ESP-IDF, rp2040, stm32,
//! linux-embedded-hal, ...) can drive relays and read buttons through these.

use embedded_hal::digital::{InputPin, StatefulOutputPin};
use log::warn;

use crate::traits::{ButtonInput, RelayOutput};

/// Relay output on a push-pull pin.
///
/// After every write the level is read back from the pin's output register
/// and kept for `is_set_high`. A failed read-back keeps the written level.
pub struct OutputPinRelay<P> {
    pin: P,
    high: bool,
}

impl<P: StatefulOutputPin> OutputPinRelay<P> {
    /// Wrap a pin. The level is unknown until the first write, which the
    /// relay controller does when the relay is added.
    pub fn new(pin: P) -> Self {
        Self { pin, high: false }
    }

    /// Release the pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> RelayOutput for OutputPinRelay<P> {
    type Error = P::Error;

    fn set_level(&mut self, high: bool) -> Result<(), P::Error> {
        if high {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.high = self.pin.is_set_high().unwrap_or_else(|e| {
            warn!("relay read-back failed: {:?}", e);
            high
        });
        Ok(())
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Button on an input pin.
///
/// A failed read counts as low.
pub struct InputPinButton<P> {
    pin: P,
}

impl<P: InputPin> InputPinButton<P> {
    /// Wrap a pin. Pull resistors are configured by the HAL.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Release the pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> ButtonInput for InputPinButton<P> {
    fn is_high(&mut self) -> bool {
        self.pin.is_high().unwrap_or_else(|e| {
            warn!("button read failed: {:?}", e);
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

    use super::*;

    #[derive(Default)]
    struct Pin {
        high: bool,
        writes: usize,
        stuck_low: bool,
    }

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = !self.stuck_low;
            self.writes += 1;
            Ok(())
        }
    }

    impl StatefulOutputPin for Pin {
        fn is_set_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_set_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    impl InputPin for Pin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    #[test]
    fn output_tracks_level() {
        let mut relay = OutputPinRelay::new(Pin::default());
        relay.set_level(true).unwrap();
        assert!(relay.is_set_high());
        relay.set_level(false).unwrap();
        assert!(!relay.is_set_high());
        assert_eq!(relay.into_inner().writes, 2);
    }

    #[test]
    fn output_reports_pin_level_not_request() {
        let mut relay = OutputPinRelay::new(Pin {
            stuck_low: true,
            ..Pin::default()
        });
        relay.set_level(true).unwrap();
        assert!(!relay.is_set_high());
    }

    #[test]
    fn input_reads_pin() {
        let mut button = InputPinButton::new(Pin {
            high: true,
            ..Pin::default()
        });
        assert!(ButtonInput::is_high(&mut button));
    }
}
