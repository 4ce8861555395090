//! Hardware abstraction traits for relay outputs, button inputs, and feedback.
//!
//! These are the only points where the relay and switch controllers touch
//! hardware, so the whole protocol can run on desktop against mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RelayOutput`] | One digital output driving a relay coil |
//! | [`ButtonInput`] | Raw electrical level of a push button |
//! | [`Clock`] | Monotonic millisecond time source |
//! | [`Feedback`] | Buzzer or other audible feedback |
//!
//! # Example
//!
//! ```rust
//! use sr_control::traits::{ActiveLevel, RelayOutput};
//! use sr_control::hal::MockRelay;
//!
//! let mut relay = MockRelay::new();
//! relay.set_level(ActiveLevel::Low.level_for(true)).unwrap();
//! assert!(!relay.is_set_high());
//! ```

// ============================================================================
// Active Level
// ============================================================================

/// Logic level that switches a relay ON.
///
/// Many relay boards are active-low: pulling the input to ground closes the
/// contacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ActiveLevel {
    /// Relay is on when the pin is low.
    Low,
    /// Relay is on when the pin is high.
    #[default]
    High,
}

impl ActiveLevel {
    /// Pin level (`true` = high) that puts the relay into `on`.
    #[inline]
    pub const fn level_for(self, on: bool) -> bool {
        match self {
            ActiveLevel::High => on,
            ActiveLevel::Low => !on,
        }
    }

    /// Logical on/off state for a read-back pin level.
    #[inline]
    pub const fn is_on(self, high: bool) -> bool {
        self.level_for(high)
    }
}

// ============================================================================
// Relay Output
// ============================================================================

/// One digital output driving a relay.
///
/// Writes are synchronous. `is_set_high` reads back the last written level
/// and is the source of truth for the relay's ON/OFF state.
pub trait RelayOutput {
    /// Error type for output operations.
    type Error: core::fmt::Debug;

    /// Drive the pin high (`true`) or low (`false`).
    fn set_level(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Level currently driven on the pin.
    fn is_set_high(&self) -> bool;
}

// ============================================================================
// Button Input
// ============================================================================

/// Raw level of a button pin.
///
/// Pull-up and normally-closed inversion is handled by
/// [`Button`](crate::button::Button), not by implementors.
pub trait ButtonInput {
    /// Returns `true` if the pin currently reads high.
    fn is_high(&mut self) -> bool;
}

/// Input for relays and bindings that have no physical button.
///
/// Always reads low, so it is never polled into a press.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoButton;

impl ButtonInput for NoButton {
    #[inline]
    fn is_high(&mut self) -> bool {
        false
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Time source trait for `no_std` environments.
///
/// Provides monotonic milliseconds. Both debounce timing and the periodic
/// discovery timer compare against this value.
///
/// # Example
///
/// ```rust
/// use sr_control::traits::Clock;
/// use sr_control::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// clock.advance(30_000);
/// assert_eq!(clock.now_ms(), 30_000);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

// ============================================================================
// Feedback
// ============================================================================

/// Audible feedback pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Beep {
    /// Single short beep on a button press.
    Click,
    /// Error pattern repeated `count` times.
    Error(u8),
}

/// Buzzer or tone generator.
///
/// Purely advisory: implementations may drop signals, and nothing in the
/// controllers depends on the outcome.
pub trait Feedback {
    /// Start a beep pattern, replacing any pattern in progress.
    fn signal(&mut self, beep: Beep);

    /// Advance a non-blocking pattern. Called once per tick.
    fn update(&mut self, _now_ms: u64) {}
}
