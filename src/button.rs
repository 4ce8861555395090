//! Debounced push-button state machine with click classification.
//!
//! Each poll returns exactly one [`ButtonEvent`]. The machine is a pure
//! function of the raw contact reading and the millisecond timestamp passed
//! in, so it can be driven from tests without hardware.
//!
//! # Events
//!
//! | Event | Meaning |
//! |-------|---------|
//! | `Released` | Contacts open, nothing new |
//! | `Pressed` | Contacts closed, nothing new |
//! | `Down` | Press edge (first click of a possible double-click) |
//! | `Up` | Release edge |
//! | `DoubleClick` | Second press inside the double-click window |
//! | `LongClick` | Held past the long-click timeout (see [`LongClickMode`]) |
//! | `OneClick` | Single click confirmed after the window (opt-in) |
//!
//! # Example
//!
//! ```rust
//! use sr_control::button::{ButtonConfig, ButtonEvent, ButtonState};
//!
//! let mut state = ButtonState::new(ButtonConfig::default());
//! assert_eq!(state.update(true, 0), ButtonEvent::Down);
//! assert_eq!(state.update(true, 10), ButtonEvent::Pressed);
//! assert_eq!(state.update(false, 60), ButtonEvent::Up);
//! assert_eq!(state.update(true, 120), ButtonEvent::DoubleClick);
//! ```

use crate::traits::ButtonInput;

// ============================================================================
// Configuration
// ============================================================================

/// Classified button state returned by every poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ButtonEvent {
    /// Contacts open.
    #[default]
    Released,
    /// Contacts closed.
    Pressed,
    /// Press edge.
    Down,
    /// Release edge.
    Up,
    /// Single click confirmed after the double-click window elapsed.
    OneClick,
    /// Second press inside the double-click window.
    DoubleClick,
    /// Held beyond the long-click timeout.
    LongClick,
}

/// Behaviour after the first `LongClick` while the button stays held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "snake_case"))]
pub enum LongClickMode {
    /// One `LongClick`, then `Pressed` until release.
    #[default]
    OnlyOnce,
    /// Repeat `LongClick` every series interval.
    ClickSeries,
    /// `LongClick` on every poll until release.
    Continued,
}

/// Pull resistor wiring of the button pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "snake_case"))]
pub enum InputType {
    /// Pin pulled up; a closed contact reads low.
    #[default]
    PullUp,
    /// Pin pulled down; a closed contact reads high.
    PullDown,
}

/// Mechanical contact type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "snake_case"))]
pub enum ContactType {
    /// Contacts close when pressed.
    #[default]
    NormallyOpen,
    /// Contacts open when pressed.
    NormallyClosed,
}

/// Timing parameters of the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonConfig {
    /// Debounce window; 0 disables debouncing.
    pub debounce_ms: u32,
    /// Hold time before the first `LongClick`.
    pub long_click_ms: u32,
    /// Window for a second press to count as a double-click.
    pub double_click_ms: u32,
    /// Repeat interval in [`LongClickMode::ClickSeries`].
    pub series_interval_ms: u32,
    /// Behaviour while held after the first `LongClick`.
    pub long_click_mode: LongClickMode,
    /// Report `OneClick` once a single click is confirmed.
    pub virtual_click: bool,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 0,
            long_click_ms: 500,
            double_click_ms: 300,
            series_interval_ms: 100,
            long_click_mode: LongClickMode::OnlyOnce,
            virtual_click: false,
        }
    }
}

impl ButtonConfig {
    /// Set the debounce window.
    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the long-click timeout.
    pub fn with_long_click_ms(mut self, ms: u32) -> Self {
        self.long_click_ms = ms;
        self
    }

    /// Set the double-click window.
    pub fn with_double_click_ms(mut self, ms: u32) -> Self {
        self.double_click_ms = ms;
        self
    }

    /// Set the click-series interval.
    pub fn with_series_interval_ms(mut self, ms: u32) -> Self {
        self.series_interval_ms = ms;
        self
    }

    /// Set the long-click mode.
    ///
    /// `ClickSeries` with a zero interval falls back to 100 ms.
    pub fn with_long_click_mode(mut self, mode: LongClickMode) -> Self {
        self.long_click_mode = mode;
        if mode == LongClickMode::ClickSeries && self.series_interval_ms == 0 {
            self.series_interval_ms = 100;
        }
        self
    }

    /// Enable or disable `OneClick` reporting.
    pub fn with_virtual_click(mut self, enabled: bool) -> Self {
        self.virtual_click = enabled;
        self
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Debounce and click classification for one button.
///
/// Feed it the logical contact state (`true` = closed) on every poll.
#[derive(Clone, Debug)]
pub struct ButtonState {
    config: ButtonConfig,
    state: ButtonEvent,
    /// Last accepted contact state.
    closed: bool,
    debouncing: bool,
    one_click: bool,
    long_click: bool,
    /// Last accepted transition, or last series tick.
    timer_ms: u64,
    /// Start of the double-click window.
    double_click_ms: u64,
}

impl ButtonState {
    /// Create a machine in the released state.
    pub fn new(config: ButtonConfig) -> Self {
        Self {
            config,
            state: ButtonEvent::Released,
            closed: false,
            debouncing: false,
            one_click: false,
            long_click: false,
            timer_ms: 0,
            double_click_ms: 0,
        }
    }

    /// Timing parameters.
    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }

    /// Replace the timing parameters. Pending flags are kept.
    pub fn set_config(&mut self, config: ButtonConfig) {
        self.config = config;
    }

    /// Last event returned by [`update`](Self::update).
    pub fn last_event(&self) -> ButtonEvent {
        self.state
    }

    /// Last accepted (debounced) contact state.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drop pending click flags and fall back to `Pressed`/`Released`.
    pub fn reset(&mut self) {
        self.one_click = false;
        self.long_click = false;
        self.state = self.stable_event();
    }

    /// Advance the machine with a contact reading taken at `now_ms`.
    pub fn update(&mut self, closed: bool, now_ms: u64) -> ButtonEvent {
        let debounce = u64::from(self.config.debounce_ms);

        if debounce > 0 && self.debouncing && elapsed(now_ms, self.timer_ms) < debounce {
            return self.state;
        }

        if closed == self.closed {
            if self.debouncing {
                // bounced back to the accepted level
                self.debouncing = false;
                self.state = self.stable_event();
            } else if !closed {
                self.update_open(now_ms);
            } else {
                self.update_held(now_ms);
            }
        } else if debounce > 0 {
            if !self.debouncing {
                self.timer_ms = now_ms;
                self.debouncing = true;
                let keep = self.state == ButtonEvent::LongClick
                    && self.config.long_click_mode == LongClickMode::Continued;
                if !keep {
                    self.state = self.stable_event();
                }
            } else {
                self.timer_ms = now_ms;
                self.accept_edge(closed, now_ms);
            }
        } else {
            self.timer_ms = now_ms;
            self.accept_edge(closed, now_ms);
        }

        self.state
    }

    fn stable_event(&self) -> ButtonEvent {
        if self.closed {
            ButtonEvent::Pressed
        } else {
            ButtonEvent::Released
        }
    }

    fn update_open(&mut self, now_ms: u64) {
        self.state = ButtonEvent::Released;
        if elapsed(now_ms, self.double_click_ms) > u64::from(self.config.double_click_ms) {
            if self.config.virtual_click && self.one_click {
                self.state = ButtonEvent::OneClick;
            }
            self.one_click = false;
            self.long_click = false;
        }
    }

    fn update_held(&mut self, now_ms: u64) {
        let held = elapsed(now_ms, self.timer_ms);
        if held < u64::from(self.config.long_click_ms) && !self.long_click {
            self.state = ButtonEvent::Pressed;
            return;
        }

        if !self.long_click {
            if self.config.long_click_mode == LongClickMode::ClickSeries {
                self.timer_ms = now_ms;
            }
            self.long_click = true;
            self.state = ButtonEvent::LongClick;
        } else {
            self.state = match self.config.long_click_mode {
                LongClickMode::OnlyOnce => ButtonEvent::Pressed,
                LongClickMode::ClickSeries => {
                    if held >= u64::from(self.config.series_interval_ms) {
                        self.timer_ms = now_ms;
                        ButtonEvent::LongClick
                    } else {
                        ButtonEvent::Pressed
                    }
                }
                LongClickMode::Continued => ButtonEvent::LongClick,
            };
        }
        self.one_click = false;
    }

    fn accept_edge(&mut self, closed: bool, now_ms: u64) {
        self.debouncing = false;
        self.closed = closed;

        if !closed {
            self.state = ButtonEvent::Up;
            return;
        }

        let in_window =
            elapsed(now_ms, self.double_click_ms) <= u64::from(self.config.double_click_ms);
        if self.one_click && in_window {
            self.state = ButtonEvent::DoubleClick;
            self.one_click = false;
        } else {
            self.state = ButtonEvent::Down;
            self.one_click = true;
            self.double_click_ms = now_ms;
        }
        // a new hold times its own long click
        self.long_click = false;
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        Self::new(ButtonConfig::default())
    }
}

#[inline]
fn elapsed(now_ms: u64, since_ms: u64) -> u64 {
    now_ms.saturating_sub(since_ms)
}

// ============================================================================
// Button (pin + state machine)
// ============================================================================

/// A button pin with its wiring and state machine.
///
/// # Example
///
/// ```rust
/// use sr_control::button::{Button, ButtonConfig, ButtonEvent, ContactType, InputType};
/// use sr_control::hal::MockButton;
///
/// // pull-up, normally open: pressing pulls the pin low
/// let mut button = Button::new(MockButton::new(true), ButtonConfig::default());
/// assert_eq!(button.poll(0), ButtonEvent::Released);
///
/// button.input_mut().level = false;
/// assert_eq!(button.poll(5), ButtonEvent::Down);
/// ```
#[derive(Debug)]
pub struct Button<I> {
    input: I,
    input_type: InputType,
    contact: ContactType,
    state: ButtonState,
}

impl<I: ButtonInput> Button<I> {
    /// Pull-up, normally-open button.
    pub fn new(input: I, config: ButtonConfig) -> Self {
        Self::with_wiring(input, InputType::PullUp, ContactType::NormallyOpen, config)
    }

    /// Button with explicit wiring.
    pub fn with_wiring(
        input: I,
        input_type: InputType,
        contact: ContactType,
        config: ButtonConfig,
    ) -> Self {
        Self {
            input,
            input_type,
            contact,
            state: ButtonState::new(config),
        }
    }

    /// Read the pin and classify.
    pub fn poll(&mut self, now_ms: u64) -> ButtonEvent {
        let closed = self.read_contacts();
        self.state.update(closed, now_ms)
    }

    /// Raw contact state with wiring inversions applied.
    pub fn read_contacts(&mut self) -> bool {
        let mut closed = self.input.is_high();
        if self.input_type == InputType::PullUp {
            closed = !closed;
        }
        if self.contact == ContactType::NormallyClosed {
            closed = !closed;
        }
        closed
    }

    /// Last classified event.
    pub fn last_event(&self) -> ButtonEvent {
        self.state.last_event()
    }

    /// Debounced contact state.
    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// See [`ButtonState::reset`].
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// The underlying state machine.
    pub fn state_mut(&mut self) -> &mut ButtonState {
        &mut self.state
    }

    /// The pin.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }
}

// ============================================================================
// Tests
// ============================================================================
