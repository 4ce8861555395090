//! Monotonic clock backed by the ESP-IDF high resolution timer.

use crate::traits::Clock;

/// Milliseconds since boot.
///
/// ```ignore
/// use sr_control::hal::esp32::Esp32Clock;
/// use sr_control::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// relays.tick(clock.now_ms());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Clock handle. All handles read the same timer.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // microseconds since boot, never negative
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}
