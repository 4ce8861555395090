//! Trait definitions for hardware, networking, and persistence.
//!
//! These are the seams between the relay/switch logic and the platform:
//!
//! - `hardware`: relay outputs, button inputs, clock, buzzer feedback
//! - `network`: UDP transport and broadcast address resolution
//! - `storage`: settings document persistence
//!
//! Mock implementations of every trait live in [`crate::hal::mock`].

pub mod hardware;
pub mod network;
pub mod storage;

pub use hardware::*;
pub use network::*;
pub use storage::*;
