//! Network abstraction traits for the UDP control protocol.
//!
//! The controllers never open sockets themselves. They talk to a
//! [`Transport`], which is polled (check-then-read) once per tick and never
//! blocks.
//!
//! # Addressing
//!
//! ```text
//! discovery        switch -> broadcast   {"name":"any_relay","command":"respond"}
//! command          switch -> relay IP    {"name":"relay1","command":"switch"}
//! response         relay  -> sender IP   {"name":"relay1","descr":"..","for":"switch","resp":"on"}
//! ```
//!
//! The broadcast address is derived from the station IP and subnet mask, or
//! from the soft-AP network when the device is not connected as a client.
//! See [`resolve_broadcast`].

use core::net::Ipv4Addr;

/// Maximum datagram payload handled by the protocol.
pub const MAX_DATAGRAM: usize = 256;

/// Datagram payload buffer.
pub type Payload = heapless::Vec<u8, MAX_DATAGRAM>;

// ============================================================================
// Datagram
// ============================================================================

/// One received UDP datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram {
    /// Raw payload bytes.
    pub payload: Payload,
    /// Sender address. Replies go here.
    pub from: Ipv4Addr,
    /// Destination address, on platforms that report it.
    pub to: Option<Ipv4Addr>,
}

impl Datagram {
    /// Build a datagram from a byte slice.
    ///
    /// Returns `None` if the payload exceeds [`MAX_DATAGRAM`].
    pub fn new(payload: &[u8], from: Ipv4Addr, to: Option<Ipv4Addr>) -> Option<Self> {
        let payload = Payload::from_slice(payload).ok()?;
        Some(Self { payload, from, to })
    }
}

// ============================================================================
// Transport
// ============================================================================

/// UDP send/receive primitive shared by relay and switch devices.
///
/// All devices of one deployment use the same local port, so `send` only
/// needs the destination address.
pub trait Transport {
    /// Error type for send failures.
    type Error: core::fmt::Debug;

    /// This device's own address (used in diagnostic replies).
    fn local_address(&self) -> Ipv4Addr;

    /// Address that reaches every device on the local network.
    fn broadcast_address(&self) -> Ipv4Addr;

    /// Whether the device currently has network connectivity as a client.
    fn is_connected(&self) -> bool;

    /// Send one datagram to `to`.
    fn send(&mut self, to: Ipv4Addr, payload: &[u8]) -> Result<(), Self::Error>;

    /// Return the next pending datagram, if any. Never blocks.
    fn poll_incoming(&mut self) -> Option<Datagram>;
}

// ============================================================================
// Link
// ============================================================================

/// Interface addressing as reported by the WiFi stack.
pub trait Link {
    /// Whether the station interface is associated and has an address.
    fn is_connected(&self) -> bool;

    /// Station address and subnet mask.
    fn station(&self) -> Option<(Ipv4Addr, Ipv4Addr)>;

    /// Soft access point address and subnet mask, if the AP is running.
    fn access_point(&self) -> Option<(Ipv4Addr, Ipv4Addr)> {
        None
    }
}

/// Fixed addressing for hosts where the OS owns the network configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticLink {
    /// Local address; unspecified means "unknown".
    pub address: Ipv4Addr,
    /// Subnet mask.
    pub netmask: Ipv4Addr,
}

impl Default for StaticLink {
    fn default() -> Self {
        Self {
            address: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::new(255, 255, 255, 0),
        }
    }
}

impl Link for StaticLink {
    fn is_connected(&self) -> bool {
        true
    }

    fn station(&self) -> Option<(Ipv4Addr, Ipv4Addr)> {
        if self.address.is_unspecified() {
            None
        } else {
            Some((self.address, self.netmask))
        }
    }
}

/// Directed broadcast address of `ip` within `mask`.
#[inline]
pub fn directed_broadcast(ip: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(ip) | !u32::from(mask))
}

/// Subnet mask for a CIDR prefix length.
pub fn mask_from_prefix(prefix: u8) -> Ipv4Addr {
    let bits = match prefix {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - u32::from(p)),
    };
    Ipv4Addr::from(bits)
}

/// Broadcast address for discovery and group commands.
///
/// - connected station: `ip | !mask`
/// - soft AP only: AP broadcast (mask assumed `255.255.255.0` if the AP
///   reports none)
/// - neither: limited broadcast `255.255.255.255`
pub fn resolve_broadcast<L: Link + ?Sized>(link: &L) -> Ipv4Addr {
    if link.is_connected() {
        if let Some((ip, mask)) = link.station() {
            return directed_broadcast(ip, mask);
        }
    } else if let Some((ip, mask)) = link.access_point() {
        let mask = if mask.is_unspecified() {
            Ipv4Addr::new(255, 255, 255, 0)
        } else {
            mask
        };
        return directed_broadcast(ip, mask);
    }
    Ipv4Addr::BROADCAST
}
