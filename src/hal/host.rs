//! Host (std) UDP transport.
//!
//! These run the protocol on any machine with a std network stack: the
//! desktop binary, and the ESP32 firmware, whose ESP-IDF port provides
//! `std::net`.
//!
//! # Example
//!
//! ```rust,no_run
//! use sr_control::hal::UdpTransport;
//! use sr_control::traits::{StaticLink, Transport};
//!
//! let link = StaticLink {
//!     address: "192.168.1.10".parse().unwrap(),
//!     ..Default::default()
//! };
//! let mut udp = UdpTransport::bind(4210, link).unwrap();
//! assert_eq!(udp.broadcast_address().to_string(), "192.168.1.255");
//! while let Some(datagram) = udp.poll_incoming() {
//!     println!("{} bytes from {}", datagram.payload.len(), datagram.from);
//! }
//! ```

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use log::{debug, warn};

use crate::traits::{resolve_broadcast, Datagram, Link, Transport, MAX_DATAGRAM};

// ============================================================================
// UDP Transport
// ============================================================================

/// Non-blocking UDP socket bound to the shared protocol port.
///
/// Addressing (local address, broadcast, connectivity) comes from the
/// [`Link`]. The std socket cannot report a datagram's destination, so
/// received datagrams carry `to: None`.
pub struct UdpTransport<L> {
    socket: UdpSocket,
    port: u16,
    link: L,
}

impl<L: Link> UdpTransport<L> {
    /// Bind `0.0.0.0:port` with broadcast enabled.
    pub fn bind(port: u16, link: L) -> io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;
        debug!("udp bound on port {}", port);
        Ok(Self { socket, port, link })
    }

    /// Protocol port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Interface addressing.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Mutable interface addressing.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}

impl<L: Link> Transport for UdpTransport<L> {
    type Error = io::Error;

    fn local_address(&self) -> Ipv4Addr {
        self.link
            .station()
            .or_else(|| self.link.access_point())
            .map(|(ip, _)| ip)
            .unwrap_or(Ipv4Addr::UNSPECIFIED)
    }

    fn broadcast_address(&self) -> Ipv4Addr {
        resolve_broadcast(&self.link)
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    fn send(&mut self, to: Ipv4Addr, payload: &[u8]) -> io::Result<()> {
        self.socket
            .send_to(payload, SocketAddrV4::new(to, self.port))
            .map(|_| ())
    }

    fn poll_incoming(&mut self) -> Option<Datagram> {
        let mut buf = [0u8; MAX_DATAGRAM];
        match self.socket.recv_from(&mut buf) {
            Ok((len, SocketAddr::V4(from))) => Datagram::new(&buf[..len], *from.ip(), None),
            Ok((_, SocketAddr::V6(from))) => {
                debug!("ignoring IPv6 datagram from {}", from);
                None
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("udp receive failed: {}", e);
                None
            }
        }
    }
}
