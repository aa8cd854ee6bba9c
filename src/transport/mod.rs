//! Unreliable datagram transports.
//!
//! Everything above this module treats the network as a [`Transport`]: it
//! may drop, duplicate or reorder datagrams, and it never blocks a sender on
//! a slow receiver. [`UdpTransport`] is the production implementation;
//! [`MemoryTransport`] stands in for it in tests and simulations.

use std::{io, sync::Arc};

use async_trait::async_trait;

pub mod memory;
pub mod udp;

pub use memory::{DropFilter, MemoryTransport};
pub use udp::UdpTransport;

/// Largest datagram any transport will hand to a receiver.
pub const MAX_DATAGRAM_SIZE: usize = 65_535;

/// Abstraction over a datagram socket.
///
/// Implementations must be cancellation-safe: dropping a pending `recv()`
/// future must not lose a datagram that has not been returned.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one datagram to the configured peer.
    async fn send(&self, datagram: &[u8]) -> io::Result<()>;

    /// Receive one datagram into `buf`, returning its length. Datagrams
    /// longer than `buf` are truncated.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> { (**self).send(datagram).await }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> { (**self).recv(buf).await }
}

#[cfg(test)]
mod tests;
