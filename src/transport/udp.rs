//! UDP transport built on [`tokio::net::UdpSocket`].

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use super::Transport;

/// A UDP socket, optionally connected to a single peer.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
}

impl UdpTransport {
    /// Bind a receiving socket to `addr`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while binding.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        debug!(local_addr = ?socket.local_addr().ok(), "bound udp socket");
        Ok(Self { socket, peer: None })
    }

    /// Bind an ephemeral socket and connect it to `peer`.
    ///
    /// Connecting filters inbound datagrams to those sent by `peer` and lets
    /// [`Transport::send`] omit the destination. Multicast group addresses
    /// are valid peers.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while binding or connecting.
    pub async fn connect(peer: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        Self::connect_from(local, peer).await
    }

    /// Bind to `local` and connect to `peer`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while binding or connecting.
    pub async fn connect_from(local: SocketAddr, peer: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        debug!(local_addr = ?socket.local_addr().ok(), %peer, "connected udp socket");
        Ok(Self {
            socket,
            peer: Some(peer),
        })
    }

    /// Join an IPv4 multicast group on `interface`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the operating system.
    pub fn join_multicast_v4(&self, group: Ipv4Addr, interface: Ipv4Addr) -> io::Result<()> {
        self.socket.join_multicast_v4(group, interface)?;
        debug!(%group, %interface, "joined multicast group");
        Ok(())
    }

    /// Local address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the operating system.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// Connected peer, if any.
    #[must_use]
    pub const fn peer(&self) -> Option<SocketAddr> { self.peer }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        if self.peer.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "udp transport has no peer",
            ));
        }
        let sent = self.socket.send(datagram).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", datagram.len()),
            ));
        }
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let (len, _) = self.socket.recv_from(buf).await?;
        Ok(len)
    }
}
