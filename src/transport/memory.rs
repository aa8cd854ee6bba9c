//! In-process datagram transport.
//!
//! [`MemoryTransport::pair`] returns two connected endpoints backed by
//! unbounded channels. A [`DropFilter`] on the sending side simulates loss,
//! which makes end-to-end behaviour under loss deterministic.

use std::{fmt, io, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use super::Transport;

/// Decides whether an outbound datagram is dropped. Returning `true` drops it.
pub type DropFilter = Arc<dyn Fn(&[u8]) -> bool + Send + Sync>;

/// One endpoint of an in-memory datagram link.
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    drop_filter: Option<DropFilter>,
}

impl MemoryTransport {
    /// Create two endpoints; datagrams sent on one arrive at the other.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(tx: mpsc::UnboundedSender<Vec<u8>>, rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            tx,
            rx: Mutex::new(rx),
            drop_filter: None,
        }
    }

    /// Drop outbound datagrams for which `filter` returns `true`.
    #[must_use]
    pub fn with_drop_filter(
        mut self,
        filter: impl Fn(&[u8]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.drop_filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport")
            .field(
                "drop_filter",
                &self.drop_filter.as_ref().map(|_| "Some(<filter>)"),
            )
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        if self.drop_filter.as_ref().is_some_and(|drop| drop(datagram)) {
            return Ok(());
        }
        // A vanished peer loses the datagram, as UDP would.
        let _ = self.tx.send(datagram.to_vec());
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut rx = self.rx.lock().await;
        let Some(datagram) = rx.recv().await else {
            // No sender can ever deliver again; wait like an idle socket.
            drop(rx);
            std::future::pending::<()>().await;
            return Ok(0);
        };
        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok(len)
    }
}
