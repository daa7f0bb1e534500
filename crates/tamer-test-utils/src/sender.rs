use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tamer_protocol::{Header, Packet, PacketSender, ProtocolError};
use tokio::sync::{Mutex, Notify};

/// Records every packet sent instead of writing it anywhere
#[derive(Debug, Default, Clone)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<Packet>>>,
    notify: Arc<Notify>,
    fail: Arc<AtomicBool>,
    delay_ms: Arc<AtomicU64>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent sends take `delay` before completing
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Packet> {
        self.sent.lock().await.clone()
    }

    pub async fn count(&self, header: Header) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|p| p.header == header)
            .count()
    }

    /// Wait until at least `n` packets have been sent
    pub async fn wait_for_sends(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            if self.sent.lock().await.len() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl PacketSender for RecordingSender {
    async fn send(&self, packet: Packet) -> Result<(), ProtocolError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProtocolError::Send("connection closed".to_string()));
        }
        self.sent.lock().await.push(packet);
        self.notify.notify_waiters();
        Ok(())
    }
}
