use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

/// Payload of one `disaster` event pushed to a subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterEvent {
    pub log_id: i64,
    pub identifier: String,
    pub raw_message: String,
}

/// Subscriber callback for one delivery.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckMessage {
    pub status: String,
    pub log_id: i64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    Ack,
    Nack(String),
    /// No callback arrived inside the deadline.
    Timeout,
    /// The subscriber has no live socket.
    NoSocket,
}

/// Delivery seam the emit engine drives; implemented by the session manager
/// and mocked in tests.
#[allow(async_fn_in_trait)]
pub trait AlertEmitter: Send + Sync {
    async fn emit(
        &self,
        subscriber_id: Uuid,
        event: DisasterEvent,
        ack_timeout: Duration,
    ) -> EmitOutcome;

    fn is_connected(&self, subscriber_id: Uuid) -> bool;
}

type PendingAcks = Arc<Mutex<HashMap<i64, oneshot::Sender<AckMessage>>>>;

struct Subscriber {
    conn_id: u64,
    outbound: mpsc::UnboundedSender<String>,
    pending: PendingAcks,
}

/// Keyed map `subscriber id → live socket`, at most one socket per
/// subscriber. Mutated only by the register/unregister pair; readers hold
/// the lock for the duration of the lookup only.
#[derive(Default)]
pub struct WsSessionManager {
    inner: Mutex<HashMap<Uuid, Subscriber>>,
    conn_counter: AtomicU64,
}

/// What `register` evicted, if anything.
pub struct Replaced {
    pub forced_disconnect: bool,
}

impl WsSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new socket for `subscriber_id`, forcibly displacing any
    /// prior one (its outbound channel closes, which shuts the old socket
    /// task down). Returns the connection id to pass back to `unregister`.
    pub fn register(
        &self,
        subscriber_id: Uuid,
        outbound: mpsc::UnboundedSender<String>,
        pending: PendingAcks,
    ) -> (u64, Replaced) {
        let conn_id = self.conn_counter.fetch_add(1, Ordering::Relaxed);
        let previous = self.inner.lock().unwrap().insert(
            subscriber_id,
            Subscriber {
                conn_id,
                outbound,
                pending,
            },
        );
        if previous.is_some() {
            warn!(%subscriber_id, "replacing live socket for subscriber");
        }
        (
            conn_id,
            Replaced {
                forced_disconnect: previous.is_some(),
            },
        )
    }

    /// Drop the mapping — but only if `conn_id` still owns it. A socket
    /// that was displaced by a newer one must not remove its replacement.
    pub fn unregister(&self, subscriber_id: Uuid, conn_id: u64) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.get(&subscriber_id) {
            Some(current) if current.conn_id == conn_id => {
                inner.remove(&subscriber_id);
                true
            }
            _ => false,
        }
    }

    /// Route a subscriber callback to the delivery waiting on it.
    pub fn complete_ack(&self, subscriber_id: Uuid, ack: AckMessage) {
        let pending = {
            let inner = self.inner.lock().unwrap();
            match inner.get(&subscriber_id) {
                Some(subscriber) => Arc::clone(&subscriber.pending),
                None => return,
            }
        };
        let sender = pending.lock().unwrap().remove(&ack.log_id);
        match sender {
            Some(sender) => {
                let _ = sender.send(ack);
            }
            None => debug!(%subscriber_id, log_id = ack.log_id, "callback for unknown delivery"),
        }
    }
}

impl AlertEmitter for Arc<WsSessionManager> {
    async fn emit(
        &self,
        subscriber_id: Uuid,
        event: DisasterEvent,
        ack_timeout: Duration,
    ) -> EmitOutcome {
        let (tx, rx) = oneshot::channel();
        let (outbound, pending) = {
            let inner = self.inner.lock().unwrap();
            let Some(subscriber) = inner.get(&subscriber_id) else {
                return EmitOutcome::NoSocket;
            };
            (subscriber.outbound.clone(), Arc::clone(&subscriber.pending))
        };
        pending.lock().unwrap().insert(event.log_id, tx);

        let frame = serde_json::json!({ "event": "disaster", "payload": &event }).to_string();
        if outbound.send(frame).is_err() {
            pending.lock().unwrap().remove(&event.log_id);
            return EmitOutcome::NoSocket;
        }

        // Callback and deadline race; whichever completes the channel first
        // wins, and the timer needs no explicit cancellation.
        match tokio::time::timeout(ack_timeout, rx).await {
            Ok(Ok(ack)) if ack.status == "ack" && ack.log_id == event.log_id => EmitOutcome::Ack,
            Ok(Ok(ack)) => EmitOutcome::Nack(ack.message.unwrap_or_else(|| ack.status.clone())),
            // Socket task dropped the sender: connection went away mid-wait.
            Ok(Err(_)) => EmitOutcome::Timeout,
            Err(_) => {
                pending.lock().unwrap().remove(&event.log_id);
                EmitOutcome::Timeout
            }
        }
    }

    fn is_connected(&self, subscriber_id: Uuid) -> bool {
        self.inner.lock().unwrap().contains_key(&subscriber_id)
    }
}
