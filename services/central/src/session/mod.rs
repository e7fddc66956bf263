//! Ownership of the single upstream TCP session.
//!
//! The driver task owns the socket and the state machine; everything else
//! holds a [`SessionHandle`] whose `send` silently refuses frames unless
//! the link is authenticated and active.

pub mod driver;

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::usecase::report_transmit::FrameSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    AwaitingChallenge,
    AwaitingAuthResult,
    Active,
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    state: LinkState,
    writer: Option<mpsc::UnboundedSender<Bytes>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: LinkState::Disconnected,
                writer: None,
            })),
        }
    }

    pub fn state(&self) -> LinkState {
        self.inner.lock().unwrap().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == LinkState::Active
    }

    /// Queue a frame for the link writer; no-op unless the link is active.
    pub fn send(&self, frame: Bytes) -> bool {
        let inner = self.inner.lock().unwrap();
        if inner.state != LinkState::Active {
            return false;
        }
        match &inner.writer {
            Some(writer) => writer.send(frame).is_ok(),
            None => false,
        }
    }

    pub(crate) fn set_state(&self, state: LinkState) {
        self.inner.lock().unwrap().state = state;
    }

    pub(crate) fn attach(&self, writer: mpsc::UnboundedSender<Bytes>) {
        self.inner.lock().unwrap().writer = Some(writer);
    }

    pub(crate) fn detach(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.writer = None;
        inner.state = LinkState::Disconnected;
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for SessionHandle {
    fn is_active(&self) -> bool {
        SessionHandle::is_active(self)
    }

    fn send(&self, frame: Bytes) -> bool {
        SessionHandle::send(self, frame)
    }
}
