//! Session registry: the map from opaque session identifiers to their
//! writable transport handles.
//!
//! The registry knows nothing about seats or game rules; it exists so the
//! coordinating loop can send to one session or enumerate all of them.
//! Sends are best-effort: a session whose writer has gone away is
//! reconciled by its reader task's disconnect event, not here.

use log::{debug, info};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

/// A connected client past the handshake: its id and the channel feeding
/// its writer task. The session's inbound accumulation buffer lives in
/// its reader task and is never shared.
#[derive(Debug)]
pub struct Session {
    pub id: u32,
    outbound: UnboundedSender<Vec<u8>>,
}

impl Session {
    pub fn new(id: u32, outbound: UnboundedSender<Vec<u8>>) -> Self {
        Self { id, outbound }
    }

    /// Queues raw frame bytes for the writer task. Failures are swallowed;
    /// the transport-close event will clean this session up shortly.
    pub fn send(&self, bytes: Vec<u8>) {
        if self.outbound.send(bytes).is_err() {
            debug!("Session {} writer is gone, dropping outbound frame", self.id);
        }
    }
}

/// All live sessions, keyed by id.
pub struct SessionRegistry {
    sessions: HashMap<u32, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: u32, outbound: UnboundedSender<Vec<u8>>) {
        info!("Session {} registered", id);
        self.sessions.insert(id, Session::new(id, outbound));
    }

    /// Removes a session. Returns true if it was present.
    pub fn remove(&mut self, id: &u32) -> bool {
        if self.sessions.remove(id).is_some() {
            info!("Session {} removed", id);
            true
        } else {
            false
        }
    }

    /// Best-effort send of already-encoded frame bytes to one session.
    pub fn send_to(&self, id: u32, bytes: Vec<u8>) {
        if let Some(session) = self.sessions.get(&id) {
            session.send(bytes);
        }
    }

    /// Ids of every live session, for broadcast fan-out.
    pub fn session_ids(&self) -> Vec<u32> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
