use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, watch};

use crate::context::CallerId;
use crate::dispatch::SessionControl;

/// One session's outbound queue sender plus its kick signal.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<String>,
    kick: Arc<watch::Sender<Option<String>>>,
}

impl Connection {
    /// Returns the connection and the receiver the session loop watches.
    pub fn new(tx: mpsc::Sender<String>) -> (Self, watch::Receiver<Option<String>>) {
        let (kick_tx, kick_rx) = watch::channel(None);
        (Self { tx, kick: Arc::new(kick_tx) }, kick_rx)
    }

    pub fn kick(&self, message: &str) {
        self.kick.send_replace(Some(message.to_string()));
    }
}

#[derive(Clone)]
struct SessionEntry {
    conn: Connection,
    seq: u64,
}

/// Session registry: `caller -> Connection`, one live session per caller.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<CallerId, SessionEntry>,
    seq: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Register a session and return its sequence number. A previous session
    /// of the same caller is returned so the caller can close it.
    pub fn insert(&self, caller: CallerId, conn: Connection) -> (u64, Option<Connection>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .sessions
            .insert(caller, SessionEntry { conn, seq })
            .map(|e| e.conn);
        (seq, previous)
    }

    /// Remove the session only if `seq` still identifies the live one.
    pub fn remove_session(&self, caller: &CallerId, seq: u64) -> Option<Connection> {
        self.sessions
            .remove_if(caller, |_, e| e.seq == seq)
            .map(|(_, e)| e.conn)
    }

    pub fn get(&self, caller: &CallerId) -> Option<Connection> {
        self.sessions.get(caller).map(|r| r.value().conn.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionControl for SessionRegistry {
    fn kick(&self, caller: &CallerId, message: &str) -> bool {
        match self.get(caller) {
            Some(conn) => {
                conn.kick(message);
                true
            }
            None => false,
        }
    }
}
