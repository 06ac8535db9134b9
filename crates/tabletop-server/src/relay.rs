//! Per-table fan-out of opaque frames.

use axum::extract::ws::Message;
use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Peers connected to one table.
struct TableRoom {
    /// Broadcast channel for this table
    tx: broadcast::Sender<(Uuid, Message)>,
    peers: HashSet<Uuid>,
    /// Last frame seen, replayed to late joiners
    last_frame: Option<Message>,
}

impl TableRoom {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
            last_frame: None,
        }
    }
}

/// What a peer gets on joining a table.
pub struct Joined {
    pub rx: broadcast::Receiver<(Uuid, Message)>,
    pub last_frame: Option<Message>,
    pub peer_count: usize,
}

/// Shared relay state
#[derive(Default)]
pub struct Relay {
    tables: DashMap<String, TableRoom>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to a table, creating the table if needed.
    pub fn join(&self, table: &str, peer: Uuid) -> Joined {
        let mut room = self.tables.entry(table.to_string()).or_insert_with(TableRoom::new);
        room.peers.insert(peer);
        Joined {
            rx: room.tx.subscribe(),
            last_frame: room.last_frame.clone(),
            peer_count: room.peers.len(),
        }
    }

    /// Remove a peer; the table goes away with its last peer.
    pub fn leave(&self, table: &str, peer: Uuid) {
        if let Some(mut room) = self.tables.get_mut(table) {
            room.peers.remove(&peer);
        }
        self.tables.remove_if(table, |_, room| room.peers.is_empty());
    }

    /// Remember `frame` and pass it to every other peer of the table.
    pub fn publish(&self, table: &str, from: Uuid, frame: Message) {
        if let Some(mut room) = self.tables.get_mut(table) {
            room.last_frame = Some(frame.clone());
            // No receivers is fine: the frame is kept for the next joiner.
            let _ = room.tx.send((from, frame));
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn peer_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |room| room.peers.len())
    }
}
