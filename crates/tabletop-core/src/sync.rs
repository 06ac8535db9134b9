//! Whole-table state sync.
//!
//! Every message is the complete item collection as a JSON array. The last
//! state received wins, except that positions of locally selected items are
//! kept while this client is dragging them.

use crate::item::{Item, ItemId, PlayerId, fresh_id};
use crate::table::Table;
use kurbo::Point;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("malformed sync payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("failed to encode table state: {0}")]
    Encode(serde_json::Error),
}

/// An item as received. Peers may omit the id and the boolean flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem {
    #[serde(default)]
    pub id: Option<ItemId>,
    pub imgurl: String,
    pub center: Point,
    pub scale: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub face_down: bool,
    #[serde(default)]
    pub is_player_area: Option<PlayerId>,
}

impl WireItem {
    fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            imgurl: self.imgurl,
            center: self.center,
            scale: self.scale,
            locked: self.locked,
            face_down: self.face_down,
            is_player_area: self.is_player_area,
        }
    }
}

/// Serialize the item collection for the wire.
pub fn encode_items(items: &[Item]) -> Result<String, SyncError> {
    serde_json::to_string(items).map_err(SyncError::Encode)
}

/// Parse a received payload. An empty payload is an empty table.
pub fn decode_items(payload: &str) -> Result<Vec<WireItem>, SyncError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(payload)?)
}

/// Which way the last sync message went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncActivity {
    Sent,
    Received,
}

/// Outbound encoding and inbound merge policy.
#[derive(Debug, Clone, Default)]
pub struct SyncClient {
    last_activity: Option<SyncActivity>,
}

impl SyncClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_activity(&self) -> Option<SyncActivity> {
        self.last_activity
    }

    /// Whether the table may differ from what the others last sent.
    pub fn is_unsynced(&self) -> bool {
        self.last_activity != Some(SyncActivity::Received)
    }

    /// Payload for the current table state. Selection and drag state stay local.
    pub fn outgoing(&mut self, table: &Table) -> Result<String, SyncError> {
        let payload = encode_items(table.store.all())?;
        self.last_activity = Some(SyncActivity::Sent);
        Ok(payload)
    }

    /// Replace the table with a received state.
    ///
    /// With `dragging_items` set, selected items keep their local position.
    /// Duplicate ids keep their last occurrence and missing ids get fresh
    /// ones. A malformed payload leaves the table untouched.
    pub fn apply_incoming(
        &mut self,
        table: &mut Table,
        payload: &str,
        dragging_items: bool,
    ) -> Result<usize, SyncError> {
        let mut incoming = decode_items(payload)?;
        self.last_activity = Some(SyncActivity::Received);

        if dragging_items {
            for wire in incoming.iter_mut() {
                let Some(id) = wire.id else { continue };
                if !table.is_selected(id) {
                    continue;
                }
                if let Some(local) = table.store.by_id(id) {
                    wire.center = local.center;
                }
            }
        }

        let mut items: Vec<Item> = Vec::with_capacity(incoming.len());
        let mut positions: HashMap<ItemId, usize> = HashMap::new();
        let mut unnamed = Vec::new();
        for wire in incoming {
            match wire.id {
                Some(id) => match positions.get(&id) {
                    Some(&index) => {
                        log::debug!("duplicate item id {} in sync payload", id);
                        items[index] = wire.into_item(id);
                    }
                    None => {
                        positions.insert(id, items.len());
                        items.push(wire.into_item(id));
                    }
                },
                None => unnamed.push(wire),
            }
        }

        let mut taken: HashSet<ItemId> = positions.into_keys().collect();
        for wire in unnamed {
            let id = fresh_id(table.rng(), |id| taken.contains(&id));
            taken.insert(id);
            items.push(wire.into_item(id));
        }

        let count = items.len();
        table.store.replace(items);
        table.selection.prune(&table.store);
        log::info!("applied table state with {} items", count);
        Ok(count)
    }
}
