//! Table state and the operations that rearrange items.

use crate::config::TableConfig;
use crate::item::{ItemId, PlayerId};
use crate::pile::{PileRules, Piles};
use crate::selection::Selection;
use crate::store::ItemStore;
use crate::view::ViewTransform;
use kurbo::{Point, Size};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Runtime state of one client's table: the synced items plus everything
/// local to this client.
#[derive(Debug, Clone)]
pub struct Table {
    pub store: ItemStore,
    pub selection: Selection,
    pub view: ViewTransform,
    /// Canvas size in pixels.
    pub viewport_size: Size,
    /// Tag stamped on areas this client claims.
    pub player: PlayerId,
    pub config: TableConfig,
    rng: StdRng,
}

impl Table {
    /// Create a table with an entropy-seeded generator and a random player id.
    pub fn new(config: TableConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a table drawing ids, player tag and shuffles from `rng`.
    pub fn with_rng(config: TableConfig, mut rng: StdRng) -> Self {
        let player = PlayerId::random(&mut rng);
        let mut table = Self {
            store: ItemStore::new(config.fallback_size),
            selection: Selection::new(),
            view: ViewTransform::with_limits(config.min_zoom, config.max_zoom),
            viewport_size: Size::new(800.0, 600.0),
            player,
            config,
            rng,
        };
        table.view.center_on(Point::ZERO, table.viewport_size);
        table
    }

    pub fn pile_rules(&self) -> PileRules {
        PileRules {
            offset: self.config.pile_offset,
            tolerance: self.config.pile_tolerance,
            snap_tolerance: self.config.snap_tolerance,
        }
    }

    pub fn piles(&self) -> Piles<'_> {
        Piles::new(&self.store, self.pile_rules())
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Resize the canvas, keeping the centered table point in place.
    pub fn set_viewport_size(&mut self, size: Size) {
        self.view.resize(self.viewport_size, size);
        self.viewport_size = size;
    }

    // --- Selection ---

    pub fn set_selected(&mut self, id: ItemId, value: bool) {
        let rules = self.pile_rules();
        self.selection.set_selected(&self.store, rules, id, value);
    }

    pub fn toggle_selected(&mut self, id: ItemId) {
        let rules = self.pile_rules();
        self.selection.toggle_selected(&self.store, rules, id);
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selection.is_selected(id)
    }

    /// Selected ids in draw order.
    pub fn selected_ids(&self) -> Vec<ItemId> {
        self.selection.selected_ids(&self.store)
    }

    // --- Item operations ---

    /// Add an item at the table origin with unit scale.
    pub fn add_item(&mut self, imgurl: &str) -> ItemId {
        self.store.add(&mut self.rng, imgurl, Point::ZERO, 1.0)
    }

    /// Lock an unlocked item or unlock a locked one.
    ///
    /// Locking deselects first. Unlocking releases any player-area claim and
    /// selects the item.
    pub fn toggle_locked(&mut self, id: ItemId) {
        let Some(locked) = self.store.by_id(id).map(|item| item.locked) else {
            return;
        };
        if locked {
            if let Some(item) = self.store.by_id_mut(id) {
                item.locked = false;
                item.is_player_area = None;
            }
            self.set_selected(id, true);
        } else {
            self.set_selected(id, false);
            if let Some(item) = self.store.by_id_mut(id) {
                item.locked = true;
            }
        }
    }

    /// Claim the single selected item as this player's area.
    pub fn claim_player_area(&mut self) -> bool {
        let selected = self.selected_ids();
        let [id] = selected[..] else {
            return false;
        };
        self.set_selected(id, false);
        let player = self.player.clone();
        match self.store.by_id_mut(id) {
            Some(item) => {
                item.locked = true;
                item.is_player_area = Some(player);
                true
            }
            None => false,
        }
    }

    /// Clone every selected item by a fixed offset and move the selection to
    /// the clones.
    pub fn clone_selected(&mut self) -> Vec<ItemId> {
        let originals: Vec<(String, Point, f64)> = self
            .selection
            .selected_items(&self.store)
            .into_iter()
            .map(|item| (item.imgurl.clone(), item.center, item.scale))
            .collect();
        let offset = self.config.clone_offset;
        let mut clones = Vec::with_capacity(originals.len());
        for id in self.selected_ids() {
            self.set_selected(id, false);
        }
        for (imgurl, center, scale) in originals {
            clones.push(self.store.add(&mut self.rng, &imgurl, center + offset, scale));
        }
        for &id in &clones {
            self.set_selected(id, true);
        }
        clones
    }

    /// Remove every selected item.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selected_ids();
        self.selection.deselect_all();
        self.store.remove(&ids)
    }

    /// Turn the selection face up if all of it is face down, else face down.
    pub fn flip_selected(&mut self) {
        let ids = self.selected_ids();
        let all_face_down = ids
            .iter()
            .filter_map(|&id| self.store.by_id(id))
            .all(|item| item.face_down);
        for id in ids {
            if let Some(item) = self.store.by_id_mut(id) {
                item.face_down = !all_face_down;
            }
        }
    }

    /// Multiply the scale of every selected item.
    pub fn scale_selected(&mut self, factor: f64) {
        for id in self.selected_ids() {
            if let Some(item) = self.store.by_id_mut(id) {
                item.scale *= factor;
            }
        }
        self.store.sort();
    }

    /// Shuffle the selection into one pile.
    ///
    /// Every selected item must share one rounded size. The new pile starts
    /// where the largest selected pile started, or at the first selected item
    /// if none of the selection is a pile bottom. Returns whether anything
    /// was shuffled.
    pub fn shuffle_selected(&mut self) -> bool {
        let mut selected = self.selected_ids();
        let Some(&first) = selected.first() else {
            return false;
        };
        let (anchor, size) = {
            let piles = self.piles();
            let Some(first_item) = self.store.by_id(first) else {
                return false;
            };
            let size = self.store.rounded_size(first_item);
            let items: Vec<_> = selected.iter().filter_map(|&id| self.store.by_id(id)).collect();
            if items.iter().any(|item| self.store.rounded_size(item) != size) {
                log::debug!("shuffle skipped: selection mixes item sizes");
                return false;
            }
            let mut largest: Option<(usize, Point)> = None;
            for item in items.iter().copied().filter(|item| piles.is_bottom(item)) {
                let pile_len = piles.whole_pile(item).len();
                if largest.is_none_or(|(len, _)| pile_len > len) {
                    largest = Some((pile_len, item.center));
                }
            }
            let anchor = largest.map_or(first_item.center, |(_, center)| center);
            (anchor, size)
        };

        selected.shuffle(&mut self.rng);

        let step = size.width * self.config.pile_offset;
        for (index, id) in selected.iter().enumerate() {
            if let Some(item) = self.store.by_id_mut(*id) {
                item.center = Point::new(anchor.x + step * index as f64, anchor.y);
            }
        }
        self.selection.deselect_all();
        self.store.sort();
        true
    }

    /// Record a loaded image and restore draw order.
    pub fn image_loaded(&mut self, url: &str, natural: Size) {
        self.store.images.mark_loaded(url, natural);
        self.store.sort();
    }
}
