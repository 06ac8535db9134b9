//! Local, pile-aware selection.
//!
//! Selection is never synced. Only the top card of a pile can be picked on
//! its own; selecting or deselecting any lower card acts on the whole pile.

use crate::item::{Item, ItemId};
use crate::pile::{PileRules, Piles};
use crate::store::ItemStore;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ItemId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ids.iter().copied()
    }

    /// Select or deselect `id`, spreading to its pile when it is not the top.
    /// Locked and unknown items are left alone.
    pub fn set_selected(&mut self, store: &ItemStore, rules: PileRules, id: ItemId, value: bool) {
        let Some(item) = store.by_id(id) else {
            return;
        };
        if item.locked {
            return;
        }
        let piles = Piles::new(store, rules);
        let affected = if piles.is_non_top_member(item) {
            piles.whole_pile_ids(item)
        } else {
            vec![id]
        };
        for member in affected {
            if value {
                self.ids.insert(member);
            } else {
                self.ids.remove(&member);
            }
        }
    }

    pub fn toggle_selected(&mut self, store: &ItemStore, rules: PileRules, id: ItemId) {
        let value = !self.is_selected(id);
        self.set_selected(store, rules, id, value);
    }

    pub fn deselect_all(&mut self) {
        self.ids.clear();
    }

    /// Selected items in draw order.
    pub fn selected_items<'a>(&self, store: &'a ItemStore) -> Vec<&'a Item> {
        store
            .all()
            .iter()
            .filter(|item| self.is_selected(item.id))
            .collect()
    }

    /// Unselected items in draw order.
    pub fn unselected_items<'a>(&self, store: &'a ItemStore) -> Vec<&'a Item> {
        store
            .all()
            .iter()
            .filter(|item| !self.is_selected(item.id))
            .collect()
    }

    /// Selected ids in draw order.
    pub fn selected_ids(&self, store: &ItemStore) -> Vec<ItemId> {
        self.selected_items(store).into_iter().map(|item| item.id).collect()
    }

    /// Drop ids that vanished from the store or became locked.
    pub fn prune(&mut self, store: &ItemStore) {
        self.ids
            .retain(|&id| store.by_id(id).is_some_and(|item| !item.locked));
    }
}
