//! Pile detection.
//!
//! A pile is never stored. It is a chain of unlocked items with the same
//! rounded size, each one shifted a quarter of the width to the right of the
//! previous one. Rounding the size lets piles survive float drift left over
//! from earlier drags and scaling. The right end of a chain is its top.

use crate::item::{Item, ItemId};
use crate::store::ItemStore;
use kurbo::Point;
use std::collections::HashSet;

/// Direction along a pile chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the bottom (left).
    Down,
    /// Towards the top (right).
    Up,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Down => -1.0,
            Direction::Up => 1.0,
        }
    }
}

/// Geometry rules that decide pile membership.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PileRules {
    /// Neighbour offset as a fraction of the rounded width.
    pub offset: f64,
    /// Relative tolerance when following a chain.
    pub tolerance: f64,
    /// Relative tolerance when a dropped item looks for a pile to land on.
    pub snap_tolerance: f64,
}

impl Default for PileRules {
    fn default() -> Self {
        Self {
            offset: 0.25,
            tolerance: 0.01,
            snap_tolerance: 0.25,
        }
    }
}

/// Read-only pile queries over a store.
#[derive(Debug, Clone, Copy)]
pub struct Piles<'a> {
    store: &'a ItemStore,
    rules: PileRules,
}

impl<'a> Piles<'a> {
    pub fn new(store: &'a ItemStore, rules: PileRules) -> Self {
        Self { store, rules }
    }

    /// Where a neighbour of `item` would sit in direction `dir`.
    pub fn expected_neighbour_position(&self, item: &Item, dir: Direction) -> Point {
        let size = self.store.rounded_size(item);
        Point::new(
            item.center.x + size.width * self.rules.offset * dir.sign(),
            item.center.y,
        )
    }

    /// The pile neighbour of `item` in direction `dir`.
    ///
    /// When several items qualify, the one closest to the expected position
    /// wins; exact ties keep draw order.
    pub fn find_neighbour(&self, item: &Item, dir: Direction, tolerance: f64) -> Option<&'a Item> {
        self.find_neighbour_excluding(item, dir, tolerance, None)
    }

    fn find_neighbour_excluding(
        &self,
        item: &Item,
        dir: Direction,
        tolerance: f64,
        excluded: Option<ItemId>,
    ) -> Option<&'a Item> {
        let size = self.store.rounded_size(item);
        let expected = self.expected_neighbour_position(item, dir);
        let store: &'a ItemStore = self.store;
        let mut best: Option<(f64, &'a Item)> = None;
        for other in store.all() {
            if other.id == item.id || Some(other.id) == excluded || other.locked {
                continue;
            }
            if self.store.rounded_size(other) != size {
                continue;
            }
            let dx = (other.center.x - expected.x).abs();
            let dy = (other.center.y - expected.y).abs();
            if dx >= size.width * tolerance || dy >= size.height * tolerance {
                continue;
            }
            let distance = other.center.distance(expected);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, other));
            }
        }
        best.map(|(_, other)| other)
    }

    /// Walk the chain from `item` in direction `dir`, visiting `item` first.
    pub fn traverse<F>(&self, item: &'a Item, dir: Direction, visit: F)
    where
        F: FnMut(&'a Item),
    {
        self.traverse_excluding(item, dir, None, visit);
    }

    fn traverse_excluding<F>(
        &self,
        item: &'a Item,
        dir: Direction,
        excluded: Option<ItemId>,
        mut visit: F,
    ) where
        F: FnMut(&'a Item),
    {
        // A chain never revisits an item; stop if loose rules make it try.
        let mut seen = HashSet::new();
        let mut current = Some(item);
        while let Some(node) = current {
            if !seen.insert(node.id) {
                log::warn!("pile chain loops back to item {}", node.id);
                break;
            }
            visit(node);
            current = self.find_neighbour_excluding(node, dir, self.rules.tolerance, excluded);
        }
    }

    fn end_of_pile(&self, item: &'a Item, dir: Direction, excluded: Option<ItemId>) -> &'a Item {
        let mut end = item;
        self.traverse_excluding(item, dir, excluded, |node| end = node);
        end
    }

    /// Topmost item of the pile containing `item`.
    pub fn top_of_pile(&self, item: &'a Item) -> &'a Item {
        self.end_of_pile(item, Direction::Up, None)
    }

    /// Bottommost item of the pile containing `item`.
    pub fn bottom_of_pile(&self, item: &'a Item) -> &'a Item {
        self.end_of_pile(item, Direction::Down, None)
    }

    /// All members of the pile containing `item`, bottom to top.
    pub fn whole_pile(&self, item: &'a Item) -> Vec<&'a Item> {
        let mut pile = Vec::new();
        self.traverse(self.bottom_of_pile(item), Direction::Up, |node| pile.push(node));
        pile
    }

    /// Ids of [`Piles::whole_pile`].
    pub fn whole_pile_ids(&self, item: &'a Item) -> Vec<ItemId> {
        self.whole_pile(item).into_iter().map(|node| node.id).collect()
    }

    /// True iff something lies on top of `item`.
    pub fn is_non_top_member(&self, item: &Item) -> bool {
        self.find_neighbour(item, Direction::Up, self.rules.tolerance).is_some()
    }

    /// True iff nothing lies below `item`.
    pub fn is_bottom(&self, item: &Item) -> bool {
        self.find_neighbour(item, Direction::Down, self.rules.tolerance).is_none()
    }

    /// Where `item` would land if dropped at its current position, if it
    /// lands on a pile at all. `item` itself is ignored while looking for
    /// the top of the target pile.
    pub fn snap_target(&self, item: &Item) -> Option<Point> {
        let found = self.find_neighbour(item, Direction::Down, self.rules.snap_tolerance)?;
        let top = self.end_of_pile(found, Direction::Up, Some(item.id));
        Some(self.expected_neighbour_position(top, Direction::Up))
    }
}

/// Put `id` on top of the pile it was dropped near. Returns whether it moved.
pub fn snap_onto_pile(store: &mut ItemStore, rules: PileRules, id: ItemId) -> bool {
    let target = {
        let piles = Piles::new(store, rules);
        store.by_id(id).and_then(|item| piles.snap_target(item))
    };
    match (target, store.by_id_mut(id)) {
        (Some(center), Some(item)) => {
            log::debug!("snapping item {} onto pile at {:?}", id, center);
            item.center = center;
            true
        }
        _ => false,
    }
}
