//! The ordered item collection and its size-based draw order.

use crate::images::ImageRegistry;
use crate::item::{Item, ItemId, fresh_id};
use kurbo::{Point, Rect, Size};
use rand::Rng;

/// Weight of the x coordinate in the sort key, breaking ties between
/// same-size items.
const SORT_TIE_BREAK: f64 = 0.0001;

/// Owner of all live items.
///
/// Items are kept in draw order, back to front: larger items first, and
/// among equally sized items the one further left first. Any code that
/// holds an id must re-resolve it through the store after a sync replaced
/// the collection.
#[derive(Debug, Clone)]
pub struct ItemStore {
    items: Vec<Item>,
    /// Natural sizes of the images items refer to.
    pub images: ImageRegistry,
    /// Natural size used while an image is not loaded.
    fallback_size: Size,
}

impl ItemStore {
    pub fn new(fallback_size: Size) -> Self {
        Self {
            items: Vec::new(),
            images: ImageRegistry::new(),
            fallback_size,
        }
    }

    /// Add a new item under a fresh id and return that id.
    pub fn add<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        imgurl: &str,
        center: Point,
        scale: f64,
    ) -> ItemId {
        let id = fresh_id(rng, |id| self.contains(id));
        self.images.ensure(imgurl);
        self.items.push(Item::new(id, imgurl, center, scale));
        self.sort();
        id
    }

    /// Remove every item whose id is in `ids`.
    pub fn remove(&mut self, ids: &[ItemId]) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id));
        before - self.items.len()
    }

    /// Replace the whole collection, e.g. with a received sync state.
    pub fn replace(&mut self, items: Vec<Item>) {
        self.items = items;
        for item in &self.items {
            self.images.ensure(&item.imgurl);
        }
        self.sort();
    }

    pub fn by_id(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn by_id_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.by_id(id).is_some()
    }

    /// Items in draw order, back to front.
    pub fn all(&self) -> &[Item] {
        &self.items
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Displayed size: natural image size (or the fallback) times scale.
    pub fn size_of(&self, item: &Item) -> Size {
        let natural = self
            .images
            .natural_size(&item.imgurl)
            .unwrap_or(self.fallback_size);
        natural * item.scale
    }

    /// Size rounded to whole units, the compatibility key for piling.
    pub fn rounded_size(&self, item: &Item) -> Size {
        self.size_of(item).round()
    }

    /// Axis-aligned bounds around the item's center.
    pub fn bounds_of(&self, item: &Item) -> Rect {
        Rect::from_center_size(item.center, self.size_of(item))
    }

    /// Sort key: rounded area, nudged by x so equal sizes order left to right.
    pub fn size_measure(&self, item: &Item) -> f64 {
        let size = self.rounded_size(item);
        size.width * size.height - SORT_TIE_BREAK * item.center.x
    }

    /// Restore draw order. Needed after adds, replacements and scale or image
    /// size changes; plain translation keeps the order valid enough.
    pub fn sort(&mut self) {
        let mut keyed: Vec<(f64, Item)> = std::mem::take(&mut self.items)
            .into_iter()
            .map(|item| (self.size_measure(&item), item))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| b.total_cmp(a));
        self.items = keyed.into_iter().map(|(_, item)| item).collect();
    }

    /// Topmost item whose bounding box covers `point`.
    ///
    /// Only the rectangle is tested; transparent image regions still count.
    pub fn item_at(&self, point: Point) -> Option<&Item> {
        self.items
            .iter()
            .rev()
            .find(|item| self.covers(item, point))
    }

    /// Half-open box test: left and top edges inclusive.
    fn covers(&self, item: &Item, point: Point) -> bool {
        let size = self.size_of(item);
        let rel_x = point.x - item.center.x;
        let rel_y = point.y - item.center.y;
        rel_x >= -size.width / 2.0
            && rel_x < size.width / 2.0
            && rel_y >= -size.height / 2.0
            && rel_y < size.height / 2.0
    }

    /// Whether `inner` lies strictly inside `outer`.
    pub fn is_contained_in(&self, inner: &Item, outer: &Item) -> bool {
        let s0 = self.size_of(inner);
        let s1 = self.size_of(outer);
        let dx = inner.center.x - outer.center.x;
        let dy = inner.center.y - outer.center.y;
        let dw = s1.width - s0.width;
        let dh = s1.height - s0.height;
        dx > -dw / 2.0 && dx < dw / 2.0 && dy > -dh / 2.0 && dy < dh / 2.0
    }
}
