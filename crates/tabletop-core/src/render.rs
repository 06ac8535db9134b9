//! Rendering abstraction.
//!
//! Drawing pixels is the front-end's job. This module decides what each
//! item should look like and hands that to a [`Renderer`] back-to-front.

use crate::images::ImageState;
use crate::item::{Item, ItemId};
use crate::table::Table;
use kurbo::{Affine, Rect, Size};

/// Which side of an item is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Up,
    Down,
    /// Face down, but shown to its owner because it lies in their area.
    /// Drawn face up with a face-down reminder.
    Peek,
}

/// Who claimed a player area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaOwner {
    Mine,
    Other,
}

/// Everything needed to draw one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemLook<'a> {
    pub id: ItemId,
    pub imgurl: &'a str,
    /// Bounds in table coordinates.
    pub bounds: Rect,
    pub face: Face,
    pub selected: bool,
    pub area: Option<AreaOwner>,
    pub locked: bool,
    /// False while the image loads; draw a placeholder box instead.
    pub image_loaded: bool,
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    pub table: &'a Table,
    /// Table-to-canvas transform.
    pub transform: Affine,
    /// Viewport size in pixels.
    pub viewport_size: Size,
    /// Draw the "not synced" frame around the viewport.
    pub unsynced: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            transform: table.view.transform(),
            viewport_size: table.viewport_size,
            unsynced: false,
        }
    }

    pub fn with_unsynced(mut self, unsynced: bool) -> Self {
        self.unsynced = unsynced;
        self
    }

    /// Looks of all items in draw order.
    pub fn items(&self) -> Vec<ItemLook<'a>> {
        let table = self.table;
        let store = &table.store;
        let my_areas: Vec<&Item> = store
            .all()
            .iter()
            .filter(|item| item.is_area_of(&table.player))
            .collect();

        store
            .all()
            .iter()
            .map(|item| {
                let face = if !item.face_down {
                    Face::Up
                } else if my_areas.iter().any(|area| store.is_contained_in(item, area)) {
                    Face::Peek
                } else {
                    Face::Down
                };
                let area = item.is_player_area.as_ref().map(|owner| {
                    if *owner == table.player {
                        AreaOwner::Mine
                    } else {
                        AreaOwner::Other
                    }
                });
                ItemLook {
                    id: item.id,
                    imgurl: &item.imgurl,
                    bounds: store.bounds_of(item),
                    face,
                    selected: table.is_selected(item.id),
                    area,
                    locked: item.locked,
                    image_loaded: matches!(
                        store.images.state(&item.imgurl),
                        Some(ImageState::Loaded(_))
                    ),
                }
            })
            .collect()
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Called once before any item of a frame.
    fn begin_frame(&mut self, _ctx: &RenderContext) {}

    /// Draw one item. `look.bounds` is in table coordinates; map it with
    /// `transform`.
    fn render_item(&mut self, look: &ItemLook, transform: Affine);

    /// Frame the viewport to show local changes nobody confirmed yet.
    fn render_unsynced_frame(&mut self, viewport: Size);

    fn end_frame(&mut self) {}
}

/// Draw a whole frame: items back to front, then the sync frame.
pub fn build_scene<R: Renderer + ?Sized>(renderer: &mut R, ctx: &RenderContext) {
    renderer.begin_frame(ctx);
    for look in ctx.items() {
        renderer.render_item(&look, ctx.transform);
    }
    if ctx.unsynced {
        renderer.render_unsynced_frame(ctx.viewport_size);
    }
    renderer.end_frame();
}
