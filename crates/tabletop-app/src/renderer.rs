//! A renderer that describes frames in the log instead of drawing them.

use kurbo::{Affine, Size};
use tabletop_core::render::{Face, ItemLook, RenderContext, Renderer};

/// Counts of what one frame showed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSummary {
    pub items: usize,
    pub face_down: usize,
    pub peeked: usize,
    pub selected: usize,
    pub locked: usize,
    pub placeholders: usize,
    pub unsynced: bool,
}

#[derive(Debug, Default)]
pub struct LogRenderer {
    current: FrameSummary,
    last: Option<FrameSummary>,
    frames: u64,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of the last finished frame.
    pub fn last_frame(&self) -> Option<&FrameSummary> {
        self.last.as_ref()
    }
}

impl Renderer for LogRenderer {
    fn begin_frame(&mut self, _ctx: &RenderContext) {
        self.current = FrameSummary::default();
    }

    fn render_item(&mut self, look: &ItemLook, transform: Affine) {
        let summary = &mut self.current;
        summary.items += 1;
        match look.face {
            Face::Up => {}
            Face::Down => summary.face_down += 1,
            Face::Peek => summary.peeked += 1,
        }
        summary.selected += usize::from(look.selected);
        summary.locked += usize::from(look.locked);
        summary.placeholders += usize::from(!look.image_loaded);
        log::trace!(
            "item {} {} at {:?}",
            look.id,
            look.imgurl,
            transform.transform_rect_bbox(look.bounds)
        );
    }

    fn render_unsynced_frame(&mut self, _viewport: Size) {
        self.current.unsynced = true;
    }

    fn end_frame(&mut self) {
        self.frames += 1;
        let s = std::mem::take(&mut self.current);
        log::info!(
            "frame {}: {} items ({} face down, {} peeked, {} selected, {} locked, \
             {} placeholders){}",
            self.frames,
            s.items,
            s.face_down,
            s.peeked,
            s.selected,
            s.locked,
            s.placeholders,
            if s.unsynced { " [not synced]" } else { "" }
        );
        self.last = Some(s);
    }
}
