//! Pointer and keyboard interaction.
//!
//! A small state machine turns normalized input events into table
//! operations. Every handler runs to completion and reports whether the
//! caller should repaint and whether the new state must be broadcast.

use crate::input::{ClickTracker, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::item::ItemId;
use crate::pile::snap_onto_pile;
use crate::shortcuts::{Action, ShortcutRegistry};
use crate::table::Table;
use kurbo::Point;

/// What an active drag moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// The selected items follow the pointer.
    Items,
    /// The view pans under the pointer.
    Table,
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    mode: DragMode,
    /// Whether any item actually moved, to tell a click from a drag.
    moved: bool,
}

/// Outcome of handling one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Response {
    pub repaint: bool,
    /// The item collection changed and must be sent to the other players.
    pub broadcast: bool,
}

impl Response {
    pub const NONE: Response = Response {
        repaint: false,
        broadcast: false,
    };

    pub const REPAINT: Response = Response {
        repaint: true,
        broadcast: false,
    };

    pub const BROADCAST: Response = Response {
        repaint: true,
        broadcast: true,
    };

    pub fn merge(self, other: Response) -> Response {
        Response {
            repaint: self.repaint || other.repaint,
            broadcast: self.broadcast || other.broadcast,
        }
    }
}

/// Requests only the front-end can fulfil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    ShowHelp,
    ToggleAddItemPrompt,
}

/// Translates input events into table operations.
#[derive(Debug, Default)]
pub struct InteractionController {
    drag: Option<DragSession>,
    /// Last pointer position in table coordinates.
    last_pointer: Option<Point>,
    /// Present when double clicks are synthesized from presses.
    clicks: Option<ClickTracker>,
    /// Position of a detected double click, handled on release.
    pending_double_click: Option<Point>,
    requests: Vec<UiRequest>,
}

impl InteractionController {
    /// Controller for front-ends that deliver double clicks themselves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller that detects double clicks from press timing.
    pub fn with_click_detection() -> Self {
        Self {
            clicks: Some(ClickTracker::new()),
            ..Self::default()
        }
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|drag| drag.mode)
    }

    /// Whether selected items are being dragged right now.
    pub fn is_dragging_items(&self) -> bool {
        self.drag_mode() == Some(DragMode::Items)
    }

    /// Drain UI requests raised by key bindings.
    pub fn take_ui_requests(&mut self) -> Vec<UiRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn handle_pointer(&mut self, table: &mut Table, event: &PointerEvent) -> Response {
        match *event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                modifiers,
            } => {
                let response = self.pointer_down(table, position, modifiers);
                if let Some(clicks) = self.clicks.as_mut() {
                    if clicks.register_press(position) {
                        self.pending_double_click = Some(position);
                    }
                }
                response
            }
            PointerEvent::Down { .. } => self.finish_drag(table),
            PointerEvent::Up { .. } => {
                let response = self.finish_drag(table);
                match self.pending_double_click.take() {
                    Some(position) => response.merge(self.double_click(table, position)),
                    None => response,
                }
            }
            PointerEvent::Move { position } => self.pointer_move(table, position),
            PointerEvent::Leave => {
                if let Some(clicks) = self.clicks.as_mut() {
                    clicks.reset();
                }
                self.pending_double_click = None;
                self.finish_drag(table)
            }
            PointerEvent::Wheel {
                position,
                delta_y,
                modifiers,
            } => self.wheel(table, position, delta_y, modifiers),
            PointerEvent::DoubleClick { position } => self.double_click(table, position),
        }
    }

    fn pointer_down(
        &mut self,
        table: &mut Table,
        position: Point,
        modifiers: Modifiers,
    ) -> Response {
        let pos = table.view.to_table(position);
        self.last_pointer = Some(pos);
        let hit: Option<ItemId> = table
            .store
            .item_at(pos)
            .filter(|item| !item.locked)
            .map(|item| item.id);

        match hit {
            None => {
                self.drag = Some(DragSession {
                    mode: DragMode::Table,
                    moved: false,
                });
                if !modifiers.group() {
                    table.selection.deselect_all();
                }
            }
            Some(id) if modifiers.group() => {
                self.drag = None;
                table.toggle_selected(id);
            }
            Some(id) => {
                if !table.is_selected(id) {
                    table.selection.deselect_all();
                    table.set_selected(id, true);
                }
                self.drag = Some(DragSession {
                    mode: DragMode::Items,
                    moved: false,
                });
            }
        }
        Response::REPAINT
    }

    fn pointer_move(&mut self, table: &mut Table, position: Point) -> Response {
        let pos = table.view.to_table(position);
        let mut response = Response::NONE;
        if let (Some(last), Some(drag)) = (self.last_pointer, self.drag.as_mut()) {
            let delta = pos - last;
            match drag.mode {
                DragMode::Items => {
                    let selected = table.selected_ids();
                    for &id in &selected {
                        if let Some(item) = table.store.by_id_mut(id) {
                            item.translate(delta);
                        }
                    }
                    if !selected.is_empty() {
                        drag.moved = true;
                    }
                }
                DragMode::Table => table.view.pan_by_table_delta(delta),
            }
            response = Response::REPAINT;
        }
        // The pan changed the transform, so map the pointer again.
        self.last_pointer = Some(table.view.to_table(position));
        response
    }

    /// End any active drag. A finished item drag tries to put a lone item
    /// onto a pile and always broadcasts.
    pub fn finish_drag(&mut self, table: &mut Table) -> Response {
        let Some(drag) = self.drag.take() else {
            return Response::NONE;
        };
        match drag.mode {
            DragMode::Items => {
                log::debug!("finishing item drag (moved: {})", drag.moved);
                if let [id] = table.selected_ids()[..] {
                    let rules = table.pile_rules();
                    if snap_onto_pile(&mut table.store, rules, id) {
                        log::debug!("item {} put on pile", id);
                    }
                }
                Response::BROADCAST
            }
            DragMode::Table => Response::NONE,
        }
    }

    fn wheel(
        &mut self,
        table: &mut Table,
        position: Point,
        delta_y: f64,
        modifiers: Modifiers,
    ) -> Response {
        let factor = table.config.wheel_factor(delta_y);
        if modifiers.group() {
            table.scale_selected(factor);
            Response::BROADCAST
        } else {
            let reference = table.view.to_table(position);
            table.view.zoom_about(reference, factor);
            Response::REPAINT
        }
    }

    fn double_click(&mut self, table: &mut Table, position: Point) -> Response {
        let pos = table.view.to_table(position);
        match table.store.item_at(pos).map(|item| item.id) {
            Some(id) => {
                table.toggle_locked(id);
                Response::BROADCAST
            }
            None => Response::NONE,
        }
    }

    /// Run the action bound to `event.key`, if any.
    pub fn handle_key(&mut self, table: &mut Table, event: &KeyEvent) -> Response {
        let Some(action) = ShortcutRegistry::lookup(&event.key) else {
            return Response::NONE;
        };
        self.run_action(table, action)
    }

    pub fn run_action(&mut self, table: &mut Table, action: Action) -> Response {
        match action {
            Action::CloneSelected => {
                table.clone_selected();
                Response::BROADCAST
            }
            Action::DeleteSelected => {
                table.delete_selected();
                Response::BROADCAST
            }
            Action::FlipSelected => {
                table.flip_selected();
                Response::BROADCAST
            }
            Action::ShuffleSelected => {
                if table.shuffle_selected() {
                    Response::BROADCAST
                } else {
                    Response::NONE
                }
            }
            Action::ClaimPlayerArea => {
                if table.claim_player_area() {
                    Response::BROADCAST
                } else {
                    Response::NONE
                }
            }
            Action::ToggleAddItemPrompt => {
                self.requests.push(UiRequest::ToggleAddItemPrompt);
                Response::NONE
            }
            Action::ShowHelp => {
                self.requests.push(UiRequest::ShowHelp);
                Response::NONE
            }
        }
    }

    /// Add an item from the add-item prompt.
    pub fn add_item(&mut self, table: &mut Table, imgurl: &str) -> Response {
        let id = table.add_item(imgurl);
        log::debug!("added item {} ({})", id, imgurl);
        Response::BROADCAST
    }
}
