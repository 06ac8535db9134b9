//! Tabletop Core Library
//!
//! Platform-agnostic item arrangement, interaction and sync for a shared
//! virtual tabletop.

pub mod config;
pub mod controller;
pub mod images;
pub mod input;
pub mod item;
pub mod pile;
pub mod render;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod store;
pub mod sync;
pub mod table;
pub mod transport;
pub mod view;

pub use config::{ConfigError, TableConfig};
pub use controller::{DragMode, InteractionController, Response, UiRequest};
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use item::{Item, ItemId, PlayerId};
pub use pile::{Direction, PileRules, Piles};
pub use render::{AreaOwner, Face, ItemLook, RenderContext, Renderer};
pub use selection::Selection;
pub use session::{Event, Session};
pub use store::ItemStore;
pub use sync::{SyncActivity, SyncClient, SyncError};
pub use table::Table;
pub use transport::{ConnectionState, PlatformWebSocket, Transport, TransportError, TransportEvent};
pub use view::ViewTransform;
