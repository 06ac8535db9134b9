//! One client's session: table state, interaction, and the relay connection.
//!
//! Events are dispatched one at a time and each runs to completion, so no
//! handler ever observes another one half done.

use crate::config::TableConfig;
use crate::controller::{InteractionController, Response, UiRequest};
use crate::input::{KeyEvent, PointerEvent};
use crate::render::{RenderContext, Renderer, build_scene};
use crate::sync::SyncClient;
use crate::table::Table;
use crate::transport::{ConnectionState, Transport, TransportError, TransportEvent, endpoint_url};
use kurbo::Size;

/// Everything that can happen to a session.
#[derive(Debug, Clone)]
pub enum Event {
    Pointer(PointerEvent),
    Key(KeyEvent),
    /// The canvas changed size.
    Resize(Size),
    /// The front-end finished loading an image.
    ImageLoaded { url: String, size: Size },
    /// The add-item prompt was submitted.
    AddItem(String),
    Transport(TransportEvent),
}

pub struct Session<T: Transport> {
    pub table: Table,
    controller: InteractionController,
    sync: SyncClient,
    transport: T,
    /// Table name of the current connection.
    table_name: Option<String>,
    /// Whether the socket opened since the last `connect`.
    established: bool,
    /// Last transport error since the last `connect`.
    last_error: Option<String>,
    needs_repaint: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(config: TableConfig, transport: T) -> Self {
        Self::with_parts(Table::new(config), InteractionController::new(), transport)
    }

    pub fn with_parts(table: Table, controller: InteractionController, transport: T) -> Self {
        Self {
            table,
            controller,
            sync: SyncClient::new(),
            transport,
            table_name: None,
            established: false,
            last_error: None,
            needs_repaint: true,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sync(&self) -> &SyncClient {
        &self.sync
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    /// Whether the socket opened since the last [`Session::connect`]. Stays
    /// true after the connection closes again.
    pub fn was_established(&self) -> bool {
        self.established
    }

    /// The last transport error reported since the last [`Session::connect`].
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Connect to `table_name` on the configured relay, dropping any
    /// existing connection first.
    pub fn connect(&mut self, table_name: &str) -> Result<(), TransportError> {
        if self.transport.state() != ConnectionState::Disconnected {
            self.disconnect();
        }
        let config = &self.table.config;
        let url = endpoint_url(&config.relay_base, &config.endpoint_prefix, table_name)?;
        log::info!("connecting to table '{}' at {}", table_name, url);
        self.transport.connect(&url)?;
        self.table_name = Some(table_name.to_string());
        self.established = false;
        self.last_error = None;
        Ok(())
    }

    /// The single disconnect path for user requests, closes and errors.
    pub fn disconnect(&mut self) {
        self.transport.disconnect();
        if let Some(name) = self.table_name.take() {
            log::info!("disconnected from table '{}'", name);
        }
        self.needs_repaint = true;
    }

    /// Drain the transport and dispatch what arrived. Returns the number of
    /// transport events handled.
    pub fn poll(&mut self) -> usize {
        let events = self.transport.poll_events();
        let count = events.len();
        for event in events {
            self.dispatch(Event::Transport(event));
        }
        count
    }

    pub fn dispatch(&mut self, event: Event) -> Response {
        let response = match event {
            Event::Pointer(pointer) => self.controller.handle_pointer(&mut self.table, &pointer),
            Event::Key(key) => self.controller.handle_key(&mut self.table, &key),
            Event::Resize(size) => {
                self.table.set_viewport_size(size);
                Response::REPAINT
            }
            Event::ImageLoaded { url, size } => {
                log::debug!("image loaded: {} ({}x{})", url, size.width, size.height);
                self.table.image_loaded(&url, size);
                Response::REPAINT
            }
            Event::AddItem(imgurl) => self.controller.add_item(&mut self.table, &imgurl),
            Event::Transport(event) => self.handle_transport(event),
        };
        if response.broadcast {
            self.broadcast();
        }
        if response.repaint {
            self.needs_repaint = true;
        }
        response
    }

    fn handle_transport(&mut self, event: TransportEvent) -> Response {
        match event {
            TransportEvent::Connected => {
                log::info!("connected to relay");
                self.established = true;
                Response::REPAINT
            }
            TransportEvent::Message(payload) => {
                let dragging = self.controller.is_dragging_items();
                match self.sync.apply_incoming(&mut self.table, &payload, dragging) {
                    Ok(_) => Response::REPAINT,
                    Err(e) => {
                        log::warn!("dropping sync message: {}", e);
                        Response::NONE
                    }
                }
            }
            TransportEvent::Disconnected => {
                self.disconnect();
                Response::REPAINT
            }
            TransportEvent::Error(message) => {
                log::warn!("transport error: {}", message);
                self.last_error = Some(message);
                self.disconnect();
                Response::REPAINT
            }
        }
    }

    /// Send the whole item collection to the other players.
    pub fn broadcast(&mut self) {
        let payload = match self.sync.outgoing(&self.table) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("not broadcasting: {}", e);
                return;
            }
        };
        if !self.transport.is_connected() {
            return;
        }
        if let Err(e) = self.transport.send(&payload) {
            log::warn!("send failed, disconnecting: {}", e);
            self.disconnect();
        }
    }

    /// Image urls the front-end still has to load.
    pub fn take_image_requests(&mut self) -> Vec<String> {
        self.table.store.images.take_requests()
    }

    pub fn take_ui_requests(&mut self) -> Vec<UiRequest> {
        self.controller.take_ui_requests()
    }

    /// Whether something changed since the last [`Session::render`].
    pub fn needs_repaint(&self) -> bool {
        self.needs_repaint
    }

    pub fn render<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        let ctx = RenderContext::new(&self.table).with_unsynced(self.sync.is_unsynced());
        build_scene(renderer, &ctx);
        self.needs_repaint = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Modifiers, MouseButton};
    use crate::item::{Item, ItemId};
    use crate::render::ItemLook;
    use crate::sync::SyncActivity;
    use kurbo::{Affine, Point};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use url::Url;

    #[derive(Default)]
    struct MockTransport {
        state: Option<ConnectionState>,
        url: Option<String>,
        sent: Vec<String>,
        incoming: Vec<TransportEvent>,
        fail_send: bool,
    }

    impl Transport for MockTransport {
        fn connect(&mut self, url: &Url) -> Result<(), TransportError> {
            self.url = Some(url.to_string());
            self.state = Some(ConnectionState::Connecting);
            self.incoming.push(TransportEvent::Connected);
            Ok(())
        }

        fn send(&mut self, payload: &str) -> Result<(), TransportError> {
            if self.fail_send {
                return Err(TransportError::SendFailed("broken pipe".to_string()));
            }
            self.sent.push(payload.to_string());
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            let events = std::mem::take(&mut self.incoming);
            for event in &events {
                if *event == TransportEvent::Connected {
                    self.state = Some(ConnectionState::Connected);
                }
            }
            events
        }

        fn disconnect(&mut self) {
            self.state = None;
        }

        fn state(&self) -> ConnectionState {
            self.state.unwrap_or(ConnectionState::Disconnected)
        }
    }

    #[derive(Default)]
    struct Recorder {
        items: Vec<ItemId>,
        unsynced: bool,
    }

    impl Renderer for Recorder {
        fn render_item(&mut self, look: &ItemLook, _transform: Affine) {
            self.items.push(look.id);
        }

        fn render_unsynced_frame(&mut self, _viewport: Size) {
            self.unsynced = true;
        }
    }

    fn connected_session(items: Vec<Item>) -> Session<MockTransport> {
        let table = Table::with_rng(TableConfig::default(), StdRng::seed_from_u64(11));
        let mut session =
            Session::with_parts(table, InteractionController::new(), MockTransport::default());
        session.table.store.replace(items);
        session.connect("poker").unwrap();
        assert_eq!(session.poll(), 1);
        assert!(session.is_connected());
        session
    }

    fn canvas(x: f64, y: f64) -> Point {
        Point::new(x + 400.0, y + 300.0)
    }

    fn card(id: ItemId, x: f64, y: f64) -> Item {
        Item::new(id, "card.png", Point::new(x, y), 1.0)
    }

    fn message(payload: &str) -> Event {
        Event::Transport(TransportEvent::Message(payload.to_string()))
    }

    #[test]
    fn test_connect_uses_table_endpoint() {
        let session = connected_session(vec![]);
        assert_eq!(session.transport().url.as_deref(), Some("ws://localhost:3030/table-poker"));
        assert_eq!(session.table_name(), Some("poker"));
    }

    #[test]
    fn test_remote_update_does_not_yank_dragged_item() {
        let mut session = connected_session(vec![card(1, 0.0, 0.0)]);
        session.dispatch(Event::Pointer(PointerEvent::Down {
            position: canvas(0.0, 0.0),
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        }));
        session.dispatch(Event::Pointer(PointerEvent::Move {
            position: canvas(30.0, 40.0),
        }));
        assert!(session.transport().sent.is_empty());

        session.dispatch(message(
            r#"[{"id":1,"imgurl":"card.png","center":{"x":-100,"y":-100},"scale":1}]"#,
        ));
        assert_eq!(session.table.store.by_id(1).unwrap().center, Point::new(30.0, 40.0));
        assert_eq!(session.sync().last_activity(), Some(SyncActivity::Received));

        session.dispatch(Event::Pointer(PointerEvent::Up {
            position: canvas(30.0, 40.0),
            button: MouseButton::Left,
        }));
        let sent = &session.transport().sent;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains(r#""center":{"x":30.0,"y":40.0}"#));
        assert_eq!(session.sync().last_activity(), Some(SyncActivity::Sent));
    }

    #[test]
    fn test_claim_broadcasts_player_id() {
        let mut session = connected_session(vec![card(1, 0.0, 0.0)]);
        session.table.set_selected(1, true);
        let response = session.dispatch(Event::Key(KeyEvent::new("m")));
        assert!(response.broadcast);
        let player = session.table.player.to_string();
        assert!(session.transport().sent[0].contains(&player));
        assert!(session.table.selection.is_empty());
    }

    #[test]
    fn test_empty_payload_renders_nothing() {
        for payload in ["", "[]"] {
            let mut session = connected_session(vec![card(1, 0.0, 0.0)]);
            session.dispatch(message(payload));
            assert!(session.table.store.is_empty());
            assert!(session.needs_repaint());

            let mut recorder = Recorder::default();
            session.render(&mut recorder);
            assert!(recorder.items.is_empty());
            assert!(!recorder.unsynced);
            assert!(!session.needs_repaint());
        }
    }

    #[test]
    fn test_malformed_message_is_dropped() {
        let mut session = connected_session(vec![card(1, 0.0, 0.0)]);
        let response = session.dispatch(message("[{\"id\":"));
        assert_eq!(response, Response::NONE);
        assert_eq!(session.table.store.ids(), vec![1]);
        assert!(session.is_connected());
    }

    #[test]
    fn test_close_runs_disconnect_path() {
        let mut session = connected_session(vec![]);
        session.transport_mut().incoming.push(TransportEvent::Disconnected);
        session.poll();
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert_eq!(session.table_name(), None);

        let mut session = connected_session(vec![]);
        session.dispatch(Event::Transport(TransportEvent::Error("reset".to_string())));
        assert!(!session.is_connected());
        assert!(session.was_established());
        assert_eq!(session.last_error(), Some("reset"));
    }

    #[test]
    fn test_refused_connection_is_never_established() {
        let mut session = Session::new(TableConfig::default(), MockTransport::default());
        session.connect("poker").unwrap();
        let transport = session.transport_mut();
        transport.incoming.clear();
        transport.incoming.push(TransportEvent::Error("refused".to_string()));
        session.poll();
        assert_eq!(session.table_name(), None);
        assert!(!session.was_established());
        assert_eq!(session.last_error(), Some("refused"));

        // A new attempt starts from a clean slate.
        session.connect("poker").unwrap();
        assert_eq!(session.last_error(), None);
        session.poll();
        assert!(session.was_established());
    }

    #[test]
    fn test_send_failure_disconnects() {
        let mut session = connected_session(vec![]);
        session.transport_mut().fail_send = true;
        session.dispatch(Event::AddItem("token.png".to_string()));
        assert_eq!(session.table.store.len(), 1);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_offline_changes_stay_local() {
        let table = Table::with_rng(TableConfig::default(), StdRng::seed_from_u64(3));
        let mut session =
            Session::with_parts(table, InteractionController::new(), MockTransport::default());
        session.dispatch(Event::AddItem("token.png".to_string()));
        assert!(session.transport().sent.is_empty());
        assert!(session.sync().is_unsynced());
        assert_eq!(session.take_image_requests(), vec!["token.png".to_string()]);
    }

    #[test]
    fn test_image_loaded_resorts() {
        let big = Item::new(2, "big.png", Point::new(9.0, 0.0), 1.0);
        let mut session = connected_session(vec![card(1, 0.0, 0.0), big]);
        assert_eq!(session.table.store.ids(), vec![1, 2]);
        session.dispatch(Event::ImageLoaded {
            url: "big.png".to_string(),
            size: Size::new(200.0, 200.0),
        });
        assert_eq!(session.table.store.ids(), vec![2, 1]);
        assert!(session.needs_repaint());
    }

    #[test]
    fn test_shuffle_keeps_pile_members() {
        let mut session = connected_session(vec![
            card(1, 0.0, 0.0),
            card(2, 12.5, 0.0),
            card(3, 25.0, 0.0),
            card(4, 37.5, 0.0),
        ]);
        session.table.set_selected(1, true);
        assert_eq!(session.table.selection.len(), 4);
        let response = session.dispatch(Event::Key(KeyEvent::new("s")));
        assert!(response.broadcast);
        let piles = session.table.piles();
        let mut pile = piles.whole_pile_ids(session.table.store.by_id(3).unwrap());
        pile.sort_unstable();
        assert_eq!(pile, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_resize_keeps_center() {
        let mut session = connected_session(vec![]);
        let centered = session.table.view.to_table(Point::new(400.0, 300.0));
        session.dispatch(Event::Resize(Size::new(1200.0, 900.0)));
        assert_eq!(session.table.view.to_canvas(centered), Point::new(600.0, 450.0));
    }
}
