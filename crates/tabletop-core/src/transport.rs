//! WebSocket transport to the table relay.
//!
//! The relay forwards opaque frames, so the transport only moves UTF-8
//! payloads. Clients are polled: events pile up in a queue and the session
//! drains them between input events.

use thiserror::Error;
use url::Url;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from the WebSocket client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connected to the relay
    Connected,
    /// The socket closed
    Disconnected,
    /// A payload from another player
    Message(String),
    /// Error occurred
    Error(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid websocket url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("failed to open websocket: {0}")]
    ConnectFailed(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// A bidirectional channel of text payloads.
pub trait Transport {
    /// Start connecting. Completion is reported through [`TransportEvent::Connected`].
    fn connect(&mut self, url: &Url) -> Result<(), TransportError>;

    /// Queue a payload for sending. Fire and forget.
    fn send(&mut self, payload: &str) -> Result<(), TransportError>;

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<TransportEvent>;

    /// Close the socket and drop every handler.
    fn disconnect(&mut self);

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Track the connection state an event implies.
fn next_state(state: ConnectionState, event: &TransportEvent) -> ConnectionState {
    match event {
        TransportEvent::Connected => ConnectionState::Connected,
        TransportEvent::Disconnected => ConnectionState::Disconnected,
        TransportEvent::Error(_) => ConnectionState::Error,
        TransportEvent::Message(_) => state,
    }
}

/// Endpoint of table `table`: `base + "/" + prefix + table`.
pub fn endpoint_url(base: &str, prefix: &str, table: &str) -> Result<Url, TransportError> {
    let url = Url::parse(&format!("{}/{}{}", base.trim_end_matches('/'), prefix, table))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(TransportError::UnsupportedScheme(other.to_string())),
    }
}

/// Table name from the `table` parameter of a query string like `?table=poker`.
pub fn table_name_from_query(query: &str, default: &str) -> String {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == "table")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| default.to_string())
}

// ============================================================================
// WASM WebSocket Client
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod wasm_client {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

    /// WebSocket client for WASM.
    ///
    /// Events are collected and must be polled via `poll_events()`.
    pub struct WasmWebSocket {
        ws: Option<WebSocket>,
        state: ConnectionState,
        events: Rc<RefCell<Vec<TransportEvent>>>,
        // Store closures to prevent them from being dropped
        _on_open: Option<Closure<dyn Fn()>>,
        _on_message: Option<Closure<dyn Fn(MessageEvent)>>,
        _on_close: Option<Closure<dyn Fn(CloseEvent)>>,
        _on_error: Option<Closure<dyn Fn(ErrorEvent)>>,
    }

    /// Text of a frame; binary frames carry UTF-8 JSON as well.
    fn payload_text(data: JsValue) -> Option<String> {
        if let Some(text) = data.as_string() {
            return Some(text);
        }
        let buffer = data.dyn_into::<js_sys::ArrayBuffer>().ok()?;
        String::from_utf8(js_sys::Uint8Array::new(&buffer).to_vec()).ok()
    }

    impl WasmWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                ws: None,
                state: ConnectionState::Disconnected,
                events: Rc::new(RefCell::new(Vec::new())),
                _on_open: None,
                _on_message: None,
                _on_close: None,
                _on_error: None,
            }
        }
    }

    impl Transport for WasmWebSocket {
        fn connect(&mut self, url: &Url) -> Result<(), TransportError> {
            if self.ws.is_some() {
                return Err(TransportError::AlreadyConnected);
            }

            let ws = WebSocket::new(url.as_str())
                .map_err(|e| TransportError::ConnectFailed(format!("{:?}", e)))?;
            ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

            self.state = ConnectionState::Connecting;
            let events = self.events.clone();

            let events_open = events.clone();
            let on_open = Closure::wrap(Box::new(move || {
                events_open.borrow_mut().push(TransportEvent::Connected);
            }) as Box<dyn Fn()>);
            ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

            let events_msg = events.clone();
            let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
                match payload_text(e.data()) {
                    Some(text) => events_msg.borrow_mut().push(TransportEvent::Message(text)),
                    None => log::warn!("dropping websocket frame that is not UTF-8 text"),
                }
            }) as Box<dyn Fn(MessageEvent)>);
            ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

            let events_close = events.clone();
            let on_close = Closure::wrap(Box::new(move |_e: CloseEvent| {
                events_close.borrow_mut().push(TransportEvent::Disconnected);
            }) as Box<dyn Fn(CloseEvent)>);
            ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

            let events_err = events;
            let on_error = Closure::wrap(Box::new(move |_e: ErrorEvent| {
                events_err
                    .borrow_mut()
                    .push(TransportEvent::Error("WebSocket error".to_string()));
            }) as Box<dyn Fn(ErrorEvent)>);
            ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

            self.ws = Some(ws);
            self._on_open = Some(on_open);
            self._on_message = Some(on_message);
            self._on_close = Some(on_close);
            self._on_error = Some(on_error);

            Ok(())
        }

        fn disconnect(&mut self) {
            if let Some(ws) = self.ws.take() {
                ws.set_onopen(None);
                ws.set_onmessage(None);
                ws.set_onclose(None);
                ws.set_onerror(None);
                let _ = ws.close();
            }
            self.state = ConnectionState::Disconnected;
            self._on_open = None;
            self._on_message = None;
            self._on_close = None;
            self._on_error = None;
            self.events.borrow_mut().clear();
        }

        fn send(&mut self, payload: &str) -> Result<(), TransportError> {
            match self.ws {
                Some(ref ws) => ws
                    .send_with_str(payload)
                    .map_err(|e| TransportError::SendFailed(format!("{:?}", e))),
                None => Err(TransportError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            let events = std::mem::take(&mut *self.events.borrow_mut());
            for event in &events {
                self.state = next_state(self.state, event);
            }
            events
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl Default for WasmWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

}

#[cfg(target_arch = "wasm32")]
pub use wasm_client::WasmWebSocket;

// ============================================================================
// Native WebSocket Client
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket client for native platforms.
    ///
    /// Uses a background thread for non-blocking operation.
    pub struct NativeWebSocket {
        state: ConnectionState,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<TransportEvent>>,
        /// Handle to the WebSocket thread.
        _thread: Option<JoinHandle<()>>,
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }
    }

    fn run_socket(url: String, cmd_rx: Receiver<WsCommand>, event_tx: Sender<TransportEvent>) {
        log::info!("WebSocket thread: connecting to {}", url);
        let (mut socket, response) = match connect(url.as_str()) {
            Ok(connected) => connected,
            Err(e) => {
                log::error!("WebSocket connection failed: {}", e);
                let _ = event_tx.send(TransportEvent::Error(format!("Connection failed: {}", e)));
                return;
            }
        };
        log::info!("WebSocket connected, status: {}", response.status());
        let _ = event_tx.send(TransportEvent::Connected);

        // Short read timeout so the loop can service outgoing commands.
        match socket.get_mut() {
            tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
                let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
                let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
            }
            #[allow(unreachable_patterns)]
            _ => log::debug!("TLS or other stream - using default timeout handling"),
        }

        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(msg)) => {
                    log::debug!("WebSocket sending {} bytes", msg.len());
                    if let Err(e) = socket.send(Message::Text(msg)) {
                        log::error!("WebSocket send error: {}", e);
                        let _ = event_tx.send(TransportEvent::Error(format!("Send failed: {}", e)));
                        break;
                    }
                }
                Ok(WsCommand::Close) => {
                    log::info!("WebSocket close requested");
                    let _ = socket.close(None);
                    return;
                }
                Err(TryRecvError::Disconnected) => {
                    log::info!("WebSocket command channel disconnected");
                    let _ = socket.close(None);
                    return;
                }
                Err(TryRecvError::Empty) => {}
            }

            match socket.read() {
                Ok(Message::Text(txt)) => {
                    let _ = event_tx.send(TransportEvent::Message(txt));
                }
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(txt) => {
                        let _ = event_tx.send(TransportEvent::Message(txt));
                    }
                    Err(_) => log::warn!("dropping websocket frame that is not UTF-8 text"),
                },
                Ok(Message::Close(_)) => {
                    log::info!("WebSocket received close frame");
                    break;
                }
                // tungstenite answers pings on the next read or write.
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    log::error!("WebSocket read error: {}", e);
                    let _ = event_tx.send(TransportEvent::Error(format!("Read failed: {}", e)));
                    break;
                }
            }
        }

        log::info!("WebSocket thread exiting");
        let _ = event_tx.send(TransportEvent::Disconnected);
    }

    impl Transport for NativeWebSocket {
        fn connect(&mut self, url: &Url) -> Result<(), TransportError> {
            if self.cmd_tx.is_some() {
                return Err(TransportError::AlreadyConnected);
            }
            if url.scheme() != "ws" && url.scheme() != "wss" {
                return Err(TransportError::UnsupportedScheme(url.scheme().to_string()));
            }

            self.state = ConnectionState::Connecting;
            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<TransportEvent>();
            let url = url.to_string();
            let handle = thread::spawn(move || run_socket(url, cmd_rx, event_tx));

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);
            Ok(())
        }

        fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        fn send(&mut self, payload: &str) -> Result<(), TransportError> {
            match self.cmd_tx {
                Some(ref tx) => tx
                    .send(WsCommand::Send(payload.to_string()))
                    .map_err(|e| TransportError::SendFailed(e.to_string())),
                None => Err(TransportError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            let mut events = Vec::new();
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    self.state = next_state(self.state, &event);
                    events.push(event);
                }
            }
            events
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_client::NativeWebSocket;

// ============================================================================
// Platform type alias
// ============================================================================

/// Platform-specific WebSocket client type.
#[cfg(target_arch = "wasm32")]
pub type PlatformWebSocket = WasmWebSocket;

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformWebSocket = NativeWebSocket;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let url = endpoint_url("ws://localhost:3030", "table-", "poker").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:3030/table-poker");

        let url = endpoint_url("wss://example.org/", "table-", "default").unwrap();
        assert_eq!(url.as_str(), "wss://example.org/table-default");
    }

    #[test]
    fn test_endpoint_url_rejects_http() {
        assert!(matches!(
            endpoint_url("http://localhost:3030", "table-", "x"),
            Err(TransportError::UnsupportedScheme(scheme)) if scheme == "http"
        ));
        assert!(matches!(
            endpoint_url("not a url", "table-", "x"),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_table_name_from_query() {
        assert_eq!(table_name_from_query("?table=poker", "default"), "poker");
        assert_eq!(table_name_from_query("zoom=2&table=red%20room", "default"), "red room");
        assert_eq!(table_name_from_query("", "default"), "default");
        assert_eq!(table_name_from_query("?tables=x", "default"), "default");
    }

    #[test]
    fn test_state_follows_events() {
        let state = next_state(ConnectionState::Connecting, &TransportEvent::Connected);
        assert_eq!(state, ConnectionState::Connected);
        let state = next_state(state, &TransportEvent::Message("[]".to_string()));
        assert_eq!(state, ConnectionState::Connected);
        let state = next_state(state, &TransportEvent::Error("boom".to_string()));
        assert_eq!(state, ConnectionState::Error);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_native_send_requires_connection() {
        let mut ws = NativeWebSocket::new();
        assert!(matches!(ws.send("[]"), Err(TransportError::NotConnected)));
        assert_eq!(ws.state(), ConnectionState::Disconnected);
        assert!(ws.poll_events().is_empty());
    }
}
