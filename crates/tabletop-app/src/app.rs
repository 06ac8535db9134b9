//! Headless application shell: join a table and follow it.

use crate::renderer::LogRenderer;
use std::thread;
use std::time::Duration;
use tabletop_core::controller::UiRequest;
use tabletop_core::shortcuts::ShortcutRegistry;
use tabletop_core::{PlatformWebSocket, Session, TableConfig, Transport, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("usage: tabletop [TABLE] [RELAY_BASE]")]
    Usage,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub table: String,
    pub table_config: TableConfig,
    pub poll_interval: Duration,
}

impl AppConfig {
    /// Build from positional arguments (program name already skipped):
    /// an optional table name, then an optional relay base address.
    pub fn from_args<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut table_config = TableConfig::default();
        let mut args = args.into_iter();
        let table = match args.next() {
            Some(arg) if arg == "-h" || arg == "--help" => return Err(AppError::Usage),
            Some(table) => table,
            None => table_config.default_table.clone(),
        };
        if let Some(base) = args.next() {
            table_config.relay_base = base;
        }
        if args.next().is_some() {
            return Err(AppError::Usage);
        }
        Ok(Self {
            table,
            table_config,
            poll_interval: Duration::from_millis(50),
        })
    }
}

pub struct App<T: Transport = PlatformWebSocket> {
    session: Session<T>,
    renderer: LogRenderer,
    config: AppConfig,
}

impl App<PlatformWebSocket> {
    pub fn new(config: AppConfig) -> Self {
        Self::with_transport(config, PlatformWebSocket::new())
    }
}

impl<T: Transport> App<T> {
    pub fn with_transport(config: AppConfig, transport: T) -> Self {
        Self {
            session: Session::new(config.table_config.clone(), transport),
            renderer: LogRenderer::new(),
            config,
        }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn renderer(&self) -> &LogRenderer {
        &self.renderer
    }

    /// Handle everything that arrived since the last step. Returns false
    /// once the connection is gone.
    pub fn step(&mut self) -> bool {
        self.session.poll();

        // Nothing gets loaded here; items keep their fallback size.
        for url in self.session.take_image_requests() {
            log::debug!("image requested: {}", url);
        }
        for request in self.session.take_ui_requests() {
            match request {
                UiRequest::ShowHelp => log::info!("\n{}", ShortcutRegistry::help_text()),
                UiRequest::ToggleAddItemPrompt => {
                    log::debug!("add-item prompt is not available headless")
                }
            }
        }
        if self.session.needs_repaint() {
            self.session.render(&mut self.renderer);
        }
        self.session.table_name().is_some()
    }

    /// Connect and follow the table until the connection ends.
    ///
    /// Fails when the connection ends without ever having opened.
    pub fn run(&mut self) -> Result<(), AppError> {
        log::info!("player id: {}", self.session.table.player);
        self.session.connect(&self.config.table)?;
        while self.step() {
            thread::sleep(self.config.poll_interval);
        }
        if !self.session.was_established() {
            let reason = self
                .session
                .last_error()
                .unwrap_or("connection closed before it opened")
                .to_string();
            return Err(TransportError::ConnectFailed(reason).into());
        }
        log::info!("connection to table '{}' ended", self.config.table);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletop_core::{ConnectionState, TransportEvent};
    use url::Url;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_args() {
        let config = AppConfig::from_args(args(&[])).unwrap();
        assert_eq!(config.table, "default");
        assert_eq!(config.table_config.relay_base, "ws://localhost:3030");
    }

    #[test]
    fn test_table_and_base() {
        let config = AppConfig::from_args(args(&["poker", "wss://example.org"])).unwrap();
        assert_eq!(config.table, "poker");
        assert_eq!(config.table_config.relay_base, "wss://example.org");
    }

    #[test]
    fn test_usage_errors() {
        assert!(matches!(AppConfig::from_args(args(&["--help"])), Err(AppError::Usage)));
        assert!(matches!(AppConfig::from_args(args(&["a", "b", "c"])), Err(AppError::Usage)));
    }

    /// Transport that plays back a fixed script.
    struct Scripted {
        events: Vec<TransportEvent>,
        state: ConnectionState,
    }

    impl Transport for Scripted {
        fn connect(&mut self, _url: &Url) -> Result<(), TransportError> {
            self.state = ConnectionState::Connecting;
            Ok(())
        }

        fn send(&mut self, _payload: &str) -> Result<(), TransportError> {
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            let events = std::mem::take(&mut self.events);
            for event in &events {
                self.state = match event {
                    TransportEvent::Connected => ConnectionState::Connected,
                    TransportEvent::Disconnected => ConnectionState::Disconnected,
                    _ => self.state,
                };
            }
            events
        }

        fn disconnect(&mut self) {
            self.state = ConnectionState::Disconnected;
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    fn quick_config() -> AppConfig {
        AppConfig {
            poll_interval: Duration::ZERO,
            ..AppConfig::from_args(args(&["poker"])).unwrap()
        }
    }

    #[test]
    fn test_unreachable_relay_is_an_error() {
        let transport = Scripted {
            events: vec![TransportEvent::Error("refused".to_string())],
            state: ConnectionState::Disconnected,
        };
        let mut app = App::with_transport(quick_config(), transport);
        match app.run() {
            Err(AppError::Transport(TransportError::ConnectFailed(reason))) => {
                assert_eq!(reason, "refused");
            }
            other => panic!("expected a connect failure, got {other:?}"),
        }

        let transport = Scripted {
            events: vec![TransportEvent::Disconnected],
            state: ConnectionState::Disconnected,
        };
        let mut app = App::with_transport(quick_config(), transport);
        assert!(matches!(
            app.run(),
            Err(AppError::Transport(TransportError::ConnectFailed(_)))
        ));
    }

    #[test]
    fn test_run_follows_table_until_close() {
        let config = quick_config();
        let transport = Scripted {
            events: vec![
                TransportEvent::Connected,
                TransportEvent::Message(
                    r#"[{"id":1,"imgurl":"card.png","center":{"x":0,"y":0},
                         "scale":1,"faceDown":true}]"#
                        .to_string(),
                ),
                TransportEvent::Disconnected,
            ],
            state: ConnectionState::Disconnected,
        };
        let mut app = App::with_transport(config, transport);
        app.run().unwrap();

        assert_eq!(app.session().table.store.len(), 1);
        let frame = app.renderer().last_frame().unwrap();
        assert_eq!(frame.items, 1);
        assert_eq!(frame.face_down, 1);
        assert!(!frame.unsynced);
    }
}
