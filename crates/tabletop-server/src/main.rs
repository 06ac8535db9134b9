//! Tabletop WebSocket Relay Server
//!
//! A dumb relay: every frame a player sends to `/{table}` is forwarded
//! verbatim to the other players at the same table. The server never parses
//! payloads and holds no authority over the table state; it only remembers
//! the last frame per table so that late joiners start from the current
//! state.
//!
//! Listens on `TABLETOP_ADDR` (default `0.0.0.0:3030`).

mod relay;

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use relay::Relay;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::sync::broadcast::error::RecvError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3030);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabletop_server=info,tower_http=info".into()),
        )
        .init();

    let addr = listen_addr(std::env::var("TABLETOP_ADDR").ok().as_deref());
    info!("Tabletop relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/{{table}}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(Arc::new(Relay::new()))).await
}

/// Parse the listen address, falling back to [`DEFAULT_ADDR`].
fn listen_addr(value: Option<&str>) -> SocketAddr {
    match value {
        Some(value) => value.parse().unwrap_or_else(|e| {
            warn!("Invalid TABLETOP_ADDR {:?} ({}), using {}", value, e, DEFAULT_ADDR);
            DEFAULT_ADDR
        }),
        None => DEFAULT_ADDR,
    }
}

fn app(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/{table}", get(ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

/// Index page
async fn index() -> &'static str {
    "Tabletop Relay Server - Connect via WebSocket at /{table}"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(table): Path<String>,
    State(relay): State<Arc<Relay>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay, table))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, relay: Arc<Relay>, table: String) {
    let peer_id = Uuid::new_v4();
    let joined = relay.join(&table, peer_id);
    info!("Peer {} joined table {} ({} peers)", peer_id, table, joined.peer_count);

    let (mut sender, mut receiver) = socket.split();
    let mut table_rx = joined.rx;

    if let Some(frame) = joined.last_frame {
        if sender.send(frame).await.is_err() {
            relay.leave(&table, peer_id);
            return;
        }
    }

    loop {
        tokio::select! {
            // Frames from this peer
            msg = receiver.next() => {
                match msg {
                    Some(Ok(frame @ (Message::Text(_) | Message::Binary(_)))) => {
                        relay.publish(&table, peer_id, frame);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            // Frames from the other peers
            msg = table_rx.recv() => {
                match msg {
                    Ok((from, frame)) => {
                        // Don't echo back to sender
                        if from != peer_id && sender.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Every frame is a full snapshot, so the next one catches up.
                        warn!("Peer {} lagged behind by {} frames", peer_id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    relay.leave(&table, peer_id);
    info!("Peer {} left table {}", peer_id, table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

    async fn spawn_server() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(Arc::new(Relay::new()))).await.unwrap();
        });
        addr
    }

    type WsResult = Result<WsMessage, tokio_tungstenite::tungstenite::Error>;

    async fn next_text<S>(stream: &mut S) -> String
    where
        S: futures_util::Stream<Item = WsResult> + Unpin,
    {
        let msg = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        msg.to_text().unwrap().to_string()
    }

    #[test]
    fn test_listen_addr() {
        let documented: SocketAddr = "0.0.0.0:3030".parse().unwrap();
        assert_eq!(DEFAULT_ADDR, documented);
        assert_eq!(listen_addr(None), DEFAULT_ADDR);
        assert_eq!(
            listen_addr(Some("127.0.0.1:4000")),
            SocketAddr::from(([127, 0, 0, 1], 4000))
        );
        assert_eq!(listen_addr(Some("nonsense")), DEFAULT_ADDR);
    }

    #[tokio::test]
    async fn test_frames_are_relayed_verbatim() {
        let addr = spawn_server().await;
        let url = format!("ws://{}/table-poker", addr);
        let (mut alice, _) = connect_async(url.as_str()).await.unwrap();
        let (mut bob, _) = connect_async(url.as_str()).await.unwrap();

        let payload = r#"[{"id":1,"imgurl":"card.png","center":{"x":0.0,"y":0.0},"scale":1.0}]"#;
        alice.send(WsMessage::text(payload)).await.unwrap();
        assert_eq!(next_text(&mut bob).await, payload);

        // No echo to the sender.
        let echo = tokio::time::timeout(Duration::from_millis(200), alice.next()).await;
        assert!(echo.is_err());

        // Late joiners start from the last state.
        let (mut carol, _) = connect_async(url.as_str()).await.unwrap();
        assert_eq!(next_text(&mut carol).await, payload);
    }

    #[tokio::test]
    async fn test_other_tables_do_not_hear() {
        let addr = spawn_server().await;
        let (mut alice, _) = connect_async(format!("ws://{}/table-a", addr)).await.unwrap();
        let (mut bob, _) = connect_async(format!("ws://{}/table-b", addr)).await.unwrap();
        alice.send(WsMessage::text("[]")).await.unwrap();
        let heard = tokio::time::timeout(Duration::from_millis(200), bob.next()).await;
        assert!(heard.is_err());
    }
}
