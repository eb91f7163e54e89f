//! WebSocket sessions against a served `realtime_router`.
//!
//! A real client connects over TCP, so these tests cover the socket loop:
//! greeting order, malformed frames, acks and the close that follows
//! leaving one's own user room.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use teamchat_realtime::adapters::{realtime_router, LocalTransport, RealtimeState};
use teamchat_realtime::application::{RegistryStats, RoomRegistry};
use teamchat_realtime::config::RealtimeConfig;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn serve(config: RealtimeConfig) -> (SocketAddr, RealtimeState) {
    let state = RealtimeState::new(
        Arc::new(RoomRegistry::new()),
        Arc::new(LocalTransport::new(config.connection_buffer)),
        config.clone(),
    );
    let app = realtime_router(&config).with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, query: &str) -> Result<Client, tungstenite::Error> {
    let url = format!("ws://{}/ws{}", addr, query);
    tokio_tungstenite::connect_async(url).await.map(|(ws, _)| ws)
}

async fn send(ws: &mut Client, event: &str, data: Value) {
    let frame = json!({"event": event, "data": data}).to_string();
    ws.send(Message::Text(frame)).await.unwrap();
}

/// Next text frame as `(event, data)`, or `None` once the server closes.
async fn next_event(ws: &mut Client) -> Option<(String, Value)> {
    loop {
        let frame = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("server did not answer in time");
        match frame {
            Some(Ok(Message::Text(text))) => {
                let mut value: Value = serde_json::from_str(&text).unwrap();
                let event = value["event"].as_str().unwrap().to_string();
                return Some((event, value["data"].take()));
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(other)) => panic!("unexpected frame: {:?}", other),
        }
    }
}

#[tokio::test]
async fn session_greets_acks_survives_garbage_and_closes_on_self_leave() {
    let (addr, state) = serve(RealtimeConfig::default()).await;
    let mut ws = connect(addr, "").await.unwrap();

    let (event, data) = next_event(&mut ws).await.unwrap();
    assert_eq!(event, "connected");
    assert!(data["connection_id"].is_string());

    send(&mut ws, "join_user_room", json!({"user_id": "alice"})).await;
    let (event, data) = next_event(&mut ws).await.unwrap();
    assert_eq!(event, "room_join_ack");
    assert_eq!(data, json!({"room_name": "user_alice", "status": "success"}));

    ws.send(Message::Text("definitely not json".to_string()))
        .await
        .unwrap();
    send(&mut ws, "ping", json!({})).await;
    let (event, data) = next_event(&mut ws).await.unwrap();
    assert_eq!(event, "pong");
    assert!(data["timestamp"].is_string());

    send(&mut ws, "join_channel_room", json!({"workspace_id": "w1", "channel_id": "c1"})).await;
    let (event, _) = next_event(&mut ws).await.unwrap();
    assert_eq!(event, "room_join_ack");
    assert_eq!(state.registry.stats().await.channels, 1);

    send(&mut ws, "leave_user_room", json!({"user_id": "alice"})).await;
    let (event, data) = next_event(&mut ws).await.unwrap();
    assert_eq!(event, "room_leave_ack");
    assert_eq!(data["status"], "success");

    assert!(next_event(&mut ws).await.is_none());
    assert_eq!(state.registry.stats().await, RegistryStats::default());
    assert_eq!(state.transport.connection_count().await, 0);
}

#[tokio::test]
async fn client_disconnect_cleans_up_registry_and_transport() {
    let (addr, state) = serve(RealtimeConfig::default()).await;
    let mut ws = connect(addr, "").await.unwrap();
    next_event(&mut ws).await.unwrap();
    send(&mut ws, "join_user_room", json!({"user_id": "bob"})).await;
    next_event(&mut ws).await.unwrap();

    ws.close(None).await.unwrap();

    let cleaned = tokio::time::timeout(WAIT, async {
        while state.transport.connection_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(cleaned.is_ok());
    assert_eq!(state.registry.stats().await, RegistryStats::default());
}

#[tokio::test]
async fn handshake_without_user_id_is_refused_when_identity_required() {
    let config = RealtimeConfig {
        require_connect_identity: true,
        ..Default::default()
    };
    let (addr, _state) = serve(config).await;

    let refused = connect(addr, "").await;
    assert!(matches!(
        refused,
        Err(tungstenite::Error::Http(ref response)) if response.status() == 401
    ));

    let mut ws = connect(addr, "?user_id=alice").await.unwrap();
    let (event, _) = next_event(&mut ws).await.unwrap();
    assert_eq!(event, "connected");
}
