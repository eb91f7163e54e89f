//! Teamchat realtime server.
//!
//! Serves the WebSocket endpoint, the health probe and the internal
//! delivery API, and runs the background task consumer.

use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use teamchat_realtime::adapters::http::{delivery_router, DeliveryAppState};
use teamchat_realtime::adapters::{
    realtime_router, InMemoryTaskQueue, InMemoryUnreadCounter, LocalTransport, RealtimeState,
    RedisTaskQueue, RedisUnreadCounter, TaskWorker,
};
use teamchat_realtime::application::{
    ChannelMessageFanout, EventDispatcher, NotificationBridge, PresenceQueryService, RoomRegistry,
    UnreadNotificationWorker,
};
use teamchat_realtime::config::{AppConfig, ServerConfig};
use teamchat_realtime::ports::{RoomTransport, TaskQueue, UnreadCounter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;
    let addr = config.server.socket_addr()?;

    let registry = Arc::new(RoomRegistry::new());
    let transport = Arc::new(LocalTransport::new(config.realtime.connection_buffer));
    let room_transport: Arc<dyn RoomTransport> = transport.clone();
    let dispatcher = Arc::new(EventDispatcher::new(room_transport));
    let presence = PresenceQueryService::new(registry.clone());

    let worker = TaskWorker::new()
        .with_handler(Arc::new(UnreadNotificationWorker::new(dispatcher.clone())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (queue, unread, worker_handle): (Arc<dyn TaskQueue>, Arc<dyn UnreadCounter>, JoinHandle<()>) =
        match &config.redis {
            Some(redis) => {
                let producer = RedisTaskQueue::connect(redis).await?;
                let consumer = RedisTaskQueue::connect(redis).await?;
                let unread: Arc<dyn UnreadCounter> = Arc::new(RedisUnreadCounter::new(
                    producer.connection(),
                    redis.unread_prefix.clone(),
                ));
                let queue: Arc<dyn TaskQueue> = Arc::new(producer);
                let handle = tokio::spawn(async move { consumer.consume(&worker, shutdown_rx).await });
                tracing::info!(queue = %redis.queue_key, "Using Redis task queue");
                (queue, unread, handle)
            }
            None => {
                let (queue, tasks) = InMemoryTaskQueue::new();
                let unread: Arc<dyn UnreadCounter> = Arc::new(InMemoryUnreadCounter::new());
                let queue: Arc<dyn TaskQueue> = Arc::new(queue);
                let handle = tokio::spawn(async move { worker.run(tasks, shutdown_rx).await });
                tracing::info!("Using in-process task queue");
                (queue, unread, handle)
            }
        };

    let bridge = NotificationBridge::new(queue);
    let fanout = Arc::new(ChannelMessageFanout::new(
        presence.clone(),
        dispatcher.clone(),
        bridge.clone(),
        unread,
    ));

    let realtime_state = RealtimeState::new(registry, transport, config.realtime.clone());
    let delivery_state = DeliveryAppState {
        dispatcher,
        presence,
        bridge,
        fanout,
    };

    let internal = delivery_router()
        .with_state(delivery_state)
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let app = Router::new()
        .merge(realtime_router(&config.realtime).with_state(realtime_state))
        .nest("/internal", internal)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        ws_path = %config.realtime.ws_path,
        environment = ?config.server.environment,
        "Realtime server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining task worker");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        tracing::warn!("Task worker ended abnormally: {}", e);
    }

    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins
/// over the configured filter.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
