//! Per-connection request handling
//!
//! Each WebSocket connection registers a [`Subscriber`], receives one full
//! snapshot, and then answers requests one at a time until the client closes
//! or the socket fails. Mutations are applied through the fire-and-forget
//! controller methods and always answered with a freshly acquired snapshot,
//! so a client learns the real outcome from the state itself.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use pactl_client::{DeviceController, DeviceKind, StreamKind};
use pulse_state::SnapshotSource;
use tracing::{debug, info, trace, warn};
use warp::ws::{Message, WebSocket};

use crate::protocol::{Command, Response, ResponsePayload};
use crate::registry::SubscriberRegistry;
use crate::subscriber::Subscriber;

/// Everything a connection needs, cloned into each connection task
#[derive(Clone)]
pub struct AppContext {
    source: Arc<dyn SnapshotSource>,
    controller: DeviceController,
    registry: SubscriberRegistry,
    send_timeout: Duration,
}

impl AppContext {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        controller: DeviceController,
        registry: SubscriberRegistry,
        send_timeout: Duration,
    ) -> Self {
        Self {
            source,
            controller,
            registry,
            send_timeout,
        }
    }

    pub fn source(&self) -> &Arc<dyn SnapshotSource> {
        &self.source
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("registry", &self.registry)
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}

/// Execute a decoded command and build its response
pub async fn dispatch(ctx: &AppContext, command: Command) -> Response {
    let action = command.action();
    let controller = &ctx.controller;

    match command {
        Command::GetStatus => return Response::status(ctx.source.snapshot().await),
        Command::GetBuildInfo => {
            return Response::success(action, ResponsePayload::BuildInfo(ctx.source.build_info()))
        }
        Command::SetOutputVolume(body) => {
            controller.set_volume(DeviceKind::Sink, &body.name, body.volume).await
        }
        Command::SetOutputMuted(body) => {
            controller.set_muted(DeviceKind::Sink, &body.name, body.muted).await
        }
        Command::SetPlaybackVolume(body) => {
            controller
                .set_volume(DeviceKind::SinkInput, &body.id.to_string(), body.volume)
                .await
        }
        Command::SetPlaybackMuted(body) => {
            controller
                .set_muted(DeviceKind::SinkInput, &body.id.to_string(), body.muted)
                .await
        }
        Command::MovePlayback(body) => {
            controller
                .move_stream(StreamKind::Playback, body.id, &body.name)
                .await
        }
        Command::SetSourceVolume(body) => {
            controller.set_volume(DeviceKind::Source, &body.name, body.volume).await
        }
        Command::SetSourceMuted(body) => {
            controller.set_muted(DeviceKind::Source, &body.name, body.muted).await
        }
        Command::SetRecordingVolume(body) => {
            controller
                .set_volume(DeviceKind::SourceOutput, &body.id.to_string(), body.volume)
                .await
        }
        Command::SetRecordingMuted(body) => {
            controller
                .set_muted(DeviceKind::SourceOutput, &body.id.to_string(), body.muted)
                .await
        }
        Command::MoveRecording(body) => {
            controller
                .move_stream(StreamKind::Recording, body.id, &body.name)
                .await
        }
    }

    Response::success(action, ResponsePayload::Snapshot(ctx.source.snapshot().await))
}

/// Decode and answer one inbound text message
pub async fn handle_message(ctx: &AppContext, text: &str) -> Response {
    trace!(request = text, "inbound message");

    let response = match Command::decode(text) {
        Ok(command) => dispatch(ctx, command).await,
        Err(e) => {
            warn!(status = e.status().code(), error = %e, "rejected request");
            e.to_response()
        }
    };

    debug!(action = %response.action, status = response.status.code(), "handled request");
    response
}

/// Drive an upgraded WebSocket until it closes
pub async fn serve_connection(ctx: AppContext, socket: WebSocket, remote: Option<SocketAddr>) {
    let (sink, inbound) = socket.split();
    let subscriber = Arc::new(Subscriber::new(sink, remote, ctx.send_timeout));
    run_session(ctx, subscriber, inbound).await;
}

/// Register, greet, serve requests, then deregister.
///
/// Generic over the inbound half so tests can feed frames without a socket.
pub(crate) async fn run_session<S>(ctx: AppContext, subscriber: Arc<Subscriber>, mut inbound: S)
where
    S: Stream<Item = Result<Message, warp::Error>> + Unpin,
{
    let id = subscriber.id();
    let count = ctx.registry.add(subscriber.clone());
    info!(%id, remote = ?subscriber.remote(), subscribers = count, "client connected");

    let greeting = Response::status(ctx.source.snapshot().await);
    if let Err(e) = subscriber.send_response(&greeting).await {
        warn!(%id, error = %e, "failed to send initial snapshot");
    } else {
        loop {
            // The engine closes subscribers it drops; stop reading then.
            let frame = tokio::select! {
                _ = subscriber.closed() => {
                    debug!(%id, "subscriber closed, ending session");
                    break;
                }
                frame = inbound.next() => frame,
            };
            let Some(frame) = frame else { break };

            let message = match frame {
                Ok(message) => message,
                Err(e) => {
                    debug!(%id, error = %e, "read failed");
                    break;
                }
            };

            let text = if message.is_close() {
                break;
            } else if let Ok(text) = message.to_str() {
                text.to_string()
            } else if message.is_binary() {
                String::from_utf8_lossy(message.as_bytes()).into_owned()
            } else {
                // ping / pong
                continue;
            };

            let response = handle_message(&ctx, &text).await;
            if let Err(e) = subscriber.send_response(&response).await {
                warn!(%id, error = %e, "failed to send response");
                break;
            }
        }
    }

    // The engine may have dropped this subscriber already and closed it.
    if ctx.registry.remove(&id).is_some() {
        subscriber.close().await;
    }
    info!(%id, subscribers = ctx.registry.count(), "client disconnected");
}
