//! HTTP/WebSocket server for the mixer protocol.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use pactl_client::{CommandRunner, DeviceController, Pactl};
use pulse_state::{SnapshotSource, StatusAggregator};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::config::ServerConfig;
use crate::engine::{EngineHandle, SyncEngine};
use crate::error::ServerError;
use crate::handler::{self, AppContext};
use crate::origin;
use crate::registry::SubscriberRegistry;

/// All routes of the server.
///
/// - `GET /api/v1/ws`: WebSocket upgrade
/// - `GET /api/v1/status`: one fresh snapshot as JSON
///
/// Both are refused with 403 for non-local origins.
pub fn routes(
    ctx: AppContext,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_ctx = warp::any().map(move || ctx.clone());

    let ws = warp::path!("api" / "v1" / "ws")
        .and(warp::get())
        .and(local_origin())
        .and(warp::ws())
        .and(with_ctx.clone())
        .map(|remote: Option<SocketAddr>, ws: warp::ws::Ws, ctx: AppContext| {
            ws.on_upgrade(move |socket| handler::serve_connection(ctx, socket, remote))
        });

    let status = warp::path!("api" / "v1" / "status")
        .and(warp::get())
        .and(local_origin())
        .and(with_ctx)
        .then(|_remote: Option<SocketAddr>, ctx: AppContext| async move {
            warp::reply::json(&ctx.source().snapshot().await)
        });

    ws.or(status).recover(handle_rejection)
}

/// Passes the remote address through when the origin policy allows it
fn local_origin() -> impl Filter<Extract = (Option<SocketAddr>,), Error = Rejection> + Clone {
    warp::addr::remote()
        .and(warp::header::optional::<String>("host"))
        .and_then(|remote: Option<SocketAddr>, host: Option<String>| async move {
            if origin::is_allowed(remote, host.as_deref()) {
                Ok(remote)
            } else {
                warn!(?remote, ?host, "refusing connection from non-local origin");
                Err(warp::reject::custom(OriginRejected))
            }
        })
}

/// Request came from outside the local network
#[derive(Debug)]
struct OriginRejected;

impl warp::reject::Reject for OriginRejected {}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.find::<OriginRejected>().is_some() {
        code = StatusCode::FORBIDDEN;
        message = "Forbidden origin";
    } else if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not found";
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method not allowed";
    } else {
        debug!(?err, "unhandled rejection");
        code = StatusCode::BAD_REQUEST;
        message = "Bad request";
    }

    Ok(warp::reply::with_status(message, code))
}

/// A running server: listener, connection tasks and broadcast engine.
///
/// # Example
///
/// ```no_run
/// use pulse_server::{PulseServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = PulseServer::with_pactl(ServerConfig::default()).await?;
///     println!("listening on {}", server.local_addr());
///
///     tokio::signal::ctrl_c().await?;
///     server.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct PulseServer {
    local_addr: SocketAddr,
    registry: SubscriberRegistry,
    engine: Option<EngineHandle>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    server_handle: Option<JoinHandle<()>>,
}

impl PulseServer {
    /// Start a server driving `pactl` as configured
    pub async fn with_pactl(config: ServerConfig) -> Result<Self, ServerError> {
        let runner = Pactl::new()
            .with_binary(config.pactl_binary.clone())
            .with_timeout(config.command_timeout);
        Self::start(config, Arc::new(runner)).await
    }

    /// Start a server on top of an arbitrary command runner
    pub async fn start(
        config: ServerConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ServerError> {
        let controller = DeviceController::new(runner);
        let source = Arc::new(StatusAggregator::new(controller.clone()));
        Self::start_with_source(config, controller, source).await
    }

    /// Start a server with an explicit snapshot source.
    ///
    /// Binding the listener is the only step that can fail once the
    /// configuration is valid.
    pub async fn start_with_source(
        config: ServerConfig,
        controller: DeviceController,
        source: Arc<dyn SnapshotSource>,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let registry = SubscriberRegistry::new();
        let ctx = AppContext::new(
            source.clone(),
            controller,
            registry.clone(),
            config.send_timeout,
        );

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (local_addr, server) = warp::serve(routes(ctx))
            .try_bind_with_graceful_shutdown(config.bind_addr, async move {
                shutdown_rx.recv().await;
            })
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        let server_handle = tokio::spawn(server);

        let engine = Arc::new(SyncEngine::new(
            source,
            registry.clone(),
            config.broadcast_interval,
        ))
        .spawn();

        info!(%local_addr, interval = ?config.broadcast_interval, "pulse-remote listening");

        Ok(Self {
            local_addr,
            registry,
            engine: Some(engine),
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Stop broadcasting, close every subscriber and stop accepting
    pub async fn shutdown(mut self) {
        if let Some(engine) = self.engine.take() {
            engine.shutdown().await;
        }

        for subscriber in self.registry.subscribers() {
            if self.registry.remove(&subscriber.id()).is_some() {
                subscriber.close().await;
            }
        }

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }

        info!("pulse-remote stopped");
    }
}

impl std::fmt::Debug for PulseServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PulseServer")
            .field("local_addr", &self.local_addr)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
