//! Server lifecycle management.
//!
//! ```text
//! Created ─start()─▶ Starting ─bind─▶ Ready ─▶ Serving ─shutdown()─▶ ShuttingDown ─▶ Stopped
//!                        │
//!                        └─bind error─▶ Failed
//! ```
//!
//! The listener is bound on a background thread. [`MediaServer::get_port`]
//! blocks until that bind has happened, which is the only synchronization
//! point between server startup and code that builds URLs into it.
//!
//! The public port is served by [`front`], which drops connections that go
//! quiet for [`IDLE_TIMEOUT`] and forwards the rest to tiny_http.

mod front;

use crate::config::ServeConfig;
use crate::error::ServerError;
use crate::host::{HostContext, locate_export_folder};
use crate::log;
use crate::resolve::ServeRoots;
use crate::serve::{ServeContext, handle_request};
use front::Front;
use parking_lot::{Condvar, Mutex};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::Server;

/// Pending connections the socket queues before they are accepted, enough for
/// the burst a browser view fires while it is still loading.
const LISTEN_BACKLOG: i32 = 100;

/// How long a connection may stay silent before it is closed.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle phase of a [`MediaServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Starting,
    Ready,
    Serving,
    ShuttingDown,
    Stopped,
    Failed,
}

/// State guarded by the readiness lock.
struct State {
    phase: Phase,
    /// Set once on bind, never cleared.
    port: Option<u16>,
    failure: Option<String>,
    listener: Option<Arc<Server>>,
}

/// Readiness shared between the server thread and `get_port` callers.
struct Shared {
    state: Mutex<State>,
    ready: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(State {
                phase: Phase::Created,
                port: None,
                failure: None,
                listener: None,
            }),
            ready: Condvar::new(),
        }
    }

    /// Record the bound port and wake every waiter.
    ///
    /// Returns false if shutdown was requested while binding.
    fn publish(&self, listener: &Arc<Server>, port: u16) -> bool {
        let mut state = self.state.lock();
        state.port = Some(port);
        self.ready.notify_all();

        if state.phase == Phase::ShuttingDown {
            return false;
        }
        state.phase = Phase::Ready;
        state.listener = Some(Arc::clone(listener));
        true
    }

    fn enter_serving(&self) {
        let mut state = self.state.lock();
        if state.phase == Phase::Ready {
            state.phase = Phase::Serving;
        }
    }

    fn fail(&self, reason: String) {
        let mut state = self.state.lock();
        state.phase = Phase::Failed;
        state.failure = Some(reason);
        self.ready.notify_all();
    }
}

/// Loopback HTTP server for the embedded browser view.
///
/// One instance is created by the embedding application at startup; request
/// threads share its context through an `Arc`.
pub struct MediaServer {
    shared: Arc<Shared>,
    ctx: Arc<ServeContext>,
    desired_port: u16,
    idle_timeout: Duration,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl MediaServer {
    /// Create a server for fixed roots. `port` 0 lets the OS choose.
    pub fn new(roots: ServeRoots, port: u16, host: HostContext) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            ctx: Arc::new(ServeContext::new(roots, host)),
            desired_port: port,
            idle_timeout: IDLE_TIMEOUT,
            thread: Mutex::new(None),
        }
    }

    /// Close connections that send nothing for `timeout` instead of
    /// [`IDLE_TIMEOUT`]. Only takes effect before [`Self::start`].
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Create a server from the `[serve]` config section.
    ///
    /// Fails if the web export folder can't be found; the server must not
    /// come up without it.
    pub fn from_config(config: &ServeConfig, host: HostContext) -> Result<Self, ServerError> {
        let export_root = match &config.export_dir {
            Some(dir) if dir.is_dir() => dir.clone(),
            Some(dir) => return Err(ServerError::ExportFolderMissing(dir.clone())),
            None => locate_export_folder(&config.data_dir)?,
        };
        let roots = ServeRoots::new(config.web_root.clone(), export_root);
        Ok(Self::new(roots, config.port, host))
    }

    /// Spawn the server thread. Returns immediately; use [`Self::get_port`]
    /// to wait until the socket is bound.
    pub fn start(&self) -> Result<(), ServerError> {
        let mut thread = self.thread.lock();
        {
            let mut state = self.shared.state.lock();
            if state.phase != Phase::Created {
                return Err(ServerError::AlreadyStarted);
            }
            state.phase = Phase::Starting;
        }

        let shared = Arc::clone(&self.shared);
        let ctx = Arc::clone(&self.ctx);
        let (port, idle) = (self.desired_port, self.idle_timeout);
        let spawned = thread::Builder::new()
            .name("mediasrv".into())
            .spawn(move || run(&shared, &ctx, port, idle));

        match spawned {
            Ok(handle) => {
                *thread = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.fail(e.to_string());
                Err(ServerError::Spawn(e))
            }
        }
    }

    /// Block until the listener is bound, then return its port.
    pub fn get_port(&self) -> Result<u16, ServerError> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(port) = state.port {
                return Ok(port);
            }
            match state.phase {
                Phase::Failed => {
                    let reason = state.failure.clone().unwrap_or_default();
                    return Err(ServerError::StartupFailed(reason));
                }
                Phase::Stopped => return Err(ServerError::Stopped),
                _ => self.shared.ready.wait(&mut state),
            }
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    /// Stop accepting requests and wait for the server thread to exit.
    ///
    /// In-flight responses are not drained. Safe to call more than once.
    pub fn shutdown(&self) {
        let listener = {
            let mut state = self.shared.state.lock();
            match state.phase {
                Phase::Stopped => return,
                Phase::Created => {
                    state.phase = Phase::Stopped;
                    self.shared.ready.notify_all();
                    return;
                }
                Phase::Failed => None,
                _ => {
                    state.phase = Phase::ShuttingDown;
                    state.listener.take()
                }
            }
        };

        if let Some(listener) = listener {
            listener.unblock();
        }
        if let Some(handle) = self.thread.lock().take()
            && handle.join().is_err()
        {
            log!("error"; "server thread panicked");
        }

        let mut state = self.shared.state.lock();
        if state.phase == Phase::ShuttingDown {
            state.phase = Phase::Stopped;
        }
        self.shared.ready.notify_all();
    }
}

impl Drop for MediaServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Server thread body: bind, publish the port, then serve until unblocked.
fn run(shared: &Shared, ctx: &Arc<ServeContext>, port: u16, idle: Duration) {
    let bound = bind(port).and_then(|(listener, bound_port)| {
        let (server, upstream) = bind_upstream()?;
        Ok((listener, bound_port, server, upstream))
    });
    let (listener, bound_port, server, upstream) = match bound {
        Ok(bound) => bound,
        Err(e) => {
            log!("error"; "{}", e);
            shared.fail(e.to_string());
            return;
        }
    };
    let server = Arc::new(server);

    if !shared.publish(&server, bound_port) {
        return;
    }
    let front = match Front::spawn(listener, upstream, idle) {
        Ok(front) => front,
        Err(e) => {
            log!("error"; "failed to start accept thread: {}", e);
            shared.fail(e.to_string());
            return;
        }
    };
    shared.enter_serving();

    for request in server.incoming_requests() {
        let ctx = Arc::clone(ctx);
        let spawned = thread::Builder::new()
            .name("mediasrv-request".into())
            .spawn(move || handle_request(request, &ctx));
        // A request dropped unanswered gets a 500 from tiny_http
        if let Err(e) = spawned {
            log!("serve"; "failed to spawn request thread: {}", e);
        }
    }

    front.close();
}

/// Bind the public `127.0.0.1:<port>` listener with the configured backlog.
fn bind(port: u16) -> Result<(TcpListener, u16), ServerError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| bind_error(port, e))?;
    #[cfg(not(windows))]
    socket
        .set_reuse_address(true)
        .map_err(|e| bind_error(port, e))?;
    socket.bind(&addr.into()).map_err(|e| bind_error(port, e))?;
    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|e| bind_error(port, e))?;

    let listener: TcpListener = socket.into();
    let bound_port = listener
        .local_addr()
        .map_err(|e| bind_error(port, e))?
        .port();

    Ok((listener, bound_port))
}

/// Bind the internal tiny_http listener the front loop forwards to.
fn bind_upstream() -> Result<(Server, SocketAddr), ServerError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(|e| bind_error(0, e))?;
    let addr = listener.local_addr().map_err(|e| bind_error(0, e))?;
    let server = Server::from_listener(listener, None).map_err(|e| bind_error(0, e))?;
    Ok((server, addr))
}

fn bind_error(port: u16, e: impl ToString) -> ServerError {
    ServerError::Bind {
        port,
        message: e.to_string(),
    }
}
