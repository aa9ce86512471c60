//! Upload listener lifecycle: bind once, serve in the background, stop on request.

use crate::transport::local::{bind_local, BindScope};
use axum::Router;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::RuntimeFlavor;
use tokio::task::JoinHandle;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
/// Upper bound on waiting for a stopped server to close its socket.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(3);

/// Externally visible state of the upload listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerStatus {
    Stopped,
    Running { port: u16 },
    /// Bind or serve failed; the pairing URL points at nothing until a retry succeeds.
    Failed { reason: String },
}

impl ListenerStatus {
    pub fn port(&self) -> Option<u16> {
        match self {
            ListenerStatus::Running { port } => Some(*port),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ListenerStatus::Running { .. })
    }
}

struct ListenerInner {
    status: ListenerStatus,
    handle: Option<axum_server::Handle>,
    // Serve task of the last start; it owns the socket until it finishes
    serve_task: Option<JoinHandle<()>>,
    // Bumped on every start so a finished serve task can't clobber a newer one
    generation: u64,
}

/// Owns the background HTTP server. Dropping it stops the server.
pub struct Listener {
    app: Router,
    scope: BindScope,
    port: u16,
    runtime: tokio::runtime::Handle,
    inner: Arc<Mutex<ListenerInner>>,
}

impl Listener {
    pub fn new(app: Router, scope: BindScope, port: u16, runtime: tokio::runtime::Handle) -> Self {
        Self {
            app,
            scope,
            port,
            runtime,
            inner: Arc::new(Mutex::new(ListenerInner {
                status: ListenerStatus::Stopped,
                handle: None,
                serve_task: None,
                generation: 0,
            })),
        }
    }

    /// Starts serving unless already running. Never blocks on the serve loop
    /// and never fails: bind errors are logged and reported in the status.
    ///
    /// After a `shutdown` on a fixed port, waits (bounded) for the previous
    /// server to release the socket before binding again.
    pub fn ensure_started(&self) -> ListenerStatus {
        let draining = {
            let mut inner = lock(&self.inner);
            if inner.status.is_running() {
                return inner.status.clone();
            }
            inner.serve_task.take()
        };
        if let Some(task) = draining {
            self.wait_for_release(task);
        }

        let mut inner = lock(&self.inner);
        if inner.status.is_running() {
            return inner.status.clone();
        }

        let listener = match bind_local(self.scope, self.port) {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!("Upload listener failed to start: {:#}", err);
                inner.status = ListenerStatus::Failed {
                    reason: format!("{:#}", err),
                };
                return inner.status.clone();
            }
        };

        let port = match listener.local_addr() {
            Ok(addr) => addr.port(),
            Err(err) => {
                tracing::error!("Upload listener has no local address: {}", err);
                inner.status = ListenerStatus::Failed {
                    reason: err.to_string(),
                };
                return inner.status.clone();
            }
        };

        inner.generation += 1;
        let generation = inner.generation;
        let server_handle = axum_server::Handle::new();
        let server_handle_clone = server_handle.clone();
        let app = self.app.clone();
        let shared = self.inner.clone();

        let serve_task = self.runtime.spawn(async move {
            let result = axum_server::from_tcp(listener)
                .handle(server_handle_clone)
                .serve(app.into_make_service())
                .await;

            let mut inner = lock(&shared);
            if inner.generation != generation {
                return;
            }
            match result {
                Ok(()) => tracing::debug!(port, "Upload listener exited"),
                Err(err) => {
                    tracing::error!(port, "Upload listener stopped: {}", err);
                    inner.status = ListenerStatus::Failed {
                        reason: err.to_string(),
                    };
                    inner.handle = None;
                }
            }
        });

        tracing::info!(port, scope = ?self.scope, "Upload listener started");
        inner.handle = Some(server_handle);
        inner.serve_task = Some(serve_task);
        inner.status = ListenerStatus::Running { port };
        inner.status.clone()
    }

    // Ephemeral ports never collide with the old socket, so only fixed ports wait
    fn wait_for_release(&self, task: JoinHandle<()>) {
        if self.port == 0 || task.is_finished() {
            return;
        }

        let wait = async move {
            if tokio::time::timeout(RELEASE_TIMEOUT, task).await.is_err() {
                tracing::warn!("Previous upload listener did not exit in time");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Err(_) => self.runtime.block_on(wait),
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.runtime.block_on(wait))
            }
            // The serve task needs this very thread to finish; binding may fail
            Ok(_) => tracing::warn!(
                "Cannot wait for the previous upload listener on a current-thread runtime"
            ),
        }
    }

    pub fn status(&self) -> ListenerStatus {
        lock(&self.inner).status.clone()
    }

    /// Stop accepting connections; in-flight uploads get a short grace period.
    ///
    /// Returns right away; the socket closes once the serve task has drained.
    pub fn shutdown(&self) {
        let mut inner = lock(&self.inner);
        if let Some(handle) = inner.handle.take() {
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            tracing::info!("Upload listener stopped accepting new connections");
        }
        inner.generation += 1;
        inner.status = ListenerStatus::Stopped;
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock(inner: &Mutex<ListenerInner>) -> MutexGuard<'_, ListenerInner> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("Listener lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
