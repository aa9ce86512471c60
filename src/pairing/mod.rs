//! Pairing service: arm a session, advertise it as URL + QR, keep the listener up.

pub mod qr;

use crate::common::config::BridgeConfig;
use crate::common::session::{SessionInfo, SessionSlot};
use crate::receive::{CompletionHandler, ReceiveAppState};
use crate::server::{routes, Listener, ListenerStatus};
use crate::transport::local::resolve_local_address_via;
use crate::utils::security::{self, PathValidationError};
use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// What the host shows the shop employee for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub session_id: String,
    /// Tappable/typeable fallback when scanning is impractical
    pub url: String,
    pub qr_image_path: PathBuf,
    /// Listener state at pairing time; `Failed` means the URL points at nothing
    pub listener: ListenerStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    #[error("invalid target filename '{name}': {reason}")]
    InvalidTarget {
        name: String,
        #[source]
        reason: PathValidationError,
    },

    /// The session is armed and `url` works; only the picture is missing.
    #[error("failed to render pairing QR code for {url}")]
    QrRender {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

/// URL a phone opens to reach one session.
pub fn session_url(address: IpAddr, port: u16, session_id: &str) -> String {
    format!("http://{}/s/{}", SocketAddr::new(address, port), session_id)
}

/// The camera hand-off bridge owned by the host application.
///
/// Create it inside a tokio runtime; afterwards its methods may be called from
/// any thread, including a UI thread outside the runtime. Dropping it stops
/// the listener.
pub struct Bridge {
    config: BridgeConfig,
    save_dir: PathBuf,
    sessions: SessionSlot,
    listener: Listener,
    last_qr: Mutex<Option<PathBuf>>,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .context("Bridge must be created from inside a tokio runtime")?;

        std::fs::create_dir_all(&config.save_dir).with_context(|| {
            format!(
                "Failed to create save directory {}",
                config.save_dir.display()
            )
        })?;
        let save_dir = std::fs::canonicalize(&config.save_dir).with_context(|| {
            format!(
                "Failed to resolve save directory {}",
                config.save_dir.display()
            )
        })?;

        let sessions = SessionSlot::new();
        let state = ReceiveAppState::new(sessions.clone(), save_dir.clone());
        let app = routes::create_upload_router(&state, config.max_upload_bytes);
        let listener = Listener::new(app, config.bind_scope, config.port, runtime);

        tracing::debug!(save_dir = %save_dir.display(), "Bridge ready");

        Ok(Self {
            config,
            save_dir,
            sessions,
            listener,
            last_qr: Mutex::new(None),
        })
    }

    /// Arm a session for `target_filename` and produce its pairing code.
    ///
    /// Replaces any earlier session. `handler` fires once per successful
    /// upload, on the listener's task.
    pub fn start_session(
        &self,
        target_filename: &str,
        handler: impl CompletionHandler,
    ) -> Result<Pairing, PairingError> {
        security::validate_filename(target_filename).map_err(|reason| {
            PairingError::InvalidTarget {
                name: target_filename.to_string(),
                reason,
            }
        })?;

        let handler: Arc<dyn CompletionHandler> = Arc::new(handler);
        let session = self.sessions.arm(target_filename, handler);

        // Start first: with port 0 the URL needs the port actually bound
        let listener = self.listener.ensure_started();
        let port = listener.port().unwrap_or(self.config.port);

        let address = resolve_local_address_via(&self.config.probe_target);
        let url = session_url(address, port, &session.id);

        let qr_image_path = self
            .save_dir
            .join(qr::qr_file_name(&self.config.qr_prefix, &session.id));
        if let Err(source) = qr::render_png(&url, &qr_image_path) {
            tracing::error!(session_id = %session.id, "QR rendering failed: {:#}", source);
            return Err(PairingError::QrRender { url, source });
        }
        self.replace_last_qr(&qr_image_path);

        tracing::info!(
            session_id = %session.id,
            target = %target_filename,
            %url,
            "Pairing ready"
        );

        Ok(Pairing {
            session_id: session.id,
            url,
            qr_image_path,
            listener,
        })
    }

    /// Idempotent; see [`Listener::ensure_started`].
    pub fn ensure_started(&self) -> ListenerStatus {
        self.listener.ensure_started()
    }

    pub fn listener_status(&self) -> ListenerStatus {
        self.listener.status()
    }

    pub fn armed_session(&self) -> Option<SessionInfo> {
        self.sessions.current()
    }

    /// Absolute directory photos and QR images are written to.
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Stop accepting uploads. The armed session stays armed.
    pub fn shutdown(&self) {
        self.listener.shutdown();
    }

    // Old codes are useless once their session is replaced
    fn replace_last_qr(&self, current: &Path) {
        let previous = {
            let mut last = match self.last_qr.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            last.replace(current.to_path_buf())
        };

        if let Some(previous) = previous.filter(|p| p != current) {
            if let Err(err) = std::fs::remove_file(&previous) {
                tracing::warn!("Failed to remove old QR image {}: {}", previous.display(), err);
            }
        }
    }
}
