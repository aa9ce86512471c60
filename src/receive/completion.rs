//! Completion delivery from the listener back to the host.

use std::path::PathBuf;
use tokio::sync::mpsc;

/// One photo that landed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEvent {
    pub session_id: String,
    pub target_filename: String,
    /// Absolute path of the saved file
    pub saved_path: PathBuf,
    pub bytes: u64,
}

/// Receives upload completions for a session.
///
/// Runs on the listener's task, not on the host's UI thread. Hosts that own
/// UI state should hand the event to their own loop, which is what the
/// `UnboundedSender` impl does.
pub trait CompletionHandler: Send + Sync + 'static {
    fn on_complete(&self, event: &UploadEvent);
}

impl<F> CompletionHandler for F
where
    F: Fn(&UploadEvent) + Send + Sync + 'static,
{
    fn on_complete(&self, event: &UploadEvent) {
        self(event)
    }
}

impl CompletionHandler for mpsc::UnboundedSender<UploadEvent> {
    fn on_complete(&self, event: &UploadEvent) {
        if self.send(event.clone()).is_err() {
            tracing::warn!(
                session_id = %event.session_id,
                "Upload event dropped: host receiver is gone"
            );
        }
    }
}
