use crate::common::SessionSlot;
use std::path::{Path, PathBuf};

/// State shared by the upload handlers
#[derive(Clone)]
pub struct ReceiveAppState {
    pub sessions: SessionSlot,
    save_dir: PathBuf,
}

impl ReceiveAppState {
    /// `save_dir` should already be absolute; handlers pass paths under it to hosts.
    pub fn new(sessions: SessionSlot, save_dir: PathBuf) -> Self {
        Self { sessions, save_dir }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }
}
