#![allow(dead_code)]

pub mod config_test_utils;
pub mod upload_http;

use photobridge::UploadEvent;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Completion handler that remembers every event it saw.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<UploadEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> impl Fn(&UploadEvent) + Send + Sync + 'static {
        let events = self.events.clone();
        move |event: &UploadEvent| {
            events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event.clone());
        }
    }

    pub fn events(&self) -> Vec<UploadEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self) -> usize {
        self.events().len()
    }
}
