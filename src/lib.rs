pub mod common;
pub mod output;
pub mod pairing;
pub mod receive;
pub mod server;
pub mod transport;
pub mod ui;
pub mod utils;

pub use common::config::BridgeConfig;
pub use common::session::{SessionInfo, SessionState};
pub use pairing::{Bridge, Pairing, PairingError};
pub use receive::{CompletionHandler, UploadEvent};
pub use server::ListenerStatus;
pub use transport::local::{resolve_local_address, resolve_local_address_via};
