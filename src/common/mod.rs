pub mod config;
pub mod errors;
pub mod session;

pub use config::BridgeConfig;
pub use errors::AppError;
pub use session::{LookupError, SessionInfo, SessionSlot, SessionState, UploadTicket};
