mod completion;
pub mod handlers;
mod state;
mod storage;

pub use completion::{CompletionHandler, UploadEvent};
pub use state::ReceiveAppState;
pub use storage::save_upload;
