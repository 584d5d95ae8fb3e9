pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::ReelConfig;
pub use error::{ReelError, Result};
pub use events::{IngestEvent, ProgressUpdate};
pub use types::*;
