pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use config::AgriPulseConfig;
pub use error::{AgriPulseError, Result};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::*;
