pub mod config;
pub mod error;
pub mod types;

pub use config::TabmateConfig;
pub use error::{ErrorKind, Result, TabError};
pub use types::{Category, Tab, TabFlags, TabId};
