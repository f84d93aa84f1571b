mod command;
mod config;
mod error;
mod host;

pub use command::WriteCommand;
pub use config::{Config, DeviceConfig};
pub use error::Error;
pub use host::MemoryHost;

pub type ErasedError = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, ErasedError>;
