//! Version-control backend port and adapters.

pub mod contract;
pub mod memory;
pub mod serialized;
pub mod svn_cli;

pub use contract::{LogEntry, VersionControlBackend};
pub use memory::{BackendCall, MemoryBackend};
pub use serialized::SerializedBackend;
pub use svn_cli::SvnCommandBackend;
