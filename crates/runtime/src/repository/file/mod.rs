//! File-based repository implementations.

mod log;

pub use log::FileEventLog;
