//! Time-based log file rotation used by the logger's JSON sink.

mod rolling_file;
pub use rolling_file::*;
