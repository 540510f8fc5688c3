//! Leveled logger: a verbosity gate in front of `tracing` plus a
//! timestamped console echo.

mod error;
pub use error::*;

mod level;
pub use level::*;

mod logger;
pub use logger::*;

mod global;
pub use global::*;

pub use tracing::{debug, error, info, trace, warn};
