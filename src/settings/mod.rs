//! Settings file and command line handling for the binaries.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
