use levelog::logger::*;
use levelog::{log_debug, log_info, log_warning};

fn main() -> anyhow::Result<()> {
    // No init: the accessor hands out a console-only debug logger.
    log_debug!(log(), "lazy logger at {}", log().level());

    let quiet = Logger::new(Level::parse("warning"));
    log_info!(quiet, "not shown");
    log_warning!(quiet, "shown at {}", quiet.level());

    let dir = std::env::temp_dir().join("levelog-demo");
    let config = LogConfig {
        level: Level::Info,
        path: dir.join("demo.log"),
        ..LogConfig::default()
    };
    let file_logger = Logger::build(&config)?;
    log_info!(file_logger, "written to {:?}", config.path);
    log_debug!(file_logger, "not written");

    Ok(())
}
