use levelog::settings::*;
use levelog::{log_debug, log_error, log_info, log_warning};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut project_settings = parse_settings(cli.settings.as_deref())?;
    project_settings.apply_cli(&cli);

    let logger = levelog::init(&project_settings.log)?;
    levelog::logger::info!(level = %logger.level(), path = ?project_settings.log.path, "logger ready");

    log_error!(logger, "error line, level {}", logger.level());
    log_warning!(logger, "warning line, level {}", logger.level());
    log_info!(logger, "info line, level {}", logger.level());
    log_debug!(logger, "debug line, level {}", logger.level());

    Ok(())
}
