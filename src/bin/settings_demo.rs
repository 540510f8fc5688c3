use levelog::settings::*;

fn main() -> anyhow::Result<()> {
    // Load settings from the default location, or from --settings
    // $ cargo run --bin settings_demo -- --settings=settings/release.toml --level=warning
    let cli = Cli::parse();
    let mut project_settings = parse_settings(cli.settings.as_deref())?;
    project_settings.apply_cli(&cli);
    println!("{}", serde_json::to_string_pretty(&project_settings)?);

    // Attempt to load from an invalid path (expected to fail)
    let is_err = parse_settings(Some("")).is_err();
    println!("Error on invalid path: {:?}", is_err);

    Ok(())
}
