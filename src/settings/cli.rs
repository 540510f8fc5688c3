use super::Parser;

#[derive(Parser, Debug)]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    /// error, warning, info or debug; anything else means debug
    #[arg(long)]
    pub level: Option<String>,
}
