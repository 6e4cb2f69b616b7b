use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "daynote-logger", version)]
#[command(about = "Records the title of the focused window whenever it changes")]
pub struct LoggerArgs {
    /// Create the activity store and exit.
    #[arg(long)]
    pub init: bool,
    /// Don't mirror log output to the console.
    #[arg(long, short)]
    pub quiet: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
