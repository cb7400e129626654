use clap::Parser;

/// Headless classroom client. Reads commands from stdin and prints what
/// happens in the room.
#[derive(Parser, Debug)]
#[command(name = "classroom", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Backend base URL override (e.g. http://localhost:5000).
    #[arg(short, long)]
    pub server: Option<String>,

    /// Display name to join with.
    #[arg(short, long)]
    pub username: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
