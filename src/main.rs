use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chess_sync::ClientConfig;

mod app;

/// Terminal chess client that keeps its view in sync with a game engine
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Training piece to start with (king, rook, knight, bishop, queen)
    #[arg(long)]
    variant: Option<String>,

    /// Preferences file, overriding the configured one
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Print the JSON schema of the configuration file and exit
    #[arg(long)]
    print_config_schema: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.print_config_schema {
        println!("{}", ClientConfig::json_schema()?);
        return Ok(());
    }

    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(prefs) = args.prefs {
        config.preferences_file = Some(prefs);
    }
    app::run(config, args.variant).await
}
