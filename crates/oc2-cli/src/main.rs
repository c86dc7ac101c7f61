mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "oc2",
    about = "OpenC2 relay: queue commands from producers and hand them to polling consumers",
    version,
    propagate_version = true
)]
struct Cli {
    /// Relay config file (YAML)
    #[arg(long, global = true, env = "OC2_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay until interrupted
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(long)]
        listen: Option<String>,

        /// URL path of the OpenC2 endpoint
        #[arg(long)]
        path: Option<String>,

        /// Reject commands that fail structural validation
        #[arg(long)]
        strict: bool,

        /// Serve a JSON dump of the relay state at /debug
        #[arg(long)]
        debug_endpoint: bool,
    },

    /// Submit a command document to a relay
    Submit {
        /// Path to the command JSON, or `-` for stdin
        file: PathBuf,

        /// Relay endpoint URL
        #[arg(long, env = "OC2_SERVER", default_value = cmd::DEFAULT_SERVER)]
        server: String,
    },

    /// Poll a relay for commands as a consumer
    Poll {
        /// Relay endpoint URL
        #[arg(long, env = "OC2_SERVER", default_value = cmd::DEFAULT_SERVER)]
        server: String,

        /// Asset id to present (omit to have the relay issue one)
        #[arg(long)]
        id: Option<String>,

        /// Seconds to wait after an empty or failed poll
        #[arg(long, default_value = "5")]
        interval: u64,

        /// Poll a single time and exit
        #[arg(long)]
        once: bool,
    },

    /// Inspect the relay configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Poll { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Serve {
            listen,
            path,
            strict,
            debug_endpoint,
        } => cmd::serve::run(
            config_path,
            cmd::serve::Overrides {
                listen,
                path,
                strict,
                debug_endpoint,
            },
        ),
        Commands::Submit { file, server } => cmd::submit::run(&file, &server, cli.json),
        Commands::Poll {
            server,
            id,
            interval,
            once,
        } => cmd::poll::run(&server, id, interval, once, cli.json),
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
