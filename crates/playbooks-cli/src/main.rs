mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    actions::ActionsSubcommand, config::ConfigSubcommand, viewed::ViewedSubcommand, ServerArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "playbooks",
    about = "Channel action automation for Playbooks: welcome messages and keyword prompts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .playbooks/ or .git/)
    #[arg(long, global = true, env = "PLAYBOOKS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Chat server URL (overrides server.url)
    #[arg(long, global = true, env = "PLAYBOOKS_SERVER_URL")]
    server: Option<String>,

    /// API token (overrides server.token)
    #[arg(long, global = true, env = "PLAYBOOKS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .playbooks/ with a default config and viewed database
    Init,

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Evaluate a rules file against a trigger event, offline
    Match {
        /// YAML list of channel actions
        #[arg(long)]
        file: PathBuf,
        /// Simulate a member joining the channel
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        join: bool,
        /// Simulate a post with this text
        #[arg(long)]
        text: Option<String>,
        /// Only consider rules for this channel
        #[arg(long)]
        channel: Option<String>,
    },

    /// Check whether two rules occupy the same trigger slot
    Equal {
        /// YAML list of channel actions
        #[arg(long)]
        file: PathBuf,
        /// Index of the first rule
        a: usize,
        /// Index of the second rule
        b: usize,
    },

    /// Read and write channel actions on the server
    Actions {
        #[command(subcommand)]
        subcommand: ActionsSubcommand,
    },

    /// Navigate to channels in order through one session
    Visit {
        /// Team name used to build channel routes
        #[arg(long, default_value = "team")]
        team: String,
        /// Channels as ID or ID:TYPE (O, P, D, G)
        #[arg(required = true)]
        channels: Vec<String>,
    },

    /// Run the welcome message automation over navigations read from stdin
    Watch,

    /// Inspect the viewed-channel database
    Viewed {
        #[command(subcommand)]
        subcommand: ViewedSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Watch => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let server = ServerArgs {
        url: cli.server,
        token: cli.token,
    };

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Config { subcommand } => cmd::config::run(&root, &server, subcommand, cli.json),
        Commands::Match {
            file,
            join,
            text,
            channel,
        } => cmd::match_cmd::run(&file, join, text.as_deref(), channel.as_deref(), cli.json),
        Commands::Equal { file, a, b } => cmd::equal::run(&file, a, b, cli.json),
        Commands::Actions { subcommand } => {
            cmd::actions::run(&root, &server, subcommand, cli.json)
        }
        Commands::Visit { team, channels } => {
            cmd::visit::run(&root, &server, &team, &channels, cli.json)
        }
        Commands::Watch => cmd::watch::run(&root, &server, cli.json),
        Commands::Viewed { subcommand } => cmd::viewed::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
