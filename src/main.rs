mod chat;
mod cli;
mod color;
mod config;
mod conversation;
mod gateway;
mod render;
mod utils;
mod version;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cli::{chat::chat_cmd, health::health_cmd, ColorMode};
use tracing_subscriber::EnvFilter;

#[derive(Default, Clone, Copy, ValueEnum, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum RequestedColorMode {
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Parser)]
#[command(name = "portalchat")]
#[command(
    about = "Chat with a data-portal question answering service",
    version = version::VERSION
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[arg(long, default_value_t = RequestedColorMode::default())]
    color: RequestedColorMode,
    /// Read the configuration from this file instead of the default locations
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the answering service, overriding the configuration
    #[arg(long)]
    api_base: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat
    Chat(ChatArgs),
    /// Check whether the answering service is up
    Health,
}

#[derive(Parser, Default)]
pub(crate) struct ChatArgs {
    /// Continue interactively after answering the initial prompt
    #[arg(short, long)]
    interactive: bool,
    /// Specify the initial prompt
    prompt: Option<String>,
}

fn init_tracing() {
    // Silent unless RUST_LOG asks for something.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    color::configure_color(ColorMode::resolve_auto(cli.color));

    let mut config = match config::read_config(cli.config) {
        Ok(config) => config,
        Err(err) => die!("{}", err),
    };

    if let Some(api_base) = cli.api_base {
        config.gateway.api_base = api_base;
    }

    tracing::debug!(api_base = %config.gateway.api_base, "configuration loaded");

    match &cli.command {
        Some(Commands::Chat(args)) => chat_cmd(&config, args).await,
        Some(Commands::Health) => health_cmd(&config).await,
        None => chat_cmd(&config, &ChatArgs::default()).await,
    }
}
