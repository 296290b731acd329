use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::token::{MintArgs, VerifyArgs};
use config::SignetConfig;

#[derive(Parser, Debug)]
#[command(name = "signet", version, about = "Mint, verify and inspect Signet tokens")]
struct Cli {
    /// Keyring config file (defaults to ./signet.yaml when present)
    #[arg(long, global = true, env = "SIGNET_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Signing key management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Token operations
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new Ed25519 keypair
    Generate {
        /// Directory to write the key files to (prints them otherwise)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Key id used to name the files
        #[arg(long)]
        kid: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Mint and sign a new token
    Mint(MintArgs),

    /// Verify a token and print its claims
    Verify(VerifyArgs),

    /// Decode a token WITHOUT verifying its signature
    Inspect {
        /// Token file path or base64 literal
        token: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { output, kid } => commands::keys::generate(output, kid)?,
        },
        Command::Token { cmd } => {
            let config = SignetConfig::discover(cli.config.as_deref())?;
            match cmd {
                TokenCommand::Mint(args) => {
                    commands::token::mint(args, config.as_ref())?;
                }
                TokenCommand::Verify(args) => {
                    commands::token::verify(args, config.as_ref())?;
                }
                TokenCommand::Inspect { token } => {
                    commands::token::inspect(&token)?;
                }
            }
        }
    }

    Ok(())
}
