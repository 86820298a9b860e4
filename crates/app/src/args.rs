pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(about = "End-to-end encryption keys for Hearth conversations")]
pub struct Args {
    /// Path to the hearth config directory (defaults to ~/.hearth)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Passphrase protecting the identity private key
    #[arg(long, global = true, env = "HEARTH_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
