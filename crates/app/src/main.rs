mod args;
mod logging;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Conversation, Identity, Init, Message, Version};

command_enum! {
    (Init, Init),
    (Identity, Identity),
    (Conversation, Conversation),
    (Message, Message),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // before init there is no config; fall back to info
    let level = state::AppState::load(args.config_path.clone())
        .map(|state| state.config.log_level())
        .unwrap_or(tracing::Level::INFO);
    let guard = logging::init_logging(level);

    let ctx = op::OpContext::new(args.config_path, args.passphrase);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered log lines; exit skips destructors
    drop(guard);
    std::process::exit(code);
}
