//! Scout binary entry point.

use std::io::Write;

use clap::Parser;
use futures::StreamExt;

use scout::chat::ChatService;
use scout::cli::{ChatArgs, Cli, Commands, ServeArgs};
use scout::config::ScoutConfig;
use scout::error::ScoutError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = scout::telemetry::init_tracing(cli.verbose, cli.log_json) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Serve(args) => handle_serve(args).await,
        Commands::Chat(args) => handle_chat(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_serve(args: ServeArgs) -> Result<(), ScoutError> {
    let mut config = ScoutConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    config.validate()?;

    let service = ChatService::from_config(&config)?;
    scout::http::serve(&config, service).await
}

async fn handle_chat(args: ChatArgs) -> Result<(), ScoutError> {
    if args.message.trim().is_empty() {
        return Err(ScoutError::InvalidArgument("message must not be empty".into()));
    }
    let config = ScoutConfig::load(args.config.as_deref())?;
    config.validate()?;

    let service = ChatService::from_config(&config)?;
    let mut stream = service.stream_chat(args.message, args.checkpoint_id);

    let mut stdout = std::io::stdout();
    while let Some(event) = stream.next().await {
        let frame = event.to_sse_frame();
        if stdout.write_all(&frame).and_then(|_| stdout.flush()).is_err() {
            break;
        }
    }
    Ok(())
}
