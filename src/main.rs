use std::time::Duration;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use tokio::sync::mpsc;

use dropmail::prelude::*;

#[derive(Parser)]
#[command(name = "dropmail", about = "Disposable-inbox client", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mint a fresh random mailbox and watch it for incoming messages
    Create,
    /// Attach to an existing mailbox address and watch it
    Watch {
        #[arg(long)]
        address: String,
    },
    /// List the domains the provider currently issues addresses under
    Domains,
}

#[tokio::main]
async fn main() -> ClientResult<()> {
    let cli = Cli::parse();
    let settings = Settings::new(cli.config.as_deref())?;

    env_logger::Builder::from_env(Env::default().default_filter_or(&settings.log.level)).init();

    let client = Client::from_settings(&settings);

    match cli.command {
        Command::Create => {
            let session = client.create().await?;
            watch(&session, &settings).await
        }
        Command::Watch { address } => {
            let session = client.login(&address).await?;
            watch(&session, &settings).await
        }
        Command::Domains => {
            for domain in client.gateway().active_domains().await? {
                println!("{}", domain);
            }
            Ok(())
        }
    }
}

/// Polls the mailbox until Ctrl-C, printing each new message as it
/// arrives and reading its body.
async fn watch(session: &MailboxSession, settings: &Settings) -> ClientResult<()> {
    let address = session
        .address()
        .await
        .ok_or_else(|| ClientError::InvalidState("session has no address".to_string()))?;
    println!("watching {}", address);

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Message>>();
    session
        .listen(Duration::from_millis(settings.poll_interval_ms), move |batch| {
            // The loop only hands over non-empty batches; a closed
            // receiver just means we are shutting down.
            let _ = tx.send(batch);
        })
        .await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping listener");
                session.stop().await;
                return Ok(());
            }
            batch = rx.recv() => {
                let Some(batch) = batch else { return Ok(()) };
                for message in batch {
                    println!("[{}] {}: {}", message.date, message.from, message.subject);
                    match session.read(&message.local_id).await {
                        Ok(full) => {
                            if let Some(body) = full.body {
                                println!("{}", body.text);
                            }
                        }
                        Err(e) => warn!("failed to read message {}: {}", message.local_id, e),
                    }
                }
            }
        }
    }
}
