//! Interactive probe for the capture server control channel.
//!
//! Reads one command per line from stdin (e.g. `GlassesStatus` or
//! `StartStreaming:NoNote:0:Camera:Phone`), sends it and prints the outcome.
//! `exit` or end of input quits.
//!
//! ```text
//! control_probe [config.yaml]
//! ```

use anyhow::{Context, Result};
use gesture_recorder::{Command, ControlChannel, ControlTransport, RecorderConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RecorderConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => RecorderConfig::default(),
    };

    let channel = ControlChannel::from_config(&config.control)
        .await
        .with_context(|| format!("connecting to {}", config.control.endpoint()))?;
    info!(endpoint = %channel.endpoint(), timeout = ?channel.timeout(), "Ready; one command per line");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match line.trim() {
            "" => continue,
            "exit" => break,
            _ => {}
        }
        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        let outcome = channel.request(&command).await;
        println!("{command} -> {outcome:?}");
    }

    Ok(())
}
