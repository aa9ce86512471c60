use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use photobridge::common::config::{
    apply_overrides, config_path, load_config, BridgeConfig, ConfigOverrides,
};
use photobridge::pairing::{qr, Bridge, PairingError};
use photobridge::{output, ListenerStatus, UploadEvent};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "photobridge")]
#[command(about = "Receive a photo from a phone on the local network")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a pairing code and wait for one photo
    Capture {
        #[arg(help = "File name the photo is saved under")]
        target: String,
        #[arg(long, help = "Directory for photos and QR images")]
        dir: Option<PathBuf>,
        #[arg(long, help = "Listener port (0 for any free port)")]
        port: Option<u16>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the resolved configuration
    Show,
}

fn init_tracing() {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter_layer)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Capture { target, dir, port } => {
            let overrides = ConfigOverrides {
                save_dir: dir,
                port,
            };
            let config = apply_overrides(load_config()?, &overrides);
            capture(config, &target).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Path => {
                println!("{}", config_path().display());
                Ok(())
            }
            ConfigAction::Show => {
                let config = load_config()?;
                let rendered =
                    toml::to_string_pretty(&config).context("Failed to serialize config")?;
                print!("{rendered}");
                Ok(())
            }
        },
    }
}

async fn capture(config: BridgeConfig, target: &str) -> Result<()> {
    let bridge = Bridge::new(config)?;

    // Completions arrive on the listener task; consume them here, on our own loop
    let (events, mut completions) = mpsc::unbounded_channel::<UploadEvent>();

    let url = match bridge.start_session(target, events) {
        Ok(pairing) => {
            if let ListenerStatus::Failed { reason } = &pairing.listener {
                output::warning(&format!("Upload listener is not running: {reason}"));
            }
            println!("QR image: {}", pairing.qr_image_path.display());
            pairing.url
        }
        Err(PairingError::QrRender { url, source }) => {
            output::warning(&format!("No QR image: {source:#}"));
            url
        }
        Err(err) => return Err(err.into()),
    };

    match qr::generate_qr(&url) {
        Ok(code) => println!("{code}"),
        Err(err) => tracing::warn!("Terminal QR unavailable: {:#}", err),
    }
    println!("Scan the code or open {url}");

    let waiting = output::spinner("Waiting for photo...");
    tokio::select! {
        event = completions.recv() => match event {
            Some(event) => output::spinner_success(
                &waiting,
                &format!("Saved {} ({} bytes)", event.saved_path.display(), event.bytes),
            ),
            None => output::spinner_error(&waiting, "Session closed before a photo arrived"),
        },
        _ = tokio::signal::ctrl_c() => {
            output::spinner_error(&waiting, "Cancelled");
        }
    }

    bridge.shutdown();
    Ok(())
}
