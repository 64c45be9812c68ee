use log::{error, info};
use smilebot_relay::config::RelayConfig;
use smilebot_relay::error::{RelayError, RelayResult};
use smilebot_relay::sector::Sector;
use smilebot_relay::server::{self, Relay};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("[relay] Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> RelayResult<()> {
    let config = RelayConfig::load()?;

    // Local storage needs its directory before the first upload arrives;
    // failing to create it is fatal, same as a port collision.
    if config.remote_storage_url.is_none() {
        std::fs::create_dir_all(&config.upload_dir).map_err(|e| {
            RelayError::Config(format!(
                "Create upload directory {}: {}",
                config.upload_dir.display(),
                e
            ))
        })?;
    }

    let relay = Relay::new(config)?;

    let sectors: Vec<&str> = Sector::ALL.iter().map(|s| s.name()).collect();
    info!("[relay] Sectors: {}", sectors.join(", "));
    if !relay.fetch_ctx.generator_enabled() {
        info!("[relay] Assistant sector disabled (no generator endpoint configured)");
    }

    server::run(relay).await
}
