use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use dcm_core::{attachments::AttachmentRelay, config::Config, pipeline};
use dcm_discord::DiscordClient;
use dcm_store::MessageStore;

#[tokio::main]
async fn main() {
    dcm_core::logging::init("dcm");

    if let Err(err) = run().await {
        error!(error = %err, "run failed");
        std::process::exit(1);
    }
}

/// Owns every resource for the run, so all guards (store directory, temp
/// files) drop before the process exits on either path.
async fn run() -> dcm_core::Result<()> {
    let cfg = Config::load()?;

    let chat = DiscordClient::new(&cfg.token, cfg.http_timeout)?;
    let relay = AttachmentRelay::new(cfg.http_timeout)?;
    let store = MessageStore::open(&cfg.store_path)?;

    // Ctrl-C stops the replay scan; messages already sent stay sent.
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    info!(channels = cfg.from.len(), to = %cfg.to, "mirror starting");
    pipeline::run(&chat, &store, &relay, &cfg.from, &cfg.to, cancel).await
}
