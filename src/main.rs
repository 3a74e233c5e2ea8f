use std::sync::Arc;

use anyhow::Context;
use matchvoice::config::Config;
use matchvoice::driver::{Driver, Services};
use matchvoice::engine::{ConsoleSynthesizer, StdinRecognizer};
use matchvoice::kernel::coordinator::Coordinator;
use matchvoice::services::favorites::InMemoryFavorites;
use matchvoice::services::lookup::{CatalogLookup, LookupHandler};
use matchvoice::services::remote_parser::{HttpRemoteParser, RemoteParser};
use matchvoice::services::status::TracingStatusSink;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!("Match voice booting...");

    let config = Config::from_env().context("invalid configuration")?;

    let lookup: Arc<dyn LookupHandler> = match &config.catalog {
        Some(path) => Arc::new(
            CatalogLookup::from_path(path)
                .with_context(|| format!("failed to load catalog {}", path.display()))?,
        ),
        None => {
            tracing::warn!("MATCHVOICE_CATALOG not set; every lookup will come back empty");
            Arc::new(CatalogLookup::default())
        }
    };

    let remote: Option<Arc<dyn RemoteParser>> = match &config.remote_parser {
        Some(remote) => Some(Arc::new(
            HttpRemoteParser::new(remote.url.clone(), remote.timeout)
                .context("failed to build remote parser client")?,
        )),
        None => None,
    };

    let (tx, rx) = mpsc::channel(256);

    let coordinator = Coordinator::new(
        config.timings,
        config.auto_listen,
        Box::new(InMemoryFavorites::default()),
        remote.is_some(),
    );
    let recognizer = StdinRecognizer::spawn(tx.clone());
    let synthesizer = ConsoleSynthesizer::new(tx.clone(), config.speech_wpm, config.tts_command.clone());

    let services = Services {
        lookup,
        remote,
        status: Arc::new(TracingStatusSink),
    };

    println!("Type a command and press Enter. Controls: :click :mic :stop :auto on|off :quit");
    let driver = Driver::new(
        rx,
        tx,
        coordinator,
        Box::new(recognizer),
        Box::new(synthesizer),
        services,
    );
    let snapshot = driver.run().await;

    if snapshot.overlaps > 0 {
        tracing::error!(overlaps = snapshot.overlaps, "Microphone was open while speaking");
    }
    Ok(())
}
