use std::time::Duration;

use anyhow::Result;
use collection::poller::Poller;
use storage::event_store::{EventStore, FileEventStore};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    config::Config,
    utils::clock::{Clock, DefaultClock},
    window_api::{GenericWindowManager, WindowManager},
};

pub mod args;
pub mod collection;
pub mod shutdown;
pub mod storage;

/// Prepares the activity store without starting to poll.
pub async fn initialize_store(config: &Config) -> Result<FileEventStore> {
    let store = FileEventStore::new(config.store_dir.clone(), Box::new(DefaultClock));
    store.initialize().await?;
    info!("Activity store ready at {:?}", store.record_dir());
    Ok(store)
}

/// Represents the starting point for the logger. Returns after Ctrl-C.
pub async fn start_logger(config: &Config) -> Result<()> {
    let store = initialize_store(config).await?;
    let manager = GenericWindowManager::new()?;

    let shutdown_token = CancellationToken::new();

    let poller = create_poller(
        store,
        manager,
        &shutdown_token,
        config.poll_interval,
        DefaultClock,
    );

    tokio::join!(shutdown::detect_shutdown(shutdown_token), poller.run());

    Ok(())
}

fn create_poller<S: EventStore>(
    store: S,
    manager: impl WindowManager + 'static,
    shutdown_token: &CancellationToken,
    poll_interval: Duration,
    clock: impl Clock,
) -> Poller<S> {
    Poller::new(
        store,
        Box::new(manager),
        shutdown_token.clone(),
        poll_interval,
        Box::new(clock),
    )
}
