use crate::events::AppEvent;
use anyhow::Context;
use async_channel::Sender;
use std::thread;
use tokio::runtime::Runtime;

/// Spawns the background thread that drives the config watcher.
pub fn start_background_services(tx: Sender<AppEvent>) -> anyhow::Result<()> {
    let rt = Runtime::new().context("failed to create tokio runtime")?;

    thread::Builder::new()
        .name("shelf-background".into())
        .spawn(move || {
            rt.block_on(async {
                {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        crate::config::run_async_watcher(tx).await;
                    });
                }

                std::future::pending::<()>().await;
            });
        })
        .context("failed to spawn background thread")?;

    Ok(())
}
