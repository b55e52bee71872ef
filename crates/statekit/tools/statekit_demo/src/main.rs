use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use statekit::component::HandlerFuture;
use statekit::{
    Component, CoreError, Handlers, Layer, Observable, Signal, StateWaiter, StateWatcher,
    WatchOptions,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use statekit_demo::config::Config;

/// Pretends to open a connection; optionally never gets there.
struct Link {
    delay: Duration,
    broken: bool,
}

impl Handlers for Link {
    fn handle_connection(&self) -> HandlerFuture<'_> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            if self.broken {
                return Err(CoreError::handler_msg("peer refused the connection"));
            }
            Ok(())
        })
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_args();
    info!(
        "demo started components={} target={} timeout_ms={} fail_one={}",
        config.components,
        config.target,
        config.timeout.as_millis(),
        config.fail_one
    );

    let mut components = Vec::with_capacity(config.components);
    for i in 0..config.components {
        let component = Component::builder(format!("link-{i}"))
            .layer(Layer::Connectable)
            .handlers(Link {
                delay: Duration::from_millis(20 * (i as u64 + 1)),
                broken: config.fail_one && i == 0,
            })
            .build()
            .context("build component")?;
        components.push(Arc::new(component));
    }

    let watched: Vec<Arc<dyn Observable>> = components
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn Observable>)
        .collect();

    let watcher = StateWatcher::with_config("fleet", config.core.clone())
        .context("build watcher")?;
    watcher
        .initialize(WatchOptions::new(watched.clone()).target_state(config.target.label()))
        .await
        .context("initialize watcher")?;
    watcher.on(Signal::Synchronized, |_| info!("all components synchronized"));
    watcher.on(Signal::Desynchronized, |_| warn!("components desynchronized"));
    watcher.start().await.context("start watcher")?;

    let waiter = StateWaiter::with_config(config.core.clone())
        .watch_all(watched)
        .state_name(Some(config.target.label()))
        .timeout(Some(config.timeout));

    let mut tasks = Vec::new();
    for component in &components {
        let component = Arc::clone(component);
        tasks.push(tokio::spawn(async move {
            component.initialize().await?;
            component.connect().await
        }));
    }

    let outcome = waiter.wait().await;

    for task in tasks {
        if let Err(err) = task.await.context("join bring-up task")? {
            warn!("bring-up failed: {err}");
        }
    }

    watcher.stop().await.context("stop watcher")?;
    outcome.context("components did not settle")?;
    info!(
        "every component reached {} (synchronized={})",
        config.target,
        watcher.is_synchronized()
    );
    Ok(())
}
