//! Watch mode.
//!
//! ```text
//! notify ──▶ bridge thread ──▶ Debouncer ──▶ classify ──▶ BuildOrchestrator
//!                               (timing)     (ChangeSet)   (incremental)
//! ```
//!
//! The watcher is attached before the initial build so edits made while it
//! runs are not lost. Builds run one at a time; Ctrl+C is honoured between
//! them.

mod debouncer;
mod roots;

use debouncer::Debouncer;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use crate::build::{BuildError, BuildOrchestrator, BuildReport};
use crate::config::SiteConfig;
use crate::core::is_shutdown;
use crate::logger::{status_error, status_success};
use crate::reload::classify;
use crate::{debug, log};
use roots::WatchRoots;

/// File watcher feeding incremental builds.
pub struct SiteWatcher {
    /// Must stay alive for events to flow.
    watcher: RecommendedWatcher,
    roots: WatchRoots,
    events: mpsc::Receiver<notify::Event>,
}

impl SiteWatcher {
    /// Start watching every source root of `config`.
    ///
    /// Events buffer in the channel until [`run`](Self::run) consumes them.
    pub fn new(config: &SiteConfig) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut roots = WatchRoots::from_config(config);
        roots.attach_existing(&mut watcher)?;

        // notify delivers on its own thread; bridge into the async side
        let (tx, events) = mpsc::channel::<notify::Event>(256);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        Ok(Self {
            watcher,
            roots,
            events,
        })
    }

    /// Initial full build, then incremental builds until `shutdown` fires.
    ///
    /// Build errors are shown and watching continues, except in strict mode
    /// where they end the loop.
    pub async fn run(
        self,
        orchestrator: &mut BuildOrchestrator,
        mut shutdown: mpsc::UnboundedReceiver<()>,
    ) -> Result<(), BuildError> {
        let Self {
            mut watcher,
            mut roots,
            mut events,
        } = self;

        let initial = orchestrator.full().await.map(Some);
        let mut healthy = show(orchestrator, initial)?;
        log!("watch"; "watching {} for changes", crate::utils::plural_count(roots.len(), "root"));

        let mut debouncer = Debouncer::new(orchestrator.config().watch.debounce());

        loop {
            let sleep = debouncer.sleep_duration(Instant::now());
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                event = events.recv() => match event {
                    Some(event) => debouncer.observe(&event, Instant::now()),
                    None => break,
                },
                _ = sleep_for(sleep) => {
                    roots.maintain(&mut watcher);
                    let Some(paths) = debouncer.poll(Instant::now()) else {
                        continue;
                    };

                    let result = rebuild(orchestrator, &paths, healthy).await;
                    healthy = show(orchestrator, result)?;

                    // events that arrived mid-build are queued for the next window
                    while let Ok(event) = events.try_recv() {
                        debouncer.observe(&event, Instant::now());
                    }
                    debouncer.finish(Instant::now());

                    let config = orchestrator.config();
                    debouncer.set_window(config.watch.debounce());
                    roots.update(&config, &mut watcher);

                    if is_shutdown() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

async fn sleep_for(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Build one debounced batch.
///
/// After a fatal error the next batch reloads the config and retries a full
/// build, whatever changed. `Ok(None)` when the batch touched nothing the
/// site uses.
async fn rebuild(
    orchestrator: &mut BuildOrchestrator,
    paths: &[PathBuf],
    healthy: bool,
) -> Result<Option<BuildReport>, BuildError> {
    if !healthy {
        debug!("watch"; "retrying full build after change");
        return orchestrator.recover().await.map(Some);
    }

    let changes = classify(paths, &orchestrator.classify_roots());
    if changes.is_empty() {
        debug!("watch"; "nothing to rebuild for {}", crate::utils::plural_count(paths.len(), "path"));
        return Ok(None);
    }
    log!("watch"; "{}", changes.summary());
    orchestrator.incremental(&changes).await.map(Some)
}

/// Show a build result in the status block. Returns whether the site is in
/// a consistent state, or the error itself when the mode is strict. Under
/// `--strict` a report with page failures is an error too.
fn show(
    orchestrator: &BuildOrchestrator,
    result: Result<Option<BuildReport>, BuildError>,
) -> Result<bool, BuildError> {
    let mode = orchestrator.mode();
    match result {
        Ok(None) => Ok(true),
        Ok(Some(report)) if report.is_ok() => {
            status_success(&report.summary());
            Ok(true)
        }
        Ok(Some(report)) => {
            status_error(&report.summary(), &report.failure_details());
            if mode.strict {
                report.ensure_ok(mode)?;
            }
            Ok(true)
        }
        Err(err) if mode.fails_on_error() => Err(err),
        Err(err) => {
            status_error("build failed", &format!("{:#}", anyhow::Error::from(err)));
            Ok(false)
        }
    }
}
