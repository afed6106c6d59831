use super::activity_server::ActivityServer;
use crate::view::{NoticeKind, Notifier};
use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_secs(2);

impl ActivityServer {
    /// Reload the activity store whenever its data file changes.
    pub async fn start_file_watching(&self) -> Result<()> {
        let Some(data_path) = self.store.source().map(Path::to_path_buf) else {
            tracing::warn!("No data file available for file watching");
            return Ok(());
        };

        tracing::info!("Starting file watch for: {}", data_path.display());

        let (tx, mut rx) = mpsc::channel::<EventKind>(100);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.blocking_send(event.kind);
                }
            },
            Config::default(),
        )
        .context("Failed to create file watcher")?;

        // A missing file is watched through its parent directory
        let watch_path = if data_path.exists() {
            data_path.clone()
        } else {
            let parent = data_path.parent().unwrap_or(Path::new(".")).to_path_buf();
            tracing::info!(
                "Data file doesn't exist, watching parent directory: {}",
                parent.display()
            );
            parent
        };

        watcher
            .watch(&watch_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch path {}", watch_path.display()))?;

        let server = self.clone();
        tokio::spawn(async move {
            // Owned by the task so the watch lives as long as the reload loop
            let _watcher = watcher;
            let mut last_event = Instant::now();
            let mut pending_reload = false;

            loop {
                tokio::select! {
                    event_kind = rx.recv() => {
                        match event_kind {
                            Some(EventKind::Remove(_)) => {
                                tracing::info!("Data file removed, waiting for recreation");
                                pending_reload = false;
                            }
                            Some(_) => {
                                tracing::debug!("Data file changed, scheduling reload");
                                last_event = Instant::now();
                                pending_reload = true;
                            }
                            None => {
                                tracing::warn!("File watcher channel closed");
                                break;
                            }
                        }
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        if pending_reload && last_event.elapsed() > DEBOUNCE {
                            pending_reload = false;
                            if !data_path.exists() {
                                tracing::warn!("Data file does not exist, skipping reload");
                                continue;
                            }
                            match server.store.reload().await {
                                Ok(count) => server.notices.notify(
                                    NoticeKind::Info,
                                    &format!("Activity data reloaded ({count} records)"),
                                ),
                                Err(e) => tracing::error!("Failed to reload activity data: {e:#}"),
                            }
                        }
                    }
                }
            }
        });

        tracing::info!("File watching started successfully");
        Ok(())
    }
}
