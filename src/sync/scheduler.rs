use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::commands;
use crate::error::TrackerError;
use crate::state::AppState;

/// Background work of an interactive session: the periodic unrealized
/// P/L refresh and the collection change listener.
#[derive(Clone)]
pub struct RefreshScheduler {
    state: Arc<AppState>,
    tasks: Arc<RwLock<Vec<JoinHandle<()>>>>,
}

impl RefreshScheduler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            tasks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Start both tasks, replacing any that are already running.
    pub async fn start(&self) -> Result<(), TrackerError> {
        self.stop_all_tasks().await;

        let settings = commands::get_settings(&self.state).await?;
        let interval = Duration::from_secs(settings.refresh_interval_secs.max(1) as u64);

        let refresh = self.spawn_refresh_task(interval);
        let listener = self.spawn_change_listener();

        let mut tasks = self.tasks.write().await;
        tasks.push(refresh);
        tasks.push(listener);
        Ok(())
    }

    fn spawn_refresh_task(&self, every: Duration) -> JoinHandle<()> {
        let state = self.state.clone();
        log::info!("Starting unrealized P/L refresh every {}s", every.as_secs());

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            loop {
                interval.tick().await;

                match commands::refresh_unrealized(&state).await {
                    Ok(outcome) => log::debug!(
                        "Refresh tick: {} updated, {} skipped",
                        outcome.entries.len(),
                        outcome.skipped.len()
                    ),
                    // Nothing to refresh until someone signs in.
                    Err(TrackerError::Unauthenticated(_)) => {}
                    Err(e) => log::warn!("Refresh tick failed: {}", e),
                }
            }
        })
    }

    fn spawn_change_listener(&self) -> JoinHandle<()> {
        let state = self.state.clone();
        let mut changes = state.repository.subscribe();

        tokio::spawn(async move {
            loop {
                let change = match changes.recv().await {
                    Ok(change) => change,
                    Err(RecvError::Lagged(missed)) => {
                        log::debug!("Change listener skipped {} notifications", missed);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                if let Err(e) = commands::reload_from_remote(&state, &change.user_id).await {
                    log::warn!("Failed to reload trades for {}: {}", change.user_id, e);
                }
            }
        })
    }

    async fn stop_all_tasks(&self) {
        let mut tasks = self.tasks.write().await;
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    pub async fn stop(&self) {
        self.stop_all_tasks().await;
        log::info!("Background tasks stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.tasks.read().await.iter().any(|task| !task.is_finished())
    }
}
