use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::PollError;
use crate::notifier::{NotificationSurface, Notifier, NotifyOutcome};
use crate::poller::{PollOutcome, Poller};
use crate::scheduler::{Alarm, Scheduler};
use crate::settings::SettingsSource;
use crate::watcher::SettingsWatcher;

/// Everything one running instance needs: the alarms it owns, the poller, the
/// notifier and its suppression state. Independent instances do not share state.
pub struct Daemon<N, C, T> {
    poller: Poller,
    notifier: Notifier<N>,
    watcher: SettingsWatcher,
    settings: C,
    scheduler: T,
    heartbeat: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub poll: PollOutcome,
    pub notification: Option<NotifyOutcome>,
}

impl<N, C, T> Daemon<N, C, T>
where
    N: NotificationSurface,
    C: SettingsSource,
    T: Scheduler,
{
    pub fn new(
        poller: Poller,
        notifier: Notifier<N>,
        settings: C,
        scheduler: T,
        heartbeat: Duration,
    ) -> Self {
        Self {
            poller,
            notifier,
            watcher: SettingsWatcher::new(),
            settings,
            scheduler,
            heartbeat,
        }
    }

    pub fn notifier(&self) -> &Notifier<N> {
        &self.notifier
    }

    pub fn watcher(&self) -> &SettingsWatcher {
        &self.watcher
    }

    /// Applies the current settings and arms the settings heartbeat.
    pub async fn start(&mut self) {
        self.check_settings().await;
        self.scheduler.schedule(Alarm::SettingsWatch, self.heartbeat);
    }

    pub async fn check_settings(&mut self) -> bool {
        self.settings.refresh().await;
        self.watcher.check(&self.settings, &mut self.scheduler)
    }

    /// Fetch, reconcile, persist, notify.
    pub async fn check_new_jobs(&mut self) -> Result<CycleReport, PollError> {
        let poll = self.poller.poll_once().await?;
        let notification = match poll {
            PollOutcome::Completed { new_jobs, .. } => match self.notifier.notify(new_jobs).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!(error = %e, "failed to signal new jobs");
                    None
                }
            },
            _ => None,
        };
        Ok(CycleReport { poll, notification })
    }

    pub async fn handle_alarm(&mut self, alarm: Alarm) {
        debug!(alarm = alarm.name(), "alarm fired");
        match alarm {
            Alarm::SettingsWatch => {
                self.check_settings().await;
            }
            Alarm::NewJobs => {
                if let Err(e) = self.check_new_jobs().await {
                    warn!(error = %e, "poll cycle failed");
                }
            }
        }
    }

    pub async fn handle_click(&self, key: &str) {
        if let Err(e) = self.notifier.handle_click(key).await {
            warn!(error = %e, key, "failed to open the job list");
        }
    }

    /// Runs until `shutdown` resolves or the alarm channel closes.
    pub async fn run<F>(
        mut self,
        mut alarms: mpsc::Receiver<Alarm>,
        mut clicks: mpsc::UnboundedReceiver<String>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        self.start().await;
        tokio::pin!(shutdown);
        let mut clicks_open = true;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("daemon shutdown requested");
                    break;
                }
                alarm = alarms.recv() => match alarm {
                    Some(alarm) => self.handle_alarm(alarm).await,
                    None => {
                        warn!("alarm channel closed");
                        break;
                    }
                },
                key = clicks.recv(), if clicks_open => match key {
                    Some(key) => self.handle_click(&key).await,
                    None => clicks_open = false,
                },
            }
        }

        self.scheduler.cancel(Alarm::NewJobs);
        self.scheduler.cancel(Alarm::SettingsWatch);
    }
}
