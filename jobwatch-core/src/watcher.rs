use tracing::{debug, info};

use crate::config::minutes;
use crate::scheduler::{Alarm, Scheduler};
use crate::settings::SettingsSource;

/// Keeps the polling alarm in step with the configured interval.
#[derive(Debug, Default)]
pub struct SettingsWatcher {
    applied: Option<u32>,
}

impl SettingsWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied_interval(&self) -> Option<u32> {
        self.applied
    }

    /// Re-reads the interval and reschedules the polling alarm if it changed.
    /// Returns `true` when the alarm was (re)created.
    pub fn check<S, T>(&mut self, settings: &S, scheduler: &mut T) -> bool
    where
        S: SettingsSource + ?Sized,
        T: Scheduler + ?Sized,
    {
        let Some(interval) = settings.notify_interval() else {
            debug!("no polling interval configured");
            return false;
        };
        if self.applied == Some(interval) {
            return false;
        }

        info!(from = ?self.applied, to = interval, "polling interval changed");
        self.applied = Some(interval);
        scheduler.cancel(Alarm::NewJobs);
        scheduler.schedule(Alarm::NewJobs, minutes(interval));
        true
    }
}
