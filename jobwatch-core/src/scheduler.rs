//! Named repeating alarms.
//!
//! The daemon never sleeps itself: it asks a [`Scheduler`] for alarms and reacts
//! to them as they arrive, which keeps interval changes observable in tests.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alarm {
    /// Heartbeat that re-reads the settings.
    SettingsWatch,
    /// Poll cycle.
    NewJobs,
}

impl Alarm {
    pub fn name(self) -> &'static str {
        match self {
            Alarm::SettingsWatch => "settingsWatch",
            Alarm::NewJobs => "newJobsNotifier",
        }
    }
}

pub trait Scheduler {
    /// Creates (or replaces) a repeating alarm. The first firing happens one period from now.
    fn schedule(&mut self, alarm: Alarm, period: Duration);

    /// Returns whether an alarm was actually cancelled.
    fn cancel(&mut self, alarm: Alarm) -> bool;
}

struct TimerHandle {
    period: Duration,
    join: JoinHandle<()>,
}

/// Alarms as tokio tasks that deliver into a bounded channel.
///
/// A tick that finds the channel full is dropped rather than queued, so a slow
/// consumer never accumulates a backlog of poll cycles.
pub struct TokioScheduler {
    tx: mpsc::Sender<Alarm>,
    timers: HashMap<Alarm, TimerHandle>,
}

impl TokioScheduler {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Alarm>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                timers: HashMap::new(),
            },
            rx,
        )
    }

    pub fn period(&self, alarm: Alarm) -> Option<Duration> {
        self.timers.get(&alarm).map(|timer| timer.period)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, alarm: Alarm, period: Duration) {
        self.cancel(alarm);
        let tx = self.tx.clone();
        let join = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match tx.try_send(alarm) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(alarm = alarm.name(), "previous alarm still pending, skipping tick");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        });
        info!(alarm = alarm.name(), period_secs = period.as_secs(), "alarm scheduled");
        self.timers.insert(alarm, TimerHandle { period, join });
    }

    fn cancel(&mut self, alarm: Alarm) -> bool {
        match self.timers.remove(&alarm) {
            Some(timer) => {
                timer.join.abort();
                debug!(alarm = alarm.name(), "alarm cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.join.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_arrives_after_one_period() {
        let (mut scheduler, mut rx) = TokioScheduler::new(4);
        scheduler.schedule(Alarm::NewJobs, Duration::from_secs(300));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.recv().await, Some(Alarm::NewJobs));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_period() {
        let (mut scheduler, mut rx) = TokioScheduler::new(4);
        scheduler.schedule(Alarm::NewJobs, Duration::from_secs(300));
        scheduler.schedule(Alarm::NewJobs, Duration::from_secs(600));
        assert_eq!(scheduler.period(Alarm::NewJobs), Some(Duration::from_secs(600)));

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(rx.recv().await, Some(Alarm::NewJobs));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_alarm_stops_firing() {
        let (mut scheduler, mut rx) = TokioScheduler::new(4);
        scheduler.schedule(Alarm::SettingsWatch, Duration::from_secs(60));
        assert!(scheduler.cancel(Alarm::SettingsWatch));
        assert!(!scheduler.cancel(Alarm::SettingsWatch));

        tokio::time::sleep(Duration::from_secs(180)).await;
        assert!(rx.try_recv().is_err());
    }
}
