use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::NotifyError;
use crate::storage::Store;

/// Messages delivered to an open popup instead of a system notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PopupMessage {
    NewJobs,
}

/// Where new-job signals end up.
pub trait NotificationSurface {
    fn popup_open(&self) -> bool;

    fn post_to_popup(&self, message: PopupMessage);

    fn permission_granted(&self) -> bool;

    /// Shows (or replaces) the notification identified by `key`.
    fn show(&self, key: &str, title: &str, body: &str) -> Result<(), NotifyError>;

    fn open_primary_ui(&self) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Suppressed,
    Popup,
    System { shown: bool },
}

pub struct Notifier<S> {
    surface: S,
    store: Store,
    previous: usize,
}

impl<S: NotificationSurface> Notifier<S> {
    pub fn new(surface: S, store: Store) -> Self {
        Self {
            surface,
            store,
            previous: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn previous_count(&self) -> usize {
        self.previous
    }

    /// Signals `count` new jobs unless it is zero or the same count was signalled last.
    pub async fn notify(&mut self, count: usize) -> Result<NotifyOutcome, NotifyError> {
        if count == 0 || count == self.previous {
            debug!(count, "notification suppressed");
            return Ok(NotifyOutcome::Suppressed);
        }
        self.previous = count;

        if self.surface.popup_open() {
            self.surface.post_to_popup(PopupMessage::NewJobs);
            return Ok(NotifyOutcome::Popup);
        }

        let mut shown = false;
        if self.surface.permission_granted() {
            match self.store.feeds().await {
                Some(feeds) => {
                    let key = feeds.identifier();
                    let body = format!("You have new {count} vacancies");
                    self.surface.show(&key, &key, &body)?;
                    info!(count, key = %key, "notification shown");
                    shown = true;
                }
                None => warn!("no feed configured, notification skipped"),
            }
        }
        self.store.set_badge(&count.to_string()).await?;
        Ok(NotifyOutcome::System { shown })
    }

    /// Opens the primary UI when a notification for the configured feed is clicked.
    pub async fn handle_click(&self, key: &str) -> Result<bool, NotifyError> {
        let matches = self
            .store
            .feeds()
            .await
            .is_some_and(|feeds| feeds.identifier() == key);
        if !matches {
            debug!(key, "ignoring click on unknown notification");
            return Ok(false);
        }
        self.surface.open_primary_ui()?;
        Ok(true)
    }
}
