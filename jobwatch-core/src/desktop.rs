use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use notify_rust::Notification;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::config::NotificationConfig;
use crate::error::NotifyError;
use crate::notifier::{NotificationSurface, PopupMessage};
use crate::settings::SettingsSource;

/// Desktop notifications through notify-rust.
///
/// The "popup" is any in-process listener subscribed through [`DesktopSurface::subscribe_popup`];
/// it counts as open while at least one receiver is alive. Clicks on a shown
/// notification come back as its key on the receiver returned by [`DesktopSurface::new`].
pub struct DesktopSurface<S> {
    config: NotificationConfig,
    settings: S,
    popup: broadcast::Sender<PopupMessage>,
    #[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
    clicks: mpsc::UnboundedSender<String>,
    #[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
    bubbles: Bubbles,
}

/// Server ids of shown notifications per key.
///
/// A repeated key replaces its bubble in place, and the server keeps the id, so
/// the waiter started for the first bubble also receives clicks on its
/// replacements. At most one waiter listens per key.
#[derive(Debug, Default)]
#[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
struct Bubbles {
    entries: Mutex<HashMap<String, Bubble>>,
}

#[derive(Debug)]
#[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
struct Bubble {
    id: u32,
    waiting: Arc<AtomicBool>,
}

#[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
impl Bubbles {
    fn id(&self, key: &str) -> Option<u32> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).map(|bubble| bubble.id))
    }

    /// Records that `id` is on screen for `key`. Returns the liveness flag for a
    /// new click waiter, or `None` while a waiter for that same id is still listening.
    fn shown(&self, key: &str, id: u32) -> Option<Arc<AtomicBool>> {
        let mut entries = self.entries.lock().ok()?;
        if let Some(bubble) = entries.get(key) {
            if bubble.id == id && bubble.waiting.load(Ordering::Acquire) {
                return None;
            }
        }
        let waiting = Arc::new(AtomicBool::new(true));
        entries.insert(
            key.to_owned(),
            Bubble {
                id,
                waiting: Arc::clone(&waiting),
            },
        );
        Some(waiting)
    }
}

impl<S: SettingsSource> DesktopSurface<S> {
    pub fn new(config: NotificationConfig, settings: S) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (popup, _) = broadcast::channel(16);
        let (clicks, click_rx) = mpsc::unbounded_channel();
        (
            Self {
                config,
                settings,
                popup,
                clicks,
                bubbles: Bubbles::default(),
            },
            click_rx,
        )
    }

    pub fn subscribe_popup(&self) -> broadcast::Receiver<PopupMessage> {
        self.popup.subscribe()
    }

    fn build(&self, title: &str, body: &str) -> Notification {
        let mut notification = Notification::new();
        notification
            .appname(&self.config.app_name)
            .summary(title)
            .body(body)
            .action("default", "Open");
        if let Some(icon) = &self.config.icon {
            notification.icon(icon);
        }
        notification
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn watch_clicks(&self, key: &str, handle: notify_rust::NotificationHandle) {
        let Some(waiting) = self.bubbles.shown(key, handle.id()) else {
            debug!(key, "click waiter already listening");
            return;
        };
        let clicks = self.clicks.clone();
        let key = key.to_owned();
        std::thread::spawn(move || {
            handle.wait_for_action(|action| {
                if action == "default" && clicks.send(key).is_err() {
                    tracing::warn!("notification click arrived after shutdown");
                }
            });
            waiting.store(false, Ordering::Release);
        });
    }
}

impl<S: SettingsSource> NotificationSurface for DesktopSurface<S> {
    fn popup_open(&self) -> bool {
        self.popup.receiver_count() > 0
    }

    fn post_to_popup(&self, message: PopupMessage) {
        if self.popup.send(message).is_err() {
            debug!("popup closed before message delivery");
        }
    }

    fn permission_granted(&self) -> bool {
        self.settings.notifications_enabled()
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn show(&self, key: &str, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut notification = self.build(title, body);
        if let Some(id) = self.bubbles.id(key) {
            notification.id(id);
        }
        let handle = notification
            .show()
            .map_err(|e| NotifyError::Desktop(e.to_string()))?;
        self.watch_clicks(key, handle);
        Ok(())
    }

    // Action callbacks are only delivered by the freedesktop backend.
    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn show(&self, _key: &str, title: &str, body: &str) -> Result<(), NotifyError> {
        self.build(title, body)
            .show()
            .map_err(|e| NotifyError::Desktop(e.to_string()))?;
        Ok(())
    }

    fn open_primary_ui(&self) -> Result<(), NotifyError> {
        let url = &self.config.popup_url;
        webbrowser::open(url).map_err(|source| NotifyError::Browser {
            url: url.clone(),
            source,
        })
    }
}
