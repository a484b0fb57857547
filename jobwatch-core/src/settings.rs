use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// User-editable settings, re-read on every heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Polling period in minutes.
    #[serde(default)]
    pub notify_interval: Option<u32>,
    /// Whether system notifications may be shown.
    #[serde(default = "default_notifications")]
    pub notifications: bool,
}

fn default_notifications() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notify_interval: None,
            notifications: default_notifications(),
        }
    }
}

impl Settings {
    /// The configured interval, if it is a usable value (at least one minute).
    pub fn interval_minutes(&self) -> Option<u32> {
        self.notify_interval.filter(|minutes| *minutes >= 1)
    }
}

pub trait SettingsSource {
    fn current(&self) -> Settings;

    /// Picks up external edits. Called once per heartbeat before [`current`](Self::current).
    fn refresh(&self) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn notify_interval(&self) -> Option<u32> {
        self.current().interval_minutes()
    }

    fn notifications_enabled(&self) -> bool {
        self.current().notifications
    }
}

/// Settings backed by `settings.json`. A missing file means "nothing configured".
///
/// The file is read on [`refresh`](SettingsSource::refresh); clones share the
/// last value read.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    cached: Arc<RwLock<Settings>>,
}

impl FileSettings {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cached: Arc::new(RwLock::new(Settings::default())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Settings {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(error = %e, path = %self.path.display(), "no settings file");
                return Settings::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "unreadable settings file");
                Settings::default()
            }
        }
    }
}

impl SettingsSource for FileSettings {
    fn current(&self) -> Settings {
        self.cached
            .read()
            .map(|cached| cached.clone())
            .unwrap_or_default()
    }

    async fn refresh(&self) {
        let settings = self.read().await;
        if let Ok(mut cached) = self.cached.write() {
            *cached = settings;
        }
    }
}

/// In-process settings, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    inner: Arc<RwLock<Settings>>,
}

impl MemorySettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn set_interval(&self, minutes: Option<u32>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.notify_interval = minutes;
        }
    }
}

impl SettingsSource for MemorySettings {
    fn current(&self) -> Settings {
        self.inner
            .read()
            .map(|inner| inner.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "jobwatch_settings_{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        path
    }

    #[tokio::test]
    async fn file_settings_use_camel_case_keys() {
        let path = temp_settings_path();
        tokio::fs::write(&path, r#"{"notifyInterval": 5, "notifications": false}"#)
            .await
            .unwrap();

        let settings = FileSettings::new(&path);
        settings.refresh().await;
        assert_eq!(settings.notify_interval(), Some(5));
        assert!(!settings.notifications_enabled());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn edits_are_seen_by_clones_only_after_refresh() {
        let path = temp_settings_path();
        tokio::fs::write(&path, r#"{"notifyInterval": 5}"#).await.unwrap();

        let settings = FileSettings::new(&path);
        let surface_view = settings.clone();
        assert_eq!(surface_view.notify_interval(), None);

        settings.refresh().await;
        assert_eq!(surface_view.notify_interval(), Some(5));

        tokio::fs::write(&path, r#"{"notifyInterval": 10}"#).await.unwrap();
        assert_eq!(surface_view.notify_interval(), Some(5));
        settings.refresh().await;
        assert_eq!(surface_view.notify_interval(), Some(10));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_file_and_zero_interval_mean_unset() {
        let settings = FileSettings::new("/nonexistent/jobwatch/settings.json");
        settings.refresh().await;
        assert_eq!(settings.notify_interval(), None);
        assert!(settings.notifications_enabled());

        let memory = MemorySettings::new(Settings {
            notify_interval: Some(0),
            notifications: true,
        });
        assert_eq!(memory.notify_interval(), None);
    }
}
