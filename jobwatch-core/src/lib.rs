pub mod api;
pub mod auth;
pub mod config;
pub mod daemon;
pub mod desktop;
pub mod error;
pub mod job;
pub mod messages;
pub mod notifier;
pub mod poller;
pub mod scheduler;
pub mod settings;
pub mod storage;
pub mod watcher;

pub use api::{JobQuery, JobsClient, UserInfo};
pub use auth::{AuthFlow, PendingAuthorization};
pub use config::{ApiConfig, AppConfig, NotificationConfig, OAuthConfig, PollConfig};
pub use daemon::{CycleReport, Daemon};
pub use desktop::DesktopSurface;
pub use error::{ApiError, AuthError, ConfigError, NotifyError, PollError, StoreError};
pub use job::{AccessCredential, FeedQuery, Job};
pub use notifier::{NotificationSurface, Notifier, NotifyOutcome, PopupMessage};
pub use poller::{reconcile, PollOutcome, Poller, Reconciled, SkipReason};
pub use scheduler::{Alarm, Scheduler, TokioScheduler};
pub use settings::{FileSettings, MemorySettings, Settings, SettingsSource};
pub use storage::Store;
pub use watcher::SettingsWatcher;
