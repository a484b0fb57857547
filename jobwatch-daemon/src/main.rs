use jobwatch_core::{
    AppConfig, Daemon, DesktopSurface, FileSettings, JobsClient, Notifier, Poller, Store,
    TokioScheduler,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::load();
    let store = Store::load_from(AppConfig::store_file_path()?).await;
    let settings = FileSettings::new(AppConfig::settings_file_path()?);
    info!(
        store = ?store.path(),
        settings = %settings.path().display(),
        "starting job watcher"
    );

    let client = JobsClient::new(&config.api)?;
    let poller = Poller::new(client, store.clone(), config.poll);
    let (surface, clicks) = DesktopSurface::new(config.notifications.clone(), settings.clone());
    let notifier = Notifier::new(surface, store);
    let (scheduler, alarms) = TokioScheduler::new(4);

    let daemon = Daemon::new(
        poller,
        notifier,
        settings,
        scheduler,
        config.poll.settings_check_period(),
    );
    daemon
        .run(alarms, clicks, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("job watcher stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
