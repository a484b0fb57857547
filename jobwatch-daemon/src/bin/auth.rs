//! Walks through the authorization handshake once and greets the authorized user.
//!
//! The access credential is written to the shared store, where `jobwatchd` picks it up.

use std::io;

use jobwatch_core::{AppConfig, AuthError, AuthFlow, JobsClient, Store};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AuthError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = AppConfig::load();
    let store = Store::load_from(AppConfig::store_file_path()?).await;
    let api = JobsClient::new(&config.api)?;

    let access = match store.access().await {
        Some(access) => {
            debug!("using stored access credential");
            access
        }
        None => {
            let flow = AuthFlow::new(&config.oauth)?;
            let access = flow.prompt(&mut io::stdin().lock(), &mut io::stdout()).await?;
            debug!("access credential obtained");
            store.set_access(&access).await?;
            access
        }
    };

    let info = api.user_info(&access).await?;
    println!("Hello: {}", info.auth_user.first_name);
    Ok(())
}
