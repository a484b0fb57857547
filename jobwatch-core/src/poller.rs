use std::cmp::Reverse;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::{JobQuery, JobsClient};
use crate::config::PollConfig;
use crate::error::PollError;
use crate::job::Job;
use crate::storage::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingFeeds,
    MissingAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Preconditions were not met; nothing was requested or written.
    Skipped(SkipReason),
    /// Another cycle was still running.
    Busy,
    Completed { new_jobs: usize, cached: usize },
}

impl PollOutcome {
    pub fn new_jobs(&self) -> usize {
        match self {
            PollOutcome::Completed { new_jobs, .. } => *new_jobs,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub cache: Vec<Job>,
    pub new_jobs: usize,
}

/// Merges a downloaded page into the cache.
///
/// Jobs matching anything already in the cache, favorites or trash are dropped.
/// The rest are flagged new and pushed to the front, the list is cut to `limit`
/// by position, then the whole list is re-sorted newest first. Jobs without a
/// parseable creation stamp sort last.
pub fn reconcile(
    mut cache: Vec<Job>,
    favorites: &[Job],
    trash: &[Job],
    downloaded: Vec<Job>,
    limit: usize,
) -> Reconciled {
    let fresh: Vec<Job> = downloaded
        .into_iter()
        .filter(|job| {
            !cache
                .iter()
                .chain(favorites)
                .chain(trash)
                .any(|known| known.same_listing(job))
        })
        .map(|mut job| {
            job.is_new = true;
            job
        })
        .collect();

    let new_jobs = fresh.len();
    let mut merged: Vec<Job> = fresh.into_iter().rev().collect();
    merged.append(&mut cache);
    merged.truncate(limit);
    merged.sort_by_key(|job| Reverse(job.created_at()));

    Reconciled {
        cache: merged,
        new_jobs,
    }
}

/// One poll cycle: fetch, reconcile against local lists, persist the cache.
#[derive(Debug, Clone)]
pub struct Poller {
    client: JobsClient,
    store: Store,
    config: PollConfig,
    busy: Arc<Mutex<()>>,
}

impl Poller {
    pub fn new(client: JobsClient, store: Store, config: PollConfig) -> Self {
        Self {
            client,
            store,
            config,
            busy: Arc::new(Mutex::new(())),
        }
    }

    pub async fn poll_once(&self) -> Result<PollOutcome, PollError> {
        let Ok(_guard) = self.busy.try_lock() else {
            debug!("poll cycle already running, skipping");
            return Ok(PollOutcome::Busy);
        };

        self.store.reload().await;
        let Some(feeds) = self.store.feeds().await else {
            debug!("no feed query configured");
            return Ok(PollOutcome::Skipped(SkipReason::MissingFeeds));
        };
        let Some(access) = self.store.access().await else {
            debug!("no access credential stored");
            return Ok(PollOutcome::Skipped(SkipReason::MissingAccess));
        };

        let query = JobQuery {
            query: &feeds.query,
            start: 0,
            end: self.config.page_size,
        };
        let downloaded = self.client.search_jobs(&access, &query).await?;

        let favorites = self.store.favorites().await;
        let trash = self.store.trash().await;
        let cache = self.store.cache().await;
        let Reconciled { cache, new_jobs } =
            reconcile(cache, &favorites, &trash, downloaded, self.config.cache_limit);

        self.store.set_cache(&cache).await?;
        info!(new_jobs, cached = cache.len(), "poll cycle complete");
        Ok(PollOutcome::Completed {
            new_jobs,
            cached: cache.len(),
        })
    }
}
