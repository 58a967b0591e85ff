/// Collapses concurrent upstream fetches for the same stage
use super::{CanonicalStage, Region};
use crate::upstream::FetchError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type FetchResult = Result<CanonicalStage, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;
type PendingMap = HashMap<(Region, String), SharedFetch>;

/// Map of pending fetches keyed by (region, stage id)
///
/// Each fetch runs on its own task and clears its entry when done, so a
/// fetch outlives callers that stop waiting for it.
#[derive(Default)]
pub struct InFlight {
    pending: Arc<Mutex<PendingMap>>,
}

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the pending fetch for `key`, or start one with `start`.
    pub async fn run<F>(&self, region: Region, stage_id: &str, start: F) -> FetchResult
    where
        F: FnOnce() -> BoxFuture<'static, FetchResult>,
    {
        let key = (region, stage_id.to_string());
        let fetch = {
            let mut pending = lock(&self.pending);
            match pending.get(&key) {
                Some(fetch) => fetch.clone(),
                None => {
                    let fetch = self.spawn(key.clone(), start());
                    pending.insert(key, fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Run `work` on a task that removes its own entry once finished.
    ///
    /// Must be called with the map locked, so the removal always follows the insert.
    fn spawn(&self, key: (Region, String), work: BoxFuture<'static, FetchResult>) -> SharedFetch {
        let pending = Arc::clone(&self.pending);
        let handle = tokio::spawn(async move {
            let result = work.await;
            lock(&pending).remove(&key);
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(FetchError::Upstream(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared()
    }

    /// Number of fetches currently pending
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
