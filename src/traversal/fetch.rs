//! Batched concurrent content retrieval.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::RepoFileMap;
use crate::remote::{RemoteError, RemoteRepositoryClient};

/// Fetch the content of every path in fixed-size sequential batches.
///
/// Within a batch up to `max_workers` fetches run at once. A failed
/// fetch is logged and the path left out of the result; it never
/// cancels its siblings or aborts the run.
pub async fn fetch_all(
    client: &Arc<dyn RemoteRepositoryClient>,
    owner: &str,
    repo: &str,
    branch: &str,
    paths: &[String],
    batch_size: usize,
    max_workers: usize,
) -> RepoFileMap {
    let batch_size = batch_size.max(1);
    let total_batches = paths.len().div_ceil(batch_size);
    let mut files = RepoFileMap::new();

    for (index, batch) in paths.chunks(batch_size).enumerate() {
        tracing::info!(
            "processing batch {}/{} ({} files)",
            index + 1,
            total_batches,
            batch.len()
        );

        let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
        let mut join_set = JoinSet::new();

        for path in batch {
            let client = Arc::clone(client);
            let sem = Arc::clone(&semaphore);
            let owner = owner.to_string();
            let repo = repo.to_string();
            let branch = branch.to_string();
            let path = path.clone();

            join_set.spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return (path, Err(RemoteError::Transport("fetch pool closed".to_string())));
                };
                let result = client.fetch_content(&owner, &repo, &path, &branch).await;
                (path, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((path, Ok(content))) => {
                    tracing::debug!("added file: {path}");
                    files.insert(path, content);
                }
                Ok((path, Err(e))) => {
                    tracing::error!("error getting content for {path}: {e}");
                }
                Err(e) => {
                    tracing::error!("fetch task panicked: {e}");
                }
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepoEntry;
    use crate::remote::Capabilities;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `content of <path>`, failing for one path and tracking
    /// how many fetches run at once. `undecodable` answers with a
    /// decode error instead.
    struct Flaky {
        failing: &'static str,
        undecodable: &'static str,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Flaky {
        fn new(failing: &'static str) -> Self {
            Self {
                failing,
                undecodable: "none",
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn undecodable(mut self, path: &'static str) -> Self {
            self.undecodable = path;
            self
        }
    }

    #[async_trait]
    impl RemoteRepositoryClient for Flaky {
        fn capabilities(&self) -> Capabilities {
            Capabilities::default()
        }
        async fn list_entries(&self, _: &str, _: &str, _: &str, _: &str) -> Result<Vec<RepoEntry>, RemoteError> {
            Ok(vec![])
        }
        async fn fetch_content(&self, _: &str, _: &str, path: &str, _: &str) -> Result<String, RemoteError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if path == self.failing {
                Err(RemoteError::Transport("boom".to_string()))
            } else if path == self.undecodable {
                Err(RemoteError::Decode {
                    path: path.to_string(),
                    reason: "invalid utf-8".to_string(),
                })
            } else {
                Ok(format!("content of {path}"))
            }
        }
        async fn default_branch(&self, _: &str, _: &str) -> String {
            "main".to_string()
        }
    }

    fn paths(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("f{i}.py")).collect()
    }

    #[tokio::test]
    async fn one_failure_in_batch_keeps_the_rest() {
        let client: Arc<dyn RemoteRepositoryClient> = Arc::new(Flaky::new("f3.py"));
        let files = fetch_all(&client, "o", "r", "main", &paths(5), 5, 5).await;

        assert_eq!(files.len(), 4);
        assert!(!files.contains_key("f3.py"));
        assert_eq!(files["f1.py"], "content of f1.py");
    }

    #[tokio::test]
    async fn undecodable_file_is_dropped_without_aborting_batch() {
        let client: Arc<dyn RemoteRepositoryClient> = Arc::new(Flaky::new("f4.py").undecodable("f2.py"));
        let files = fetch_all(&client, "o", "r", "main", &paths(6), 3, 2).await;

        assert_eq!(files.len(), 4);
        assert!(!files.contains_key("f2.py"));
        assert!(!files.contains_key("f4.py"));
        assert_eq!(files["f3.py"], "content of f3.py");
        assert_eq!(files["f6.py"], "content of f6.py");
    }

    #[tokio::test]
    async fn concurrency_is_bounded_by_workers() {
        let flaky = Arc::new(Flaky::new("none"));
        let client: Arc<dyn RemoteRepositoryClient> = flaky.clone();
        let files = fetch_all(&client, "o", "r", "main", &paths(12), 6, 2).await;

        assert_eq!(files.len(), 12);
        assert!(flaky.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn zero_sizes_are_treated_as_one() {
        let client: Arc<dyn RemoteRepositoryClient> = Arc::new(Flaky::new("none"));
        let files = fetch_all(&client, "o", "r", "main", &paths(3), 0, 0).await;
        assert_eq!(files.len(), 3);
    }

    #[tokio::test]
    async fn empty_input_fetches_nothing() {
        let client: Arc<dyn RemoteRepositoryClient> = Arc::new(Flaky::new("none"));
        let files = fetch_all(&client, "o", "r", "main", &[], 10, 5).await;
        assert!(files.is_empty());
    }
}
