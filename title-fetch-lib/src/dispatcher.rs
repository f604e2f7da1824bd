//! Batch dispatcher.
//!
//! The URL list is split into fixed-size batches. Each batch runs as its own
//! task and spawns one task per URL. All tasks share one HTTP client, and a
//! [`CompletionTracker`] decides when the run is over.
//!
//! Batching groups dispatch only. Without `max_in_flight`, every URL of a
//! dispatched batch is requested at once, so a list of N URLs can have N
//! requests in flight. With `max_in_flight`, a semaphore shared across all
//! batches caps simultaneous requests independently of the batch size.

use crate::client::build_client;
use crate::concurrent::CompletionTracker;
use crate::error::TitleFetchError;
use crate::types::{DispatchSummary, FetchConfig};
use crate::worker::{run_url_unit, StdoutSink, TitleSink, UnitContext};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Split `urls` into contiguous, non-overlapping batches of at most
/// `batch_size` entries. Only the last batch may be shorter.
///
/// A `batch_size` of 0 is treated as 1.
pub fn batches(urls: &[String], batch_size: usize) -> impl Iterator<Item = &[String]> {
    urls.chunks(batch_size.max(1))
}

/// Runs a URL list to completion over one shared client.
pub struct Dispatcher {
    config: FetchConfig,
    client: reqwest::Client,
    sink: Arc<dyn TitleSink>,
}

impl Dispatcher {
    /// Validate `config`, build the shared client, and print to stdout.
    pub fn new(config: FetchConfig) -> Result<Self, TitleFetchError> {
        config.validate()?;
        let client = build_client(&config)?;
        Ok(Self {
            config,
            client,
            sink: Arc::new(StdoutSink),
        })
    }

    /// Send result lines somewhere other than stdout.
    pub fn with_sink(mut self, sink: Arc<dyn TitleSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Fetch every URL and return once every spawned unit has finished.
    ///
    /// Never fails: per-URL errors are logged by the units themselves.
    pub async fn run(&self, urls: Vec<String>) -> DispatchSummary {
        let tracker = CompletionTracker::new();
        let summary = self.dispatch(urls, &tracker);
        tracker.wait().await;

        debug!(
            "Finished {} URLs across {} batches",
            summary.urls, summary.batches
        );
        summary
    }

    /// Spawn one batch unit per batch, registering each with `tracker`.
    ///
    /// Returns without waiting; `tracker.wait()` completes once every batch
    /// unit and every per-URL unit it spawned has finished. Must be called
    /// from within a tokio runtime.
    pub fn dispatch(&self, urls: Vec<String>, tracker: &CompletionTracker) -> DispatchSummary {
        // Held while batches are being launched so an early batch finishing
        // cannot bring the count to zero before later batches register.
        let _launching = tracker.register();

        let ctx = UnitContext {
            client: self.client.clone(),
            deadline: self.config.request_timeout,
            sink: Arc::clone(&self.sink),
            limiter: self
                .config
                .max_in_flight
                .map(|limit| Arc::new(Semaphore::new(limit))),
        };

        let mut summary = DispatchSummary {
            urls: urls.len(),
            batches: 0,
        };

        for (index, batch) in batches(&urls, self.config.batch_size).enumerate() {
            let batch_guard = tracker.register();
            let batch = batch.to_vec();
            let ctx = ctx.clone();
            let tracker = tracker.clone();

            tokio::spawn(async move {
                let _batch_guard = batch_guard;
                debug!("Dispatching batch {} ({} URLs)", index, batch.len());

                for url in batch {
                    let unit_guard = tracker.register();
                    tokio::spawn(run_url_unit(ctx.clone(), url, unit_guard));
                }
            });

            summary.batches += 1;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageTitle;
    use std::sync::Mutex;
    use std::time::Duration;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("http://host{}.test/", i)).collect()
    }

    #[derive(Default)]
    struct CollectSink(Mutex<Vec<PageTitle>>);

    impl TitleSink for CollectSink {
        fn emit(&self, page: &PageTitle) {
            self.0.lock().unwrap().push(page.clone());
        }
    }

    #[test]
    fn test_batches_45_by_20() {
        let list = urls(45);
        let sizes: Vec<usize> = batches(&list, 20).map(<[String]>::len).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
    }

    #[test]
    fn test_batches_exact_multiple() {
        let list = urls(20);
        let sizes: Vec<usize> = batches(&list, 20).map(<[String]>::len).collect();
        assert_eq!(sizes, vec![20]);
    }

    #[test]
    fn test_batches_empty_list() {
        assert_eq!(batches(&[], 20).count(), 0);
    }

    #[test]
    fn test_batches_cover_list_in_order() {
        let list = urls(47);
        let rejoined: Vec<String> = batches(&list, 20).flatten().cloned().collect();
        assert_eq!(rejoined, list);

        let starts: Vec<&String> = batches(&list, 20).map(|b| &b[0]).collect();
        assert_eq!(starts, vec![&list[0], &list[20], &list[40]]);
    }

    #[test]
    fn test_zero_batch_size_treated_as_one() {
        let list = urls(3);
        assert_eq!(batches(&list, 0).count(), 3);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Dispatcher::new(FetchConfig::default().with_batch_size(0));
        assert!(matches!(result, Err(TitleFetchError::ConfigError { .. })));
    }

    #[tokio::test]
    async fn test_empty_list_completes_immediately() {
        let dispatcher = Dispatcher::new(FetchConfig::default()).unwrap();
        let summary = tokio::time::timeout(Duration::from_secs(1), dispatcher.run(Vec::new()))
            .await
            .unwrap();
        assert_eq!(summary, DispatchSummary { urls: 0, batches: 0 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_unit_deregisters_on_failure() {
        // Empty and malformed URLs fail at request construction, so no
        // network is touched and every unit ends quickly.
        let mut list: Vec<String> = (0..45).map(|i| format!("bad url {}", i)).collect();
        list.push(String::new());

        let sink = Arc::new(CollectSink::default());
        let dispatcher = Dispatcher::new(FetchConfig::default())
            .unwrap()
            .with_sink(sink.clone());

        let tracker = CompletionTracker::new();
        let summary = dispatcher.dispatch(list, &tracker);
        assert_eq!(summary, DispatchSummary { urls: 46, batches: 3 });

        tokio::time::timeout(Duration::from_secs(5), tracker.wait())
            .await
            .expect("all units should finish");
        assert_eq!(tracker.outstanding(), 0);
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
