//! Per-URL request worker.
//!
//! One unit fetches one URL. Whatever goes wrong stays inside the unit: it
//! is logged and the unit ends, leaving sibling units untouched.

use crate::concurrent::UnitGuard;
use crate::error::TitleFetchError;
use crate::title::extract_title;
use crate::types::PageTitle;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error};

/// Destination for result lines.
pub trait TitleSink: Send + Sync {
    fn emit(&self, page: &PageTitle);
}

/// Writes each result as one `"<title> (<url>)"` line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl TitleSink for StdoutSink {
    fn emit(&self, page: &PageTitle) {
        // One locked write per line keeps concurrent units from interleaving.
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", page) {
            debug!("Failed to write result for {}: {}", page.url, e);
        }
    }
}

/// GET `url` and extract its title, all within `deadline`.
///
/// The deadline covers connecting, waiting for headers and reading the
/// whole body. The response is dropped as soon as its body is read, which
/// hands the connection back to the client's pool.
pub async fn fetch_title(
    client: &reqwest::Client,
    url: &str,
    deadline: Duration,
) -> Result<PageTitle, TitleFetchError> {
    let request = client
        .get(url)
        .build()
        .map_err(|e| TitleFetchError::request_build(url, e.to_string()))?;

    let exchange = async {
        let response = client
            .execute(request)
            .await
            .map_err(|e| TitleFetchError::from_send_error(url, e, deadline))?;

        debug!("{} responded with {}", url, response.status());

        response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TitleFetchError::timeout(url, deadline)
            } else {
                TitleFetchError::body_read(url, e.to_string())
            }
        })
    };

    let body = tokio::time::timeout(deadline, exchange)
        .await
        .map_err(|_| TitleFetchError::timeout(url, deadline))??;

    Ok(PageTitle {
        url: url.to_string(),
        title: extract_title(&body),
    })
}

/// Everything a per-URL unit needs, cloned into each spawned task.
#[derive(Clone)]
pub(crate) struct UnitContext {
    pub(crate) client: reqwest::Client,
    pub(crate) deadline: Duration,
    pub(crate) sink: Arc<dyn TitleSink>,
    pub(crate) limiter: Option<Arc<Semaphore>>,
}

/// Body of one per-URL unit.
///
/// `guard` deregisters the unit when this future completes or is dropped.
pub(crate) async fn run_url_unit(ctx: UnitContext, url: String, guard: UnitGuard) {
    let _guard = guard;

    // The deadline starts once a slot is held, not while queued for one.
    let _permit = match &ctx.limiter {
        Some(limiter) => match Arc::clone(limiter).acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                error!("Concurrency limiter closed, skipping {}: {}", url, e);
                return;
            }
        },
        None => None,
    };

    match fetch_title(&ctx.client, &url, ctx.deadline).await {
        Ok(page) => ctx.sink.emit(&page),
        Err(e) => error!("{}", e),
    }
}
