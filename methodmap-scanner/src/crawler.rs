use crate::config::CrawlConfig;
use crate::error::Result;
use crate::extract::{HtmlExtractor, LinkExtractor};
use crate::frontier::{Frontier, FrontierItem};
use crate::normalize::normalize;
use crate::probe::{HttpProbe, Probe, ProbeOutcome, ProbeResponse};
use crate::result::{Method, RequestOutcome};
use crate::visited::VisitedSet;
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument::WithSubscriber;
use tracing::{Instrument, debug, error, info, info_span, warn};
use url::Url;
use uuid::Uuid;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type OutcomeCallback = Arc<dyn Fn(&RequestOutcome) + Send + Sync>;

/// Depth-limited traversal that probes every discovered address with each
/// configured method.
pub struct Crawler<P = HttpProbe, E = HtmlExtractor> {
    probe: Arc<P>,
    extractor: Arc<E>,
    seed: Url,
    max_depth: usize,
    concurrency: usize,
    methods: Arc<[Method]>,
    progress_callback: Option<ProgressCallback>,
    outcome_callback: Option<OutcomeCallback>,
}

impl Crawler<HttpProbe, HtmlExtractor> {
    /// Build a crawler that talks to the network through reqwest.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        config.validate()?;
        let probe = HttpProbe::new(config.timeout_secs, &config.user_agent, config.concurrency)?;
        Self::with_parts(config, probe, HtmlExtractor::new())
    }
}

impl<P: Probe, E: LinkExtractor + 'static> Crawler<P, E> {
    pub fn with_parts(config: CrawlConfig, probe: P, extractor: E) -> Result<Self> {
        let (seed, methods) = config.validate()?;

        Ok(Self {
            probe: Arc::new(probe),
            extractor: Arc::new(extractor),
            seed,
            max_depth: config.max_depth,
            concurrency: config.concurrency,
            methods: methods.into(),
            progress_callback: None,
            outcome_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_outcome_callback(mut self, callback: OutcomeCallback) -> Self {
        self.outcome_callback = Some(callback);
        self
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Run one traversal from the seed and return every recorded outcome.
    ///
    /// Each call gets a fresh frontier and visited set. Workers inherit the
    /// caller's tracing dispatcher and span rather than any global one.
    pub async fn crawl(&self) -> Result<Vec<RequestOutcome>> {
        let span = info_span!("crawl", run = %Uuid::new_v4(), seed = %self.seed);
        self.run().instrument(span).await
    }

    async fn run(&self) -> Result<Vec<RequestOutcome>> {
        info!(
            "Starting crawl of {} with {} workers (max depth {})",
            self.seed, self.concurrency, self.max_depth
        );

        let state = Arc::new(RunState {
            probe: self.probe.clone(),
            extractor: self.extractor.clone(),
            frontier: Frontier::new(),
            visited: VisitedSet::new(),
            results: Mutex::new(Vec::new()),
            max_depth: self.max_depth,
            methods: self.methods.clone(),
            progress_callback: self.progress_callback.clone(),
            outcome_callback: self.outcome_callback.clone(),
        });

        let seed = self.seed.to_string();
        state.visited.try_admit(&seed).await;
        state.frontier.push(FrontierItem::new(seed, 0)).await;

        let mut worker_handles = Vec::with_capacity(self.concurrency);
        for worker_id in 0..self.concurrency {
            let state = state.clone();
            let handle = tokio::spawn(
                worker(worker_id, state)
                    .in_current_span()
                    .with_current_subscriber(),
            );
            worker_handles.push(handle);
        }

        state.frontier.wait_quiescent().await;
        debug!("Frontier quiescent, stopping workers");
        state.frontier.close().await;

        for handle in worker_handles {
            handle.await?;
        }

        let addresses = state.visited.len().await;
        let results = std::mem::take(&mut *state.results.lock().await);
        info!(
            "Crawl complete. Probed {} addresses with {} requests",
            addresses,
            results.len()
        );
        Ok(results)
    }
}

/// Everything the workers of a single run share.
struct RunState<P, E> {
    probe: Arc<P>,
    extractor: Arc<E>,
    frontier: Frontier,
    visited: VisitedSet,
    results: Mutex<Vec<RequestOutcome>>,
    max_depth: usize,
    methods: Arc<[Method]>,
    progress_callback: Option<ProgressCallback>,
    outcome_callback: Option<OutcomeCallback>,
}

async fn worker<P: Probe, E: LinkExtractor>(worker_id: usize, state: Arc<RunState<P, E>>) {
    debug!("Worker {} started", worker_id);

    while let Some(item) = state.frontier.pop().await {
        let processed = AssertUnwindSafe(state.process(worker_id, &item))
            .catch_unwind()
            .await;
        if let Err(panic) = processed {
            error!(
                "Unexpected error processing {}: {}",
                item.url,
                panic_message(panic.as_ref())
            );
        }
        state.frontier.mark_done(&item).await;
    }

    debug!("Worker {} finished", worker_id);
}

impl<P: Probe, E: LinkExtractor> RunState<P, E> {
    async fn process(&self, worker_id: usize, item: &FrontierItem) {
        if item.depth > self.max_depth {
            warn!(
                "Skipping {} at depth {} beyond max depth {}",
                item.url, item.depth, self.max_depth
            );
            return;
        }

        if let Some(ref callback) = self.progress_callback {
            callback(worker_id, item.url.clone());
        }

        // One method at a time: at most one open request per worker.
        for &method in self.methods.iter() {
            let (outcome, page) = match self.probe.probe(&item.url, method).await {
                ProbeOutcome::Response(response) => {
                    info!("{} {} - Status: {}", method, item.url, response.status);
                    let is_html = response.is_html();
                    let ProbeResponse {
                        status,
                        headers,
                        body,
                    } = response;

                    let page = if method == Method::Get && is_html {
                        body.filter(|b| !b.is_empty())
                    } else {
                        None
                    };
                    let outcome =
                        RequestOutcome::new(item.url.clone(), method, item.depth, status, headers);
                    (outcome, page)
                }
                ProbeOutcome::Failed { error } => {
                    error!(
                        "Error fetching {} with method {}: {}",
                        item.url, method, error
                    );
                    let outcome =
                        RequestOutcome::with_error(item.url.clone(), method, item.depth, error);
                    (outcome, None)
                }
            };
            self.record(outcome).await;

            // Queue links as soon as the GET body is in.
            if let Some(body) = page {
                self.discover(item, &body).await;
            }
        }
    }

    /// Queue the unseen in-scope links of a page one hop deeper.
    async fn discover(&self, item: &FrontierItem, body: &str) {
        if item.depth >= self.max_depth {
            debug!("Depth limit reached at {}, not following links", item.url);
            return;
        }
        let Ok(base) = Url::parse(&item.url) else {
            return;
        };

        let references = self.extractor.extract(body, &base);
        let next_depth = item.depth + 1;
        let mut queued = 0;
        for reference in references {
            let Some(url) = normalize(&reference, &base) else {
                debug!("Ignoring out-of-scope reference {}", reference);
                continue;
            };
            if self.visited.try_admit(&url).await {
                debug!("Admitted {} at depth {}", url, next_depth);
                self.frontier.push(FrontierItem::new(url, next_depth)).await;
                queued += 1;
            } else {
                debug!("Already seen {}, skipping", url);
            }
        }
        debug!("Queued {} new addresses from {}", queued, item.url);
    }

    /// Append to the result log, then notify the observer. A panicking
    /// observer loses nothing and does not cut the item short.
    async fn record(&self, outcome: RequestOutcome) {
        let Some(ref callback) = self.outcome_callback else {
            self.results.lock().await.push(outcome);
            return;
        };

        self.results.lock().await.push(outcome.clone());
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(&outcome))) {
            warn!(
                "Outcome callback failed for {} {}: {}",
                outcome.method,
                outcome.url,
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_page(server: &MockServer, page: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(html),
            )
            .mount(server)
            .await;
    }

    /// Every method is sent to every discovered page over real HTTP.
    #[tokio::test]
    async fn test_probes_all_methods_over_http() {
        let server = MockServer::start().await;
        mount_page(&server, "/", "<a href='/x'>x</a>".to_string()).await;

        Mock::given(method("OPTIONS"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(204).insert_header("allow", "GET, OPTIONS"))
            .mount(&server)
            .await;

        let config = CrawlConfig::new(server.uri()).with_max_depth(1);
        let crawler = Crawler::new(config).unwrap();
        let results = crawler.crawl().await.unwrap();

        assert_eq!(results.len(), 12);

        let root = format!("{}/", server.uri());
        let seed_get = results
            .iter()
            .find(|r| r.url == root && r.method == Method::Get)
            .unwrap();
        assert_eq!(seed_get.status, Some(200));

        let seed_options = results
            .iter()
            .find(|r| r.url == root && r.method == Method::Options)
            .unwrap();
        assert_eq!(seed_options.status, Some(204));
        assert_eq!(
            seed_options
                .headers
                .as_ref()
                .and_then(|h| h.get("allow"))
                .map(String::as_str),
            Some("GET, OPTIONS")
        );

        // Unmatched requests come back as 404 responses, not failures.
        let child = format!("{}/x", server.uri());
        let child_statuses: BTreeSet<Option<u16>> = results
            .iter()
            .filter(|r| r.url == child)
            .map(|r| r.status)
            .collect();
        assert_eq!(child_statuses, BTreeSet::from([Some(404)]));
    }

    #[tokio::test]
    async fn test_non_html_get_is_not_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{\"next\": \"<a href='/hidden'>\"}"),
            )
            .mount(&server)
            .await;

        let config = CrawlConfig::new(server.uri())
            .with_max_depth(3)
            .with_methods(vec![Method::Get]);
        let results = Crawler::new(config).unwrap().crawl().await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, Some(200));
    }

    #[tokio::test]
    async fn test_stays_within_depth_on_a_chain() {
        let server = MockServer::start().await;
        for i in 0..5 {
            let page = if i == 0 { "/".to_string() } else { format!("/p{}", i) };
            mount_page(&server, &page, format!("<a href='/p{}'>next</a>", i + 1)).await;
        }

        let config = CrawlConfig::new(server.uri())
            .with_max_depth(2)
            .with_concurrency(3)
            .with_methods(vec![Method::Get, Method::Head]);
        let results = Crawler::new(config).unwrap().crawl().await.unwrap();

        let pages: BTreeSet<String> = results.iter().map(|r| r.url.clone()).collect();
        assert_eq!(pages.len(), 3);
        assert!(results.iter().all(|r| r.depth <= 2));
        assert!(!pages.contains(&format!("{}/p3", server.uri())));
    }
}
