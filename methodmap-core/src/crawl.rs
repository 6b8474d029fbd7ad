use indicatif::{ProgressBar, ProgressStyle};
use methodmap_scanner::config::{DEFAULT_CONCURRENCY, DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT_SECS};
use methodmap_scanner::{CrawlConfig, Crawler, Method, RequestOutcome, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub threads: usize,
    pub max_depth: usize,
    pub methods: Vec<Method>,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            threads: DEFAULT_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
            methods: Method::ALL.to_vec(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_progress_bars: false,
        }
    }
}

impl CrawlOptions {
    fn config_for(&self, url: &str) -> CrawlConfig {
        CrawlConfig::new(url)
            .with_max_depth(self.max_depth)
            .with_concurrency(self.threads)
            .with_methods(self.methods.clone())
            .with_timeout(self.timeout_secs)
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Crawl every seed in `options.urls`, one independent traversal per seed,
/// and return all outcomes in seed order.
///
/// Every seed is validated before the first request goes out, so a bad seed
/// or setting fails the whole call without touching the network.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<Vec<RequestOutcome>> {
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));
    let request_count = Arc::new(AtomicUsize::new(0));

    let mut crawlers = Vec::with_capacity(options.urls.len());
    for url in &options.urls {
        let mut crawler = Crawler::new(options.config_for(url))?;

        if let Some(ref pb) = progress_bar {
            let pb_clone = pb.clone();
            let count_clone = processed_count.clone();
            let requests_clone = request_count.clone();
            crawler = crawler.with_progress_callback(Arc::new(move |_worker_id, url| {
                let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
                pb_clone.set_message(format!(
                    "Probing {} ({} addresses, {} requests)",
                    extract_url_path(&url),
                    count,
                    requests_clone.load(Ordering::Relaxed)
                ));
            }));

            let requests_clone = request_count.clone();
            crawler = crawler.with_outcome_callback(Arc::new(move |_outcome| {
                requests_clone.fetch_add(1, Ordering::Relaxed);
            }));
        }

        crawlers.push(crawler);
    }

    let mut all_results = Vec::new();
    let total = crawlers.len();
    for (idx, crawler) in crawlers.iter().enumerate() {
        if let Some(ref callback) = progress_callback
            && total > 1
        {
            callback(format!(
                "Crawling host {}/{}: {}",
                idx + 1,
                total,
                crawler.seed()
            ));
        }

        let results = crawler.crawl().await?;
        all_results.extend(results);
    }

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Crawl complete! {} addresses, {} requests",
            processed_count.load(Ordering::Relaxed),
            request_count.load(Ordering::Relaxed)
        ));
    }

    Ok(all_results)
}
