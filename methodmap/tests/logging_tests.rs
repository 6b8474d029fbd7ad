// Crawl events reaching the log file

use methodmap::logging::{LogLevels, build_dispatch};
use methodmap_scanner::{
    CrawlConfig, Crawler, HtmlExtractor, Method, Probe, ProbeOutcome, ProbeResponse,
};
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;
use tracing::instrument::WithSubscriber;

/// The seed links to one page twice and to a mailto address.
struct TwoPageSite;

impl Probe for TwoPageSite {
    async fn probe(&self, url: &str, method: Method) -> ProbeOutcome {
        if method == Method::Get && url == "http://site.test/" {
            let mut headers = BTreeMap::new();
            headers.insert("content-type".to_string(), "text/html".to_string());
            return ProbeOutcome::Response(ProbeResponse {
                status: 200,
                headers,
                body: Some(
                    "<a href='/a'>a</a><a href='/'>home</a><a href='mailto:x@site.test'>m</a>"
                        .to_string(),
                ),
            });
        }
        ProbeOutcome::Failed {
            error: "404 not found".to_string(),
        }
    }
}

#[tokio::test]
async fn test_verbose_log_records_admissions() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("spider.log");
    let dispatch = build_dispatch(Some(&path), LogLevels::from_flags(true, true, false))?;

    let config = CrawlConfig::new("http://site.test/")
        .with_max_depth(1)
        .with_methods(vec![Method::Get]);
    let crawler = Crawler::with_parts(config, TwoPageSite, HtmlExtractor::new())?;
    crawler.crawl().with_subscriber(dispatch).await?;

    let log = fs::read_to_string(&path)?;
    assert!(log.contains("Admitted http://site.test/a at depth 1"));
    assert!(log.contains("Already seen http://site.test/, skipping"));
    assert!(log.contains("GET http://site.test/ - Status: 200"));
    Ok(())
}
