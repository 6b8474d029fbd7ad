use crate::error::Result;
use crate::result::Method;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Present only for HTML responses.
    pub body: Option<String>,
}

impl ProbeResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_html(&self) -> bool {
        self.content_type()
            .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Response(ProbeResponse),
    Failed { error: String },
}

/// One network exchange: send `method` to `url` and report what came back.
///
/// Implementations never error out of band; every failure is folded into
/// [`ProbeOutcome::Failed`].
pub trait Probe: Send + Sync + 'static {
    fn probe(&self, url: &str, method: Method) -> impl Future<Output = ProbeOutcome> + Send;
}

/// reqwest-backed probe sharing one connection pool across workers.
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout_secs: u64, user_agent: &str, pool_size: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_max_idle_per_host(pool_size)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    async fn send(&self, url: &str, method: Method) -> Result<ProbeResponse> {
        let response = self.client.request(method.to_reqwest(), url).send().await?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false);

        let body = if is_html {
            Some(response.text().await?)
        } else {
            // Drain so the connection can go back to the pool.
            response.bytes().await?;
            None
        };

        Ok(ProbeResponse {
            status,
            headers,
            body,
        })
    }
}

impl Probe for HttpProbe {
    async fn probe(&self, url: &str, method: Method) -> ProbeOutcome {
        match self.send(url, method).await {
            Ok(response) => ProbeOutcome::Response(response),
            Err(e) => ProbeOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Flatten a header map, joining repeated names with ", ".
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn probe() -> HttpProbe {
        HttpProbe::new(5, "methodmap-test", 4).unwrap()
    }

    #[test]
    fn test_collect_headers_joins_repeats() {
        let mut headers = HeaderMap::new();
        headers.append("x-thing", HeaderValue::from_static("a"));
        headers.append("x-thing", HeaderValue::from_static("b"));
        headers.insert("allow", HeaderValue::from_static("GET, HEAD"));

        let collected = collect_headers(&headers);
        assert_eq!(collected["x-thing"], "a, b");
        assert_eq!(collected["allow"], "GET, HEAD");
    }

    #[test]
    fn test_is_html_ignores_header_case() {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Content-Type".to_string(),
            "TEXT/HTML; charset=utf-8".to_string(),
        );
        let response = ProbeResponse {
            status: 200,
            headers,
            body: None,
        };
        assert!(response.is_html());
    }

    #[tokio::test]
    async fn test_html_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<a href='/x'>x</a>"),
            )
            .mount(&server)
            .await;

        let ProbeOutcome::Response(response) = probe().probe(&server.uri(), Method::Get).await
        else {
            panic!("expected a response");
        };
        assert_eq!(response.status, 200);
        assert!(response.is_html());
        assert_eq!(response.body.as_deref(), Some("<a href='/x'>x</a>"));
    }

    #[tokio::test]
    async fn test_non_html_body_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{\"ok\":true}"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/api", server.uri());
        let ProbeOutcome::Response(response) = probe().probe(&url, Method::Post).await else {
            panic!("expected a response");
        };
        assert_eq!(response.status, 201);
        assert!(response.body.is_none());
        assert_eq!(
            response.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_unmatched_method_still_reports_status() {
        let server = MockServer::start().await;
        let outcome = probe().probe(&server.uri(), Method::Delete).await;
        // wiremock answers unmatched requests with 404
        assert!(matches!(
            outcome,
            ProbeOutcome::Response(ProbeResponse { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_failure_is_folded_into_outcome() {
        // Port 9 (discard) on localhost is almost never listening.
        let outcome = probe().probe("http://127.0.0.1:9/", Method::Get).await;
        assert!(matches!(outcome, ProbeOutcome::Failed { .. }));
    }
}
