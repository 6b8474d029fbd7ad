use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP methods the prober knows how to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
}

impl Method {
    /// The six standard methods, GET first.
    pub const ALL: [Method; 6] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(format!("unsupported HTTP method '{}'", other)),
        }
    }
}

/// One entry of the result log: what happened when `method` was sent to `url`.
///
/// `status` and `headers` are absent when the probe failed at the transport
/// level; `error` then carries the failure description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub url: String,
    pub method: Method,
    pub status: Option<u16>,
    pub headers: Option<BTreeMap<String, String>>,
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestOutcome {
    pub fn new(
        url: String,
        method: Method,
        depth: usize,
        status: u16,
        headers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            url,
            method,
            status: Some(status),
            headers: Some(headers),
            depth,
            error: None,
        }
    }

    pub fn with_error(url: String, method: Method, depth: usize, error: String) -> Self {
        Self {
            url,
            method,
            status: None,
            headers: None,
            depth,
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_none()
    }

    /// True for 2xx and 3xx responses.
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, Some(200..=399))
    }
}
