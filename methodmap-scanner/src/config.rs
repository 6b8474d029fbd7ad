use crate::error::{Result, ScanError};
use crate::normalize::normalize_seed;
use crate::result::Method;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for one traversal run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub seed: String,
    pub max_depth: usize,
    pub concurrency: usize,
    pub methods: Vec<Method>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency: DEFAULT_CONCURRENCY,
            methods: Method::ALL.to_vec(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("methodmap/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlConfig {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Check the settings and return the canonical seed together with the
    /// method list in probe order.
    pub(crate) fn validate(&self) -> Result<(Url, Vec<Method>)> {
        let seed = normalize_seed(&self.seed)?;

        if self.concurrency == 0 {
            return Err(ScanError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.methods.is_empty() {
            return Err(ScanError::Config(
                "at least one HTTP method is required".to_string(),
            ));
        }

        Ok((seed, probe_order(&self.methods)))
    }
}

/// Deduplicate `methods`, keeping first occurrence order, with GET moved to
/// the front since only its response feeds link discovery.
pub fn probe_order(methods: &[Method]) -> Vec<Method> {
    let mut ordered: Vec<Method> = Vec::with_capacity(methods.len());
    if methods.contains(&Method::Get) {
        ordered.push(Method::Get);
    }
    for method in methods {
        if !ordered.contains(method) {
            ordered.push(*method);
        }
    }
    ordered
}
