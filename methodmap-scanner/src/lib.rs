pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod frontier;
pub mod normalize;
pub mod probe;
pub mod result;
pub mod visited;

pub use config::CrawlConfig;
pub use crawler::{Crawler, OutcomeCallback, ProgressCallback};
pub use error::{Result, ScanError};
pub use extract::{HtmlExtractor, LinkExtractor};
pub use frontier::{Frontier, FrontierItem};
pub use normalize::normalize;
pub use probe::{HttpProbe, Probe, ProbeOutcome, ProbeResponse};
pub use result::{Method, RequestOutcome};
pub use visited::VisitedSet;
