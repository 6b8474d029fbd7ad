pub mod crawl;
pub mod report;
pub mod sink;

pub use crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path};
pub use report::generate_crawl_report;
pub use sink::{CsvFileSink, JsonFileSink, OutputFormat, ResultSink};
