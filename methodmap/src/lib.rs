// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;
pub mod logging;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    expand_path, load_urls_from_file, load_urls_from_source, parse_methods, parse_url_line,
};

// Re-export crawl functionality from methodmap-core
pub use methodmap_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path,
};
pub use methodmap_core::generate_crawl_report;
