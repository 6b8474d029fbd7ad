use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

static REFERENCE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href], link[href], script[src], img[src]").expect("valid selector")
});
static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("valid selector"));

/// Pulls raw link references out of a fetched page.
///
/// Implementations must not touch the network and must not fail: malformed
/// input yields whatever could be recovered, possibly nothing.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, body: &str, base: &Url) -> BTreeSet<String>;
}

/// Extracts `href`/`src` references from anchors, link tags, scripts and
/// images.
#[derive(Debug, Default, Clone)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlExtractor {
    fn extract(&self, body: &str, base: &Url) -> BTreeSet<String> {
        let document = Html::parse_document(body);

        // A <base href> overrides the page address for relative references.
        let document_base = document
            .select(&BASE_SELECTOR)
            .next()
            .and_then(|element| element.value().attr("href"))
            .and_then(|href| base.join(href).ok());

        let mut references = BTreeSet::new();
        for element in document.select(&REFERENCE_SELECTOR) {
            let attr = match element.value().name() {
                "a" | "link" => "href",
                _ => "src",
            };
            let Some(value) = element.value().attr(attr) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match &document_base {
                Some(doc_base) => {
                    if let Ok(absolute) = doc_base.join(value) {
                        references.insert(absolute.to_string());
                    }
                }
                None => {
                    references.insert(value.to_string());
                }
            }
        }
        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("http://example.com/dir/page.html").unwrap()
    }

    #[test]
    fn test_extracts_all_reference_tags() {
        let html = r#"<html><head>
                <link rel="stylesheet" href="/style.css">
                <script src="app.js"></script>
            </head><body>
                <a href="/about">About</a>
                <img src="https://cdn.example.com/logo.png">
                <a>no href</a>
                <script>inline()</script>
            </body></html>"#;

        let refs = HtmlExtractor::new().extract(html, &page());

        assert_eq!(refs.len(), 4);
        assert!(refs.contains("/style.css"));
        assert!(refs.contains("app.js"));
        assert!(refs.contains("/about"));
        assert!(refs.contains("https://cdn.example.com/logo.png"));
    }

    #[test]
    fn test_duplicate_references_collapse() {
        let html = r#"<a href="/x">1</a><a href="/x">2</a><a href=" /x ">3</a>"#;
        let refs = HtmlExtractor::new().extract(html, &page());
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_ignores_src_on_anchor_and_href_on_img() {
        let html = r#"<a src="/wrong">x</a><img href="/also-wrong">"#;
        let refs = HtmlExtractor::new().extract(html, &page());
        assert!(refs.is_empty());
    }

    #[test]
    fn test_base_element_rebases_references() {
        let html = r#"<head><base href="http://static.example.com/assets/"></head>
            <body><a href="img/a.png">a</a></body>"#;
        let refs = HtmlExtractor::new().extract(html, &page());
        assert!(refs.contains("http://static.example.com/assets/img/a.png"));
    }

    #[test]
    fn test_malformed_markup_is_best_effort() {
        let html = "<html><body><a href='/ok'>unclosed <div><<<>";
        let refs = HtmlExtractor::new().extract(html, &page());
        assert!(refs.contains("/ok"));

        assert!(HtmlExtractor::new().extract("", &page()).is_empty());
        assert!(HtmlExtractor::new().extract("not html at all", &page()).is_empty());
    }
}
