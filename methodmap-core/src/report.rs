// Human-readable method matrix built from a result log

use crate::crawl::extract_url_path;
use colored::{ColoredString, Colorize};
use methodmap_scanner::{Method, RequestOutcome};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub addresses: usize,
    pub requests: usize,
    pub failed: usize,
    /// Number of addresses answering each method with 2xx/3xx.
    pub accepted_by_method: BTreeMap<Method, usize>,
}

pub fn summarize(results: &[RequestOutcome]) -> ReportSummary {
    let addresses: BTreeSet<&str> = results.iter().map(|r| r.url.as_str()).collect();

    let mut accepted_by_method = BTreeMap::new();
    for result in results.iter().filter(|r| r.is_accepted()) {
        *accepted_by_method.entry(result.method).or_insert(0) += 1;
    }

    ReportSummary {
        addresses: addresses.len(),
        requests: results.len(),
        failed: results.iter().filter(|r| r.is_failure()).count(),
        accepted_by_method,
    }
}

/// Generate a crawl report from results
pub fn generate_crawl_report(results: &[RequestOutcome]) -> String {
    let summary = summarize(results);

    let mut report = String::new();
    report.push_str(RULE);
    report.push_str("\n                         METHODMAP HTTP METHOD REPORT\n");
    report.push_str(RULE);
    report.push_str("\n\n");
    report.push_str(&format!(
        "Generated:    {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("Addresses:    {}\n", summary.addresses));
    report.push_str(&format!("Requests:     {}\n", summary.requests));
    report.push_str(&format!("Failed:       {}\n\n", summary.failed));

    if !summary.accepted_by_method.is_empty() {
        report.push_str("Accepted (2xx/3xx) per method:\n");
        for (method, count) in &summary.accepted_by_method {
            report.push_str(&format!("  {:<8} {}\n", method.as_str(), count));
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report.push_str("\n\n");

    // host -> address -> method -> outcome
    let mut by_host: BTreeMap<String, BTreeMap<&str, BTreeMap<Method, &RequestOutcome>>> =
        BTreeMap::new();
    for result in results {
        let host = Url::parse(&result.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        by_host
            .entry(host)
            .or_default()
            .entry(result.url.as_str())
            .or_default()
            .insert(result.method, result);
    }

    let methods: BTreeSet<Method> = results.iter().map(|r| r.method).collect();

    for (host, addresses) in &by_host {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} addresses\n\n", addresses.len()));

        report.push_str("  ");
        for method in &methods {
            report.push_str(&format!("{:<8}", method.as_str()));
        }
        report.push_str("path\n");

        for (url, outcomes) in addresses {
            report.push_str("  ");
            for method in &methods {
                let cell = match outcomes.get(method) {
                    Some(outcome) => status_cell(outcome),
                    None => "".normal(),
                };
                // Pad outside the colour codes so columns stay aligned.
                let width = cell.chars().count();
                report.push_str(&format!("{}{}", cell, " ".repeat(8usize.saturating_sub(width))));
            }
            report.push_str(&extract_url_path(url));
            report.push('\n');
        }
        report.push('\n');
    }

    report
}

fn status_cell(outcome: &RequestOutcome) -> ColoredString {
    match outcome.status {
        None => "ERR".red().bold(),
        Some(code @ 100..=199) => code.to_string().white(),
        Some(code @ 200..=299) => code.to_string().green(),
        Some(code @ 300..=399) => code.to_string().cyan(),
        Some(code @ 400..=499) => code.to_string().yellow(),
        Some(code @ 500..=599) => code.to_string().red(),
        Some(code) => code.to_string().normal(),
    }
}
