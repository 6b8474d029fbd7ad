use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("methodmap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("methodmap")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Only print errors to the console").required(false))
        .arg(
            arg!(-v --"verbose" "Log debug detail (admissions, worker lifecycle)")
                .required(false),
        )
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a site from a seed URL and probe every discovered address with \
                each HTTP method.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The seed URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-d --"max-depth" <DEPTH>)
                        .required(false)
                        .help("Maximum number of link hops from the seed")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("2"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async workers in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(-m --"methods" <METHODS>)
                        .required(false)
                        .help("Comma-separated HTTP methods to probe")
                        .default_value("GET,POST,PUT,DELETE,HEAD,OPTIONS"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("60"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to save the result log")
                        .default_value("output.json"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Result log format: json, csv")
                        .value_parser(["json", "csv"])
                        .default_value("json"),
                )
                .arg(
                    arg!(--"log-file" <PATH>)
                        .required(false)
                        .help("Append logs to this file")
                        .default_value("spider.log"),
                )
                .arg(
                    arg!(--"progress")
                        .required(false)
                        .help("Show a progress spinner instead of per-request log lines")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-report")
                        .required(false)
                        .help("Skip printing the method report when the crawl finishes")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
