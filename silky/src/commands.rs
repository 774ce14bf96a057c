use crate::CLAP_STYLING;
use clap::{Arg, ArgAction, arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("silky")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("silky")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .required(false)
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a host or collection of hosts, depth-first or hunting for a target \
                URL, and report what was collected.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to crawl")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth from the seed (0 = unlimited)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    arg!(-p --"pages" <PAGES>)
                        .required(false)
                        .help("Maximum number of pages to visit (0 = unlimited)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    arg!(-w --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of concurrent workers. 1 keeps strict visit order.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"site-only")
                        .required(false)
                        .help("Stay on the domain of the seed URL(s)")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"include" <REGEX>)
                        .required(false)
                        .help("Only follow URLs matching this pattern (N/A to disable)"),
                )
                .arg(
                    arg!(--"exclude" <REGEX>)
                        .required(false)
                        .help("Never follow URLs matching this pattern (N/A to disable)"),
                )
                .arg(
                    arg!(--"forced-domain" <REGEX>)
                        .required(false)
                        .help("Only follow URLs whose host matches this pattern"),
                )
                .arg(
                    arg!(--"file-types" <EXTENSIONS>)
                        .required(false)
                        .help("Comma-separated file extensions to allow, e.g. html,php"),
                )
                .arg(
                    arg!(--"filter" <TEXT>)
                        .required(false)
                        .help("Only collect pages whose text contains this (case-insensitive)"),
                )
                .arg(
                    arg!(--"image-only")
                        .required(false)
                        .help("Collect discovered images instead of page content")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"cookies" <COOKIES>)
                        .required(false)
                        .help("Cookies to send, as a JSON object or 'name=value; other=value'"),
                )
                .arg(
                    arg!(-s --"stop-on-url" <URL>)
                        .required(false)
                        .help("Hunt for this URL and stop as soon as it is reached"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Stop the whole crawl after this many seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"page-timeout" <SECONDS>)
                        .required(false)
                        .help("Per-page fetch timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("15"),
                )
                .arg(
                    arg!(--"worker-thread")
                        .required(false)
                        .help(
                            "Run the crawl on a dedicated worker thread with host limits applied \
                        (depth 100, pages 5000, 300 seconds)",
                        )
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"webhook" <URL>)
                        .required(false)
                        .help("Post a summary and the full report to this chat webhook"),
                )
                .args(report_args())
                .args(export_args()),
        )
        .subcommand(
            command!("import")
                .about("Load a previously exported result bundle, then search, report or export it")
                .arg(
                    arg!(<FILE>)
                        .help("Path to an exported bundle (.dat)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"search" <QUERY>)
                        .required(false)
                        .help("Search the collected data and list matches best first"),
                )
                .args(report_args())
                .args(export_args()),
        )
}

fn report_args() -> Vec<Arg> {
    vec![
        arg!(-o --"output" <PATH>)
            .required(false)
            .help("Save report to file (default: display to screen)"),
        arg!(-f --"format" <FORMAT>)
            .required(false)
            .help("Report format: text, json")
            .value_parser(["text", "json"])
            .default_value("text"),
    ]
}

fn export_args() -> Vec<Arg> {
    vec![
        arg!(--"export-links" <PATH>)
            .required(false)
            .help("Write every collected URL to this file, one per line"),
        arg!(--"export-images" <PATH>)
            .required(false)
            .help("Write collected image URLs to this file, one per line"),
        arg!(--"export-image-metadata" <PATH>)
            .required(false)
            .help("Write collected image metadata to this file as JSON"),
        arg!(--"export-bundle" <PATH>)
            .required(false)
            .help("Write the result bundle to this file for a later import"),
    ]
}
