use clap::Parser;
use serde::Serialize;

fn is_false(b: &bool) -> bool {
    !b
}

// Every option is optional so that unset flags don't shadow values coming from
// the yaml file or the environment once merged into the settings.
#[derive(Debug, Default, Parser, Serialize)]
#[command(about = "Crawl ranked decks and refresh the local match cache")]
pub struct Cli {
    /// Maximum number of matches to collect
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Rank gate requested from the listing
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// Listing locale
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Seconds to wait between two page requests
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    /// Path of the cache file
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
    /// Exit 0 even when no new matches were fetched
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub allow_empty_success: bool,
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Attempts per page before giving up
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Seconds to wait between two attempts on the same page
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<f64>,
    /// HTTP timeout in seconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_level: Option<String>,
}
