use crate::cli::Cli;
use crate::error::CrawlerResult;
use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

const TRACE_LEVELS: [&'static str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
const LOCAL_SETTINGS_YAML_FILE: &str = "royale_decks.yaml";
const ENV_PREFIX: &str = "ROYALE_";

// Settings may come from the local yaml file, environment variables or the
// command line, in increasing order of precedence. Example:
// ROYALE_LIMIT=200 would set limit to 200 unless --limit is given.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_trace_level")]
    trace_level: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_rank")]
    pub rank: u32,
    #[serde(default = "default_lang")]
    pub lang: String,
    // Politeness delay between two pages, in seconds
    #[serde(default = "default_delay")]
    pub delay: f64,
    #[serde(default = "default_out")]
    pub out: String,
    #[serde(default)]
    pub allow_empty_success: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Settings {
    pub fn new() -> CrawlerResult<Self> {
        if Path::new(LOCAL_SETTINGS_YAML_FILE).exists() {
            println!(
                "\n######################################\n\
                   ## Found '{LOCAL_SETTINGS_YAML_FILE}' file, ##\n\
                   ##   loading local configuration.   ##\n\
                   ######################################\n"
            );
        }
        Settings::from_figment(Settings::figment(Cli::parse()))
    }

    pub fn figment(cli: Cli) -> Figment {
        Figment::new()
            .merge(Yaml::file(LOCAL_SETTINGS_YAML_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(cli))
    }

    pub fn from_figment(figment: Figment) -> CrawlerResult<Self> {
        Ok(figment.extract()?)
    }

    pub fn get_trace_level(&self) -> Level {
        get_trace_level(&self.trace_level)
    }

    pub fn delay(&self) -> Duration {
        seconds(self.delay)
    }

    pub fn retry_delay(&self) -> Duration {
        seconds(self.retry_delay)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// Negative or non finite values are treated as no wait at all.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

fn get_trace_level(level_str: &str) -> Level {
    match level_str.to_uppercase().as_str() {
        level if level == TRACE_LEVELS[0] => Level::TRACE,
        level if level == TRACE_LEVELS[1] => Level::DEBUG,
        level if level == TRACE_LEVELS[2] => Level::INFO,
        level if level == TRACE_LEVELS[3] => Level::WARN,
        level if level == TRACE_LEVELS[4] => Level::ERROR,
        // Default trace level
        _ => Level::INFO,
    }
}

fn default_trace_level() -> String {
    "INFO".to_string()
}

fn default_limit() -> usize {
    1000
}

fn default_rank() -> u32 {
    1000
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_delay() -> f64 {
    0.35
}

fn default_out() -> String {
    "scripts/royaleapi_ranked_cache.json".to_string()
}

fn default_base_url() -> String {
    "https://royaleapi.com".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> f64 {
    1.0
}

fn default_timeout() -> u64 {
    15
}
