use crate::{
    client::PageSource,
    config::Settings,
    core::cursor::Cursor,
    error::{CrawlerError, CrawlerResult},
    utils::looks_like_block_page,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, StatusCode, Url,
};
use std::{fmt, time::Duration};
use tracing::{info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    RankedDecks {
        lang: String,
        rank: u32,
        before: Option<Cursor>,
    },
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endpoint::RankedDecks { .. } => write!(f, "/decks/ranked"),
        }
    }
}

impl Endpoint {
    fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::RankedDecks { lang, rank, before } => {
                let mut params = vec![("lang", lang.clone()), ("rank", rank.to_string())];
                if let Some(before) = before {
                    params.push(("before", before.to_string()));
                }
                params
            }
        }
    }
}

pub struct RoyaleApi {
    http_client: Client,
    base_url: Url,
    max_attempts: u32,
    retry_delay: Duration,
}

impl RoyaleApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> CrawlerResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| CrawlerError::Config(format!("invalid base url '{base_url}'. {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CrawlerError::Config(format!(
                "base url '{base_url}' can't hold a path"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http_client,
            base_url,
            max_attempts,
            retry_delay,
        })
    }

    pub fn from_settings(settings: &Settings) -> CrawlerResult<Self> {
        RoyaleApi::new(
            &settings.base_url,
            settings.timeout(),
            settings.max_attempts,
            settings.retry_delay(),
        )
    }

    pub fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), endpoint);
        url.set_path(&path);
        url.query_pairs_mut().clear().extend_pairs(endpoint.query());
        url
    }

    /// Fetch a page, retrying on bad status, block page or transport error.
    /// Returns `None` once every attempt failed.
    pub async fn fetch_html(&self, url: &Url) -> Option<String> {
        let max_attempts = self.max_attempts;
        for attempt in 1..=max_attempts {
            match self.get(url).await {
                Ok(html) => {
                    info!("Fetched {url} (attempt {attempt}/{max_attempts}).");
                    return Some(html);
                }
                Err(e) => warn!("Attempt {attempt}/{max_attempts} failed for {url}. {e}"),
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        None
    }

    async fn get(&self, url: &Url) -> CrawlerResult<String> {
        let response = self.http_client.get(url.clone()).send().await?;

        match response.status() {
            StatusCode::OK => {
                let html = response.text().await?;
                match looks_like_block_page(&html) {
                    true => Err(CrawlerError::Blocked),
                    false => Ok(html),
                }
            }
            status => Err(CrawlerError::Http(format!("{status}"))),
        }
    }
}

impl PageSource for RoyaleApi {
    async fn fetch_page(&self, endpoint: &Endpoint) -> Option<String> {
        self.fetch_html(&self.url(endpoint)).await
    }
}
