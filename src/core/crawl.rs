use crate::{
    client::{
        royale::{Endpoint, RoyaleApi},
        PageSource,
    },
    config::Settings,
    core::{
        cursor::{next_cursor_from, Cursor},
        deck::{CachePayload, Match, SOURCE},
        extract::{count_card_images, extract_from},
        stats::aggregate,
    },
    error::CrawlerResult,
    storage::{self, PriorCache},
};
use chrono::Utc;
use scraper::Html;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::IntoStaticStr;
use tracing::{info, warn};

/// What a crawl is asked to collect and how politely.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    pub limit: usize,
    pub rank: u32,
    pub lang: String,
    pub delay: Duration,
    pub out: PathBuf,
}

impl CrawlPlan {
    pub fn from_settings(settings: &Settings) -> Self {
        CrawlPlan {
            limit: settings.limit,
            rank: settings.rank,
            lang: settings.lang.clone(),
            delay: settings.delay(),
            out: PathBuf::from(&settings.out),
        }
    }

    fn endpoint(&self, before: Option<Cursor>) -> Endpoint {
        Endpoint::RankedDecks {
            lang: self.lang.clone(),
            rank: self.rank,
            before,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    LimitReached,
    FetchFailed,
    // An empty page ends the crawl whether the listing is over or the markup
    // changed. The image count only helps telling both apart in the logs.
    NoMatches { card_images: usize },
    // No cursor, or the same one as the current page.
    CursorExhausted,
}

#[derive(Debug)]
pub struct CrawlReport {
    pub matches: Vec<Match>,
    pub pages: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written { total: usize },
    // Nothing new was fetched, the previous cache stays in place.
    KeptExisting { existing: usize },
    NothingCached,
}

impl Outcome {
    pub fn exit_code(&self, allow_empty_success: bool) -> u8 {
        match (self, allow_empty_success) {
            (Outcome::Written { .. }, _) => 0,
            (_, true) => 0,
            (_, false) => 2,
        }
    }
}

struct PageScan {
    matches: Vec<Match>,
    next_cursor: Option<Cursor>,
    card_images: usize,
}

// Kept synchronous so that the parsed document never lives across an await.
fn scan_page(html: &str) -> PageScan {
    let document = Html::parse_document(html);
    PageScan {
        matches: extract_from(&document),
        next_cursor: next_cursor_from(&document, html),
        card_images: count_card_images(&document),
    }
}

/// Walk the listing page by page until the limit is reached or the listing
/// stops yielding anything new.
pub async fn crawl<S: PageSource>(source: &S, plan: &CrawlPlan) -> CrawlReport {
    let mut matches: Vec<Match> = Vec::new();
    let mut before: Option<Cursor> = None;
    let mut pages = 0;

    let stop = loop {
        if matches.len() >= plan.limit {
            break StopReason::LimitReached;
        }

        let Some(html) = source.fetch_page(&plan.endpoint(before)).await else {
            break StopReason::FetchFailed;
        };
        pages += 1;

        let page = scan_page(&html);
        if page.matches.is_empty() {
            break StopReason::NoMatches {
                card_images: page.card_images,
            };
        }

        let room = plan.limit - matches.len();
        matches.extend(page.matches.into_iter().take(room));
        if matches.len() >= plan.limit {
            break StopReason::LimitReached;
        }

        match page.next_cursor {
            Some(next) if Some(next) != before => before = Some(next),
            _ => break StopReason::CursorExhausted,
        }

        tokio::time::sleep(plan.delay).await;
    };

    let reason: &'static str = stop.into();
    info!(
        "Crawl stopped ({reason}) after {pages} page(s) with {} matches.",
        matches.len()
    );
    match stop {
        StopReason::NoMatches { card_images: 0 } => {
            info!("Last page had no card image, assuming the end of the listing.")
        }
        StopReason::NoMatches { card_images } => warn!(
            "Last page had {card_images} card images but no match could be assembled, \
             the page layout may have changed."
        ),
        _ => {}
    }

    CrawlReport {
        matches,
        pages,
        stop,
    }
}

/// Persist the crawl result, unless it is empty: an empty run never replaces a
/// previous cache.
pub fn commit(
    plan: &CrawlPlan,
    matches: Vec<Match>,
    prior: Option<&PriorCache>,
) -> CrawlerResult<Outcome> {
    if matches.is_empty() {
        info!("Fetched 0 matches, keeping existing cache unchanged.");
        let existing = prior.map(PriorCache::match_count).unwrap_or_default();
        return Ok(match existing {
            0 => {
                info!("No existing cache available.");
                Outcome::NothingCached
            }
            existing => {
                info!("Falling back to existing cache with {existing} matches.");
                Outcome::KeptExisting { existing }
            }
        });
    }

    let (_, top_cards) = aggregate(&matches);
    let payload = CachePayload {
        fetched_at: Utc::now(),
        source: SOURCE.to_string(),
        rank_gate: plan.rank,
        limit: plan.limit,
        total_matches: matches.len(),
        top_cards,
        matches,
    };
    storage::save(&plan.out, &payload)?;

    for card in payload.top_cards.iter() {
        info!(
            "Top card {}: {} appearances ({}%).",
            card.key, card.count, card.rate
        );
    }
    Ok(Outcome::Written {
        total: payload.total_matches,
    })
}

pub async fn refresh<S: PageSource>(source: &S, plan: &CrawlPlan) -> CrawlerResult<Outcome> {
    let prior = load_prior(&plan.out);
    let report = crawl(source, plan).await;
    commit(plan, report.matches, prior.as_ref())
}

fn load_prior(path: &Path) -> Option<PriorCache> {
    let prior = storage::load(path);
    if let Some(cache) = &prior {
        let existing = cache.match_count();
        if existing > 0 {
            info!(
                "Existing cache holds {existing} matches (fetched at {}) in {}.",
                cache.fetched_at().unwrap_or("unknown date"),
                path.display()
            );
        }
    }
    prior
}

pub async fn run(settings: &Settings) -> CrawlerResult<Outcome> {
    let api = RoyaleApi::from_settings(settings)?;
    let plan = CrawlPlan::from_settings(settings);
    refresh(&api, &plan).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlerError;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;

    // Serves canned pages by cursor and records every request.
    struct FakeSource {
        pages: HashMap<Option<Cursor>, String>,
        requested: RefCell<Vec<Option<Cursor>>>,
    }

    impl FakeSource {
        fn new(pages: Vec<(Option<Cursor>, String)>) -> Self {
            FakeSource {
                pages: pages.into_iter().collect(),
                requested: RefCell::new(vec![]),
            }
        }

        fn requested(&self) -> Vec<Option<Cursor>> {
            self.requested.borrow().clone()
        }
    }

    impl PageSource for FakeSource {
        async fn fetch_page(&self, endpoint: &Endpoint) -> Option<String> {
            let Endpoint::RankedDecks { before, .. } = endpoint;
            self.requested.borrow_mut().push(*before);
            self.pages.get(before).cloned()
        }
    }

    // `n` matches worth of keyed card images, optionally linking to `next`.
    fn page(tag: &str, n: usize, next: Option<Cursor>) -> String {
        let imgs: String = (0..n * 16)
            .map(|i| format!(r#"<img class="deck_card" data-card-key="{tag}-{i}">"#))
            .collect();
        let link = next
            .map(|c| format!(r#"<a href="/decks/ranked?lang=en&amp;rank=1000&amp;before={c}">Next</a>"#))
            .unwrap_or_default();
        format!("<html><body><div>{imgs}</div>{link}</body></html>")
    }

    fn plan(limit: usize, out: PathBuf) -> CrawlPlan {
        CrawlPlan {
            limit,
            rank: 1000,
            lang: "en".to_string(),
            delay: Duration::ZERO,
            out,
        }
    }

    #[tokio::test]
    async fn limit_stops_mid_page_without_fetching_more() {
        let source = FakeSource::new(vec![
            (None, page("p1", 8, Some(10))),
            (Some(10), page("p2", 8, None)),
        ]);
        let report = crawl(&source, &plan(5, PathBuf::from("unused.json"))).await;

        assert_eq!(report.matches.len(), 5);
        assert_eq!(report.stop, StopReason::LimitReached);
        assert_eq!(source.requested(), vec![None]);
        assert_eq!(report.matches[4].winner[0], "p1-64");
    }

    #[tokio::test]
    async fn follows_cursors_until_they_run_out() {
        let source = FakeSource::new(vec![
            (None, page("p1", 2, Some(30))),
            (Some(30), page("p2", 2, Some(20))),
            (Some(20), page("p3", 1, None)),
        ]);
        let report = crawl(&source, &plan(100, PathBuf::from("unused.json"))).await;

        assert_eq!(report.matches.len(), 5);
        assert_eq!(report.pages, 3);
        assert_eq!(report.stop, StopReason::CursorExhausted);
        assert_eq!(source.requested(), vec![None, Some(30), Some(20)]);
    }

    #[tokio::test]
    async fn repeated_cursor_stops_the_crawl() {
        let source = FakeSource::new(vec![
            (None, page("p1", 1, Some(7))),
            (Some(7), page("p2", 1, Some(7))),
        ]);
        let report = crawl(&source, &plan(100, PathBuf::from("unused.json"))).await;

        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.stop, StopReason::CursorExhausted);
        assert_eq!(source.requested(), vec![None, Some(7)]);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_what_was_collected() {
        let source = FakeSource::new(vec![(None, page("p1", 3, Some(99)))]);
        let report = crawl(&source, &plan(100, PathBuf::from("unused.json"))).await;

        assert_eq!(report.matches.len(), 3);
        assert_eq!(report.stop, StopReason::FetchFailed);
    }

    #[tokio::test]
    async fn empty_page_ends_the_crawl() {
        let source = FakeSource::new(vec![
            (None, page("p1", 1, Some(5))),
            (Some(5), page("p2", 0, Some(4))),
        ]);
        let report = crawl(&source, &plan(100, PathBuf::from("unused.json"))).await;

        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.stop, StopReason::NoMatches { card_images: 0 });
    }

    #[tokio::test]
    async fn zero_limit_fetches_nothing() {
        let source = FakeSource::new(vec![(None, page("p1", 1, None))]);
        let report = crawl(&source, &plan(0, PathBuf::from("unused.json"))).await;

        assert!(report.matches.is_empty());
        assert_eq!(report.stop, StopReason::LimitReached);
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn failed_run_keeps_prior_cache() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cache.json");
        let prior_matches = (0..40)
            .map(|_| r#"{"winner":[],"loser":[]}"#)
            .collect::<Vec<&str>>()
            .join(",");
        let prior_raw = format!(r#"{{"totalMatches": 40, "matches": [{prior_matches}]}}"#);
        fs::write(&out, &prior_raw).unwrap();

        let source = FakeSource::new(vec![]);
        let outcome = refresh(&source, &plan(1000, out.clone())).await.unwrap();

        assert_eq!(outcome, Outcome::KeptExisting { existing: 40 });
        assert_eq!(outcome.exit_code(false), 2);
        assert_eq!(outcome.exit_code(true), 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), prior_raw);
    }

    #[tokio::test]
    async fn empty_run_without_cache_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cache.json");

        let source = FakeSource::new(vec![(None, page("p1", 0, None))]);
        let outcome = refresh(&source, &plan(10, out.clone())).await.unwrap();

        assert_eq!(outcome, Outcome::NothingCached);
        assert_eq!(outcome.exit_code(false), 2);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn invalid_base_url_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cache.json");
        let settings = Settings::from_figment(figment::Figment::new().merge(
            figment::providers::Serialized::defaults(crate::cli::Cli {
                base_url: Some("not a url".to_string()),
                out: Some(out.display().to_string()),
                ..Default::default()
            }),
        ))
        .unwrap();

        let outcome = run(&settings).await;
        assert!(matches!(outcome, Err(CrawlerError::Config(_))));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn successful_run_replaces_cache() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cache.json");
        fs::write(&out, r#"{"totalMatches": 40}"#).unwrap();

        let source = FakeSource::new(vec![(None, page("p1", 2, None))]);
        let outcome = refresh(&source, &plan(10, out.clone())).await.unwrap();

        assert_eq!(outcome, Outcome::Written { total: 2 });
        assert_eq!(outcome.exit_code(false), 0);
        let payload =
            serde_json::from_str::<CachePayload>(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(payload.total_matches, 2);
        assert_eq!(payload.matches.len(), 2);
        assert_eq!(payload.rank_gate, 1000);
        assert_eq!(payload.limit, 10);
        assert_eq!(payload.source, SOURCE);
        assert_eq!(payload.top_cards.len(), 3);
        // every card appears once, ties resolve alphabetically
        assert_eq!(payload.top_cards[0].key, "p1-0");
        assert_eq!(payload.top_cards[1].key, "p1-1");
        assert_eq!(payload.top_cards[2].key, "p1-10");
        assert_eq!(payload.top_cards[0].rate, 50.0);
    }
}
