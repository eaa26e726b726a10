use crate::core::deck::{CardKey, Match, CARDS_PER_MATCH};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

// The listing markup has used several class names for the same concepts over
// time. Alternatives are listed by priority: each one is queried in turn and
// the results concatenated.
const BATTLE_SELECTORS: [&'static str; 4] = [
    "div.battle_list_battle",
    "div.battle_list_battle_container",
    "div.battle",
    "div.battle__container",
];
const TEAM_SELECTORS: [&'static str; 3] = ["div.team-segment", "div.team_segment", "div.team"];
const CARD_IMG_SELECTORS: [&'static str; 2] = ["img.deck_card", "img[data-card-key]"];

static SELECTORS_BATTLE: Lazy<Vec<Selector>> = Lazy::new(|| parse_all(&BATTLE_SELECTORS));
static SELECTORS_TEAM: Lazy<Vec<Selector>> = Lazy::new(|| parse_all(&TEAM_SELECTORS));
static SELECTOR_CARD_IMG: Lazy<Selector> = Lazy::new(|| union_selector(&CARD_IMG_SELECTORS));

// Card art lives under `/cards/<key>/...`
static REGEX_CARD_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r"/cards/([a-z0-9\-]+)/").unwrap());

type BlockStrategy = (&'static str, fn(ElementRef) -> Option<Match>);

// Tried in order on every battle block, the first one producing a match wins.
const BLOCK_STRATEGIES: [BlockStrategy; 2] = [
    ("team_segments", split_team_segments),
    ("flat", split_flat),
];

// Selectors are compile time constants, parsing them can't fail.
fn union_selector(alternatives: &[&str]) -> Selector {
    Selector::parse(&alternatives.join(", ")).unwrap()
}

fn parse_all(alternatives: &[&str]) -> Vec<Selector> {
    alternatives
        .iter()
        .map(|alternative| Selector::parse(alternative).unwrap())
        .collect()
}

// An element matched by several alternatives keeps its first position only.
fn select_prioritized<'a, I>(
    selectors: &'static [Selector],
    select: impl Fn(&'static Selector) -> I,
) -> Vec<ElementRef<'a>>
where
    I: Iterator<Item = ElementRef<'a>>,
{
    selectors
        .iter()
        .flat_map(select)
        .unique_by(|element| element.id())
        .collect()
}

/// Extract every match found in a listing page.
pub fn extract(html: &str) -> Vec<Match> {
    extract_from(&Html::parse_document(html))
}

pub fn extract_from(document: &Html) -> Vec<Match> {
    let blocks = select_prioritized(&SELECTORS_BATTLE, |selector| document.select(selector));

    // Without any battle wrapper, fall back to slicing the whole page.
    if blocks.is_empty() {
        debug!("No battle block found, chunking card images of the whole page.");
        return chunk_page(document);
    }

    blocks
        .into_iter()
        .filter(|block| block.select(&SELECTOR_CARD_IMG).count() >= CARDS_PER_MATCH)
        .filter_map(extract_block)
        .collect()
}

/// Number of card images in the page, whatever their container.
pub fn count_card_images(document: &Html) -> usize {
    document.select(&SELECTOR_CARD_IMG).count()
}

fn extract_block(block: ElementRef) -> Option<Match> {
    BLOCK_STRATEGIES.iter().find_map(|(name, strategy)| {
        let found = strategy(block);
        if found.is_some() {
            debug!("Battle block parsed with the {name} strategy.");
        }
        found
    })
}

// Left segment is the winner, right segment the loser.
fn split_team_segments(block: ElementRef) -> Option<Match> {
    let segments = select_prioritized(&SELECTORS_TEAM, |selector| block.select(selector));
    match segments.as_slice() {
        [winner, loser, ..] => Match::from_decks(&card_keys(*winner), &card_keys(*loser)),
        _ => None,
    }
}

fn split_flat(block: ElementRef) -> Option<Match> {
    Match::from_flat(&card_keys(block))
}

fn chunk_page(document: &Html) -> Vec<Match> {
    let keys = document
        .select(&SELECTOR_CARD_IMG)
        .filter_map(card_key)
        .collect::<Vec<CardKey>>();

    keys.chunks_exact(CARDS_PER_MATCH)
        .filter_map(Match::from_flat)
        .collect()
}

fn card_keys(scope: ElementRef) -> Vec<CardKey> {
    scope.select(&SELECTOR_CARD_IMG).filter_map(card_key).collect()
}

// Prefer the explicit data attribute, then the image url. Images yielding
// neither are skipped.
fn card_key(img: ElementRef) -> Option<CardKey> {
    let element = img.value();
    element
        .attr("data-card-key")
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .or_else(|| {
            element
                .attr("src")
                .and_then(|src| REGEX_CARD_SRC.captures(src.trim()))
                .and_then(|captures| captures.get(1))
                .map(|key| key.as_str())
        })
        .map(str::to_string)
}
