use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DECK_SIZE: usize = 8;
pub const CARDS_PER_MATCH: usize = 2 * DECK_SIZE;
pub const SOURCE: &str = "royaleapi.com/decks/ranked";

// Opaque card identifier, compared as-is once trimmed.
pub type CardKey = String;

// One recorded battle. Both decks always hold exactly DECK_SIZE cards, the
// constructors refuse anything shorter and drop the excess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub winner: Vec<CardKey>,
    pub loser: Vec<CardKey>,
}

impl Match {
    pub fn from_decks(winner: &[CardKey], loser: &[CardKey]) -> Option<Self> {
        match (winner.len() >= DECK_SIZE, loser.len() >= DECK_SIZE) {
            (true, true) => Some(Match {
                winner: winner[..DECK_SIZE].to_vec(),
                loser: loser[..DECK_SIZE].to_vec(),
            }),
            (_, _) => None,
        }
    }

    /// First 8 keys are the winning deck, the next 8 the losing one.
    pub fn from_flat(keys: &[CardKey]) -> Option<Self> {
        if keys.len() < CARDS_PER_MATCH {
            return None;
        }
        Match::from_decks(&keys[..DECK_SIZE], &keys[DECK_SIZE..CARDS_PER_MATCH])
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardKey> {
        self.winner.iter().chain(self.loser.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardStat {
    pub key: CardKey,
    pub count: usize,
    // Percentage of matches featuring the card, two decimals
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePayload {
    pub fetched_at: DateTime<Utc>,
    pub source: String,
    pub rank_gate: u32,
    pub limit: usize,
    pub total_matches: usize,
    pub top_cards: Vec<CardStat>,
    pub matches: Vec<Match>,
}
