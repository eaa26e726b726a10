use crate::core::deck::{CardKey, CardStat, Match};
use crate::utils::round_hundredths;
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::HashMap;

pub const TOP_CARDS: usize = 3;

/// Card => number of appearances, both sides of every match included.
pub fn card_counts(matches: &[Match]) -> HashMap<CardKey, usize> {
    matches
        .iter()
        .flat_map(|m| m.cards())
        .filter(|key| !key.is_empty())
        .fold(HashMap::new(), |mut acc, key| {
            *acc.entry(key.clone()).or_insert(0) += 1;
            acc
        })
}

/// Most played cards, by descending count then ascending key.
pub fn top_cards(counts: &HashMap<CardKey, usize>, total_matches: usize) -> Vec<CardStat> {
    counts
        .iter()
        .sorted_by_key(|(key, count)| (Reverse(**count), *key))
        .take(TOP_CARDS)
        .map(|(key, count)| CardStat {
            key: key.clone(),
            count: *count,
            rate: match total_matches {
                0 => 0.0,
                total => round_hundredths(*count as f64 / total as f64 * 100.0),
            },
        })
        .collect()
}

pub fn aggregate(matches: &[Match]) -> (HashMap<CardKey, usize>, Vec<CardStat>) {
    let counts = card_counts(matches);
    let top = top_cards(&counts, matches.len());
    (counts, top)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(cards: [&str; 8]) -> Vec<CardKey> {
        cards.iter().map(|c| c.to_string()).collect()
    }

    fn sample() -> Vec<Match> {
        vec![
            Match {
                winner: deck(["knight", "archers", "log", "fireball", "hog", "musketeer", "skeletons", "cannon"]),
                loser: deck(["knight", "giant", "zap", "witch", "minions", "arrows", "valkyrie", "bats"]),
            },
            Match {
                winner: deck(["giant", "archers", "zap", "witch", "golem", "pekka", "miner", "poison"]),
                loser: deck(["hog", "musketeer", "log", "fireball", "ice-spirit", "cannon", "skeletons", "knight"]),
            },
        ]
    }

    #[test]
    fn counts_both_sides_without_dedup() {
        let counts = card_counts(&sample());
        assert_eq!(counts["knight"], 3);
        assert_eq!(counts["archers"], 2);
        assert_eq!(counts["golem"], 1);
        assert_eq!(counts.values().sum::<usize>(), 32);
    }

    #[test]
    fn ties_are_broken_by_key() {
        let (_, top) = aggregate(&sample());
        let keys = top.iter().map(|s| s.key.as_str()).collect::<Vec<&str>>();
        // knight leads, then the alphabetically first cards seen twice
        assert_eq!(keys, vec!["knight", "archers", "cannon"]);
        assert_eq!(top[0].count, 3);
        assert_eq!(top[0].rate, 150.0);
        assert_eq!(top[1].rate, 100.0);
    }

    #[test]
    fn rates_are_rounded_to_two_decimals() {
        let mut counts = HashMap::new();
        counts.insert("miner".to_string(), 1);
        let top = top_cards(&counts, 3);
        assert_eq!(top[0].rate, 33.33);
    }

    #[test]
    fn exact_halves_round_to_even() {
        let mut counts = HashMap::new();
        counts.insert("miner".to_string(), 1);
        counts.insert("golem".to_string(), 3);
        let top = top_cards(&counts, 32);
        // 3/32 = 9.375%, 1/32 = 3.125%
        assert_eq!(top[0].rate, 9.38);
        assert_eq!(top[1].rate, 3.12);
    }

    #[test]
    fn no_matches_means_zero_rate() {
        let mut counts = HashMap::new();
        counts.insert("miner".to_string(), 2);
        assert_eq!(top_cards(&counts, 0)[0].rate, 0.0);
        assert!(aggregate(&[]).1.is_empty());
    }
}
