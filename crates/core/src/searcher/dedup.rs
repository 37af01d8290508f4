//! Deduplication and ranking of scored candidates by info_hash.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::TorrentCandidate;

/// Collapse candidates sharing an info_hash and sort the survivors by score.
///
/// A duplicate replaces the stored candidate only when its score is strictly
/// higher; it takes over the stored candidate's position so that equal inputs
/// produce equal outputs. The final sort is stable and descending.
pub fn dedup_and_rank(candidates: Vec<TorrentCandidate>) -> Vec<TorrentCandidate> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut results: Vec<TorrentCandidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match position.get(&candidate.info_hash) {
            Some(&idx) => {
                if candidate.score > results[idx].score {
                    results[idx] = candidate;
                }
            }
            None => {
                position.insert(candidate.info_hash.clone(), results.len());
                results.push(candidate);
            }
        }
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::ProviderKind;

    fn make(name: &str, hash: &str, score: f64) -> TorrentCandidate {
        TorrentCandidate {
            name: name.to_string(),
            info_hash: hash.to_string(),
            seeders: 0,
            leechers: 0,
            size_bytes: 1000,
            provider: ProviderKind::Knaben,
            category: None,
            imdb_id: None,
            magnet_uri: format!("magnet:?xt=urn:btih:{}", hash),
            score,
        }
    }

    #[test]
    fn test_dedup_single_result() {
        let results = dedup_and_rank(vec![make("Test", "hash1", 10.0)]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Test");
    }

    #[test]
    fn test_dedup_keeps_max_score() {
        let results = dedup_and_rank(vec![
            make("A", "hash1", 10.0),
            make("B", "hash1", 30.0),
            make("C", "hash1", 20.0),
        ]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "B");
        assert_eq!(results[0].score, 30.0);
    }

    #[test]
    fn test_dedup_tie_keeps_first_seen() {
        let results = dedup_and_rank(vec![make("First", "hash1", 10.0), make("Second", "hash1", 10.0)]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "First");
    }

    #[test]
    fn test_dedup_sorts_by_score() {
        let results = dedup_and_rank(vec![
            make("Low", "hash1", 5.0),
            make("High", "hash2", 50.0),
            make("Medium", "hash3", 20.0),
        ]);

        let names: Vec<_> = results.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Medium", "Low"]);
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let results = dedup_and_rank(vec![
            make("One", "hash1", 7.0),
            make("Two", "hash2", 7.0),
            make("Three", "hash3", 9.0),
        ]);

        let names: Vec<_> = results.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Three", "One", "Two"]);
    }

    #[test]
    fn test_replacement_takes_stored_position() {
        let results = dedup_and_rank(vec![
            make("A", "hash1", 5.0),
            make("B", "hash2", 5.0),
            make("A-better", "hash1", 5.5),
            make("C", "hash3", 5.5),
        ]);

        let names: Vec<_> = results.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A-better", "C", "B"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup_and_rank(Vec::new()).is_empty());
    }
}
