use std::collections::{HashMap, VecDeque};

/// Bounded LRU cache of raw abusive probabilities keyed on normalized text.
///
/// Profanity and filler words repeat heavily across a transcript; caching
/// per normalized token avoids re-running the model on the same input.
/// Stores the raw probability, not the thresholded verdict — but the owner
/// still clears the cache on threshold changes so stale derived state can
/// never leak (see `OnnxAbuseClassifier::set_threshold`).
#[derive(Debug)]
pub struct ScoreCache {
    capacity: usize,
    scores: HashMap<String, f32>,
    order: VecDeque<String>,
}

impl ScoreCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            scores: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<f32> {
        let score = self.scores.get(key).copied()?;
        // Move to the back of the eviction queue
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos).unwrap();
            self.order.push_back(k);
        }
        Some(score)
    }

    pub fn insert(&mut self, key: String, score: f32) {
        if self.scores.insert(key.clone(), score).is_none() {
            self.order.push_back(key);
            if self.order.len() > self.capacity {
                if let Some(evicted) = self.order.pop_front() {
                    self.scores.remove(&evicted);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.scores.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut cache = ScoreCache::new(4);
        cache.insert("fuck".to_string(), 0.97);
        assert_eq!(cache.get("fuck"), Some(0.97));
        assert_eq!(cache.get("hello"), None);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let mut cache = ScoreCache::new(2);
        cache.insert("a".to_string(), 0.1);
        cache.insert("b".to_string(), 0.2);
        cache.insert("c".to_string(), 0.3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(0.2));
        assert_eq!(cache.get("c"), Some(0.3));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = ScoreCache::new(2);
        cache.insert("a".to_string(), 0.1);
        cache.insert("b".to_string(), 0.2);
        cache.get("a");
        cache.insert("c".to_string(), 0.3);
        // "b" was least recently used, not "a"
        assert_eq!(cache.get("a"), Some(0.1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_reinsert_updates_value_without_duplicating() {
        let mut cache = ScoreCache::new(4);
        cache.insert("a".to_string(), 0.1);
        cache.insert("a".to_string(), 0.9);
        assert_eq!(cache.get("a"), Some(0.9));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_empties_cache() {
        let mut cache = ScoreCache::new(4);
        cache.insert("a".to_string(), 0.1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let mut cache = ScoreCache::new(0);
        cache.insert("a".to_string(), 0.1);
        assert_eq!(cache.get("a"), Some(0.1));
    }
}
