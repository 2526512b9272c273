use crate::counters::Counter;
use std::collections::HashSet;
use std::hash::Hash;

/// Ground-truth distinct count: remembers every element it has seen.
pub struct ExactCounter<T> {
    seen: HashSet<T>,
}

impl<T: Hash + Eq> ExactCounter<T> {
    pub fn new() -> Self {
        ExactCounter {
            seen: HashSet::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ExactCounter {
            seen: HashSet::with_capacity(capacity),
        }
    }

    pub fn size(&self) -> usize {
        self.seen.len()
    }
}

impl<T: Hash + Eq> Default for ExactCounter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> Counter<T> for ExactCounter<T> {
    fn add(&mut self, item: &T) {
        if !self.seen.contains(item) {
            self.seen.insert(item.clone());
        }
    }

    fn estimate(&self) -> f64 {
        self.seen.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_distinct_values() {
        let mut counter = ExactCounter::new();
        for word in ["a", "b", "a", "c", "b"] {
            counter.add(&word.to_string());
        }
        assert_eq!(counter.size(), 3);
        assert_eq!(counter.estimate(), 3.0);
    }

    #[test]
    fn empty_counter() {
        let counter: ExactCounter<u64> = ExactCounter::default();
        assert_eq!(counter.size(), 0);
    }
}
