use std::time::Instant;

use tracing::debug;

use crate::query::Predicate;
use crate::store::EntryStore;

/// Entry indices satisfying the current predicate, kept in ascending order
#[derive(Debug, Default)]
pub struct MatchIndex {
    indices: Vec<usize>,
}

impl MatchIndex {
    /// Recompute from scratch against every entry.
    ///
    /// An entry whose evaluation fails is a non-match; the pass continues.
    pub fn rebuild(&mut self, predicate: Option<&Predicate>, store: &EntryStore) {
        self.clear();
        let Some(predicate) = predicate else {
            return;
        };

        let started = Instant::now();
        let mut failures = 0usize;
        for (i, entry) in store.iter().enumerate() {
            match predicate.evaluate(&entry.fields) {
                Ok(true) => self.indices.push(i),
                Ok(false) => {}
                Err(_) => failures += 1,
            }
        }

        debug!(
            query = predicate.source(),
            matches = self.indices.len(),
            failures,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rebuilt match index"
        );
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Entry index at a position within the match list
    pub fn get(&self, position: usize) -> Option<usize> {
        self.indices.get(position).copied()
    }

    /// Smallest matched index strictly greater than `from`
    pub fn next(&self, from: usize) -> Option<usize> {
        let pos = self.indices.partition_point(|&i| i <= from);
        self.indices.get(pos).copied()
    }

    /// Largest matched index strictly less than `from`
    pub fn previous(&self, from: usize) -> Option<usize> {
        let pos = self.indices.partition_point(|&i| i < from);
        pos.checked_sub(1).map(|p| self.indices[p])
    }

    /// Position of the match closest to `index`, preferring the earlier one on ties
    pub fn nearest_position(&self, index: usize) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let pos = match self.indices.binary_search(&index) {
            Ok(pos) => pos,
            Err(0) => 0,
            Err(pos) if pos >= self.indices.len() => self.indices.len() - 1,
            Err(pos) => {
                let before = self.indices[pos - 1];
                let after = self.indices[pos];
                if index - before <= after - index { pos - 1 } else { pos }
            }
        };
        Some(pos)
    }

    /// "1 match", "0 matches", "2 matches"
    pub fn status_text(&self) -> String {
        match self.count() {
            1 => "1 match".to_string(),
            n => format!("{} matches", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compile;
    use crate::store::{LogEntry, Record};

    fn store(lines: &[&str]) -> EntryStore {
        let entries = lines
            .iter()
            .map(|line| match Record::decode(line.as_bytes()) {
                Record::Parsed(entry) => entry,
                Record::Skipped(reason) => panic!("bad fixture: {}", reason),
            })
            .collect::<Vec<LogEntry>>();
        EntryStore::new(entries)
    }

    fn index_of(indices: &[usize]) -> MatchIndex {
        MatchIndex { indices: indices.to_vec() }
    }

    #[test]
    fn test_level_error_scenario() {
        let store = store(&[
            r#"{"level":"info","message":"a"}"#,
            r#"{"level":"error","message":"b"}"#,
            r#"{"level":"warn","message":"c"}"#,
        ]);
        let predicate = compile(r#"level == "error""#).unwrap();
        let mut matches = MatchIndex::default();
        matches.rebuild(Some(&predicate), &store);

        assert_eq!(matches.indices, vec![1]);
        assert_eq!(matches.count(), 1);
        assert_eq!(matches.status_text(), "1 match");
    }

    #[test]
    fn test_eval_failure_is_non_match() {
        let store = store(&[
            r#"{"status":500}"#,
            r#"{"status":"unknown"}"#,
            r#"{"status":503}"#,
        ]);
        let predicate = compile("status >= 500").unwrap();
        let mut matches = MatchIndex::default();
        matches.rebuild(Some(&predicate), &store);
        assert_eq!(matches.indices, vec![0, 2]);
    }

    #[test]
    fn test_rebuild_without_predicate_is_empty() {
        let store = store(&[r#"{"level":"error"}"#]);
        let mut matches = index_of(&[0]);
        matches.rebuild(None, &store);
        assert!(matches.is_empty());
        assert_eq!(matches.status_text(), "0 matches");
    }

    #[test]
    fn test_next_and_previous_are_strict() {
        let matches = index_of(&[2, 5, 9]);
        assert_eq!(matches.next(0), Some(2));
        assert_eq!(matches.next(2), Some(5));
        assert_eq!(matches.next(9), None);
        assert_eq!(matches.previous(9), Some(5));
        assert_eq!(matches.previous(2), None);
        assert_eq!(matches.previous(100), Some(9));
    }

    #[test]
    fn test_next_walks_in_order_without_wrapping() {
        let matches = index_of(&[1, 4, 6, 7]);
        let mut visited = Vec::new();
        let mut from = 0;
        while let Some(next) = matches.next(from) {
            assert!(next > from);
            visited.push(next);
            from = next;
        }
        assert_eq!(visited, vec![1, 4, 6, 7]);
        assert_eq!(matches.next(7), None);
    }

    #[test]
    fn test_membership_and_nearest() {
        let matches = index_of(&[10, 20, 40]);
        assert!(matches.contains(20));
        assert!(!matches.contains(21));
        assert_eq!(matches.nearest_position(0), Some(0));
        assert_eq!(matches.nearest_position(29), Some(1));
        assert_eq!(matches.nearest_position(30), Some(1));
        assert_eq!(matches.nearest_position(31), Some(2));
        assert_eq!(matches.nearest_position(99), Some(2));
        assert_eq!(MatchIndex::default().nearest_position(3), None);
    }

    #[test]
    fn test_plural_status() {
        assert_eq!(index_of(&[1, 2]).status_text(), "2 matches");
    }
}
