use indexmap::IndexMap;
use itertools::Itertools;

/// Occurrence counter with exact string keys.
///
/// Every addition is attributed to a source of type `S`, remembered in
/// observation order: the raw line text for ignored input, a thread
/// reference for the running-method tally.
#[derive(Debug)]
pub struct StringCounter<S> {
    counts: IndexMap<String, Entry<S>>,
    total: usize,
}

#[derive(Debug)]
struct Entry<S> {
    count: usize,
    sources: Vec<S>,
}

/// One counted key, as returned by [`StringCounter::counted`].
#[derive(Debug, PartialEq)]
pub struct Counted<'a, S> {
    pub count: usize,
    pub key: &'a str,
    pub sources: &'a [S],
}

impl<S> StringCounter<S> {
    pub fn new() -> Self {
        Self {
            counts: IndexMap::new(),
            total: 0,
        }
    }

    /// Add one occurrence of `key` attributed to `source`.
    pub fn add(&mut self, key: &str, source: S) {
        let entry = self
            .counts
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                count: 0,
                sources: vec![],
            });
        entry.count += 1;
        entry.sources.push(source);
        self.total += 1;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of additions across all keys (not the number of
    /// distinct keys).
    pub fn total(&self) -> usize {
        self.total
    }

    /// All keys with their counts and sources, most frequent first, equal
    /// counts resolved by ascending key order.
    pub fn counted(&self) -> Vec<Counted<'_, S>> {
        let mut entries = self
            .counts
            .iter()
            .map(|(key, entry)| Counted {
                count: entry.count,
                key,
                sources: entry.sources.as_slice(),
            })
            .collect_vec();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(b.key)));
        entries
    }
}

impl<S> Default for StringCounter<S> {
    fn default() -> Self {
        Self::new()
    }
}
