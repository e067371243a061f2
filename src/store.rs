use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};

/// The key → result map owned by one wrapper instance.
///
/// Entries are only ever added. A key is in one of two states: absent, or
/// present with exactly one immutable stored result.
pub(crate) struct Store<Out> {
    map: PassthroughHashMap<Out>,
}

impl<Out> Store<Out> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { map: HashMap::default() }
    }

    /// Look for a stored result under the given key.
    pub fn lookup(&self, key: u128) -> Option<&Out> {
        self.map.get(&key)
    }

    /// Store a result for a key and return the entry that won.
    ///
    /// First write wins: a key that is already present keeps its original
    /// result. This only matters for shared wrappers, where two callers
    /// may compute the same key concurrently.
    pub fn insert(&mut self, key: u128, output: Out) -> &Out {
        self.map.entry(key).or_insert(output)
    }

    /// The number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Hit and miss counts observed by one wrapper instance.
///
/// `misses` equals the number of times the underlying computation was
/// invoked, failed attempts included, so tests can assert how much work
/// the cache eliminated.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Stats {
    /// Calls served from the store without invoking the computation.
    pub hits: usize,
    /// Calls that invoked the underlying computation.
    pub misses: usize,
}

/// Hash map that re-uses the 128-bit derived key as the hash value.
type PassthroughHashMap<Value> = HashMap<u128, Value, BuildPassthroughHasher>;

#[derive(Copy, Clone, Default)]
struct BuildPassthroughHasher;

#[derive(Default)]
struct PassthroughHasher {
    value: u64,
}

impl Hasher for PassthroughHasher {
    #[inline(always)]
    fn finish(&self) -> u64 {
        self.value
    }

    #[inline]
    fn write(&mut self, _bytes: &[u8]) {
        unimplemented!("keys are always written as u128")
    }

    #[inline]
    fn write_u128(&mut self, i: u128) {
        // truncating conversion
        self.value = i as u64;
    }
}

impl BuildHasher for BuildPassthroughHasher {
    type Hasher = PassthroughHasher;

    #[inline]
    fn build_hasher(&self) -> PassthroughHasher {
        PassthroughHasher::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_wins() {
        let mut store = Store::new();
        store.insert(7, "first");
        store.insert(7, "second");
        assert_eq!(store.lookup(7), Some(&"first"));
        assert_eq!(store.len(), 1);
    }
}
