//! Flat key/value map for record data.
//!
//! [`FlatMap`] is the flattened form of a record: every key is a
//! delimiter-joined path and every value is a scalar string. It wraps an
//! [`IndexMap`] so iteration follows insertion order, while equality compares
//! the key/value sets and ignores order.
//!
//! ## Examples
//!
//! ```rust
//! use protogroup::FlatMap;
//!
//! let mut map = FlatMap::new();
//! map.insert("database,port", "3306");
//! map.insert("database,host", "localhost");
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, vec!["database,port", "database,host"]);
//!
//! let sorted: Vec<_> = map.sorted().into_iter().map(|(k, _)| k.as_str()).collect();
//! assert_eq!(sorted, vec!["database,host", "database,port"]);
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;

/// An insertion-ordered map of flattened keys to scalar values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlatMap(IndexMap<String, String>);

impl FlatMap {
    #[must_use]
    pub fn new() -> Self {
        FlatMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        FlatMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, String> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, String> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Returns the entries sorted by key.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&String, &String)> {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Returns the entries whose key starts with `prefix`, in insertion order.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> FlatMap {
        self.0
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl From<HashMap<String, String>> for FlatMap {
    fn from(map: HashMap<String, String>) -> Self {
        FlatMap(map.into_iter().collect())
    }
}

impl From<FlatMap> for HashMap<String, String> {
    fn from(map: FlatMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for FlatMap {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlatMap {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for FlatMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        FlatMap(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K, V> Extend<(K, V)> for FlatMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.0.insert(k.into(), v.into());
        }
    }
}
