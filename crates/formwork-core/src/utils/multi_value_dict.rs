//! A dictionary that can hold multiple values per key.
//!
//! Request payloads are re-encoded on render and decoded again on the next
//! submission, so iteration order has to follow the order in which keys were
//! first inserted. [`MultiValueDict`] keeps that order.

use std::collections::HashMap;
use std::hash::Hash;

/// An insertion-ordered dictionary that maps keys to lists of values.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key, while
/// [`get_list`](MultiValueDict::get_list) returns all values. Iteration
/// yields keys in the order they were first inserted.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color".to_string(), "red");
/// d.append("size".to_string(), "large");
/// d.append("color".to_string(), "blue");
///
/// assert_eq!(d.get(&"color".to_string()), Some(&"blue"));
/// assert_eq!(d.get_list(&"color".to_string()), Some(&vec!["red", "blue"]));
/// let keys: Vec<_> = d.keys().cloned().collect();
/// assert_eq!(keys, vec!["color".to_string(), "size".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct MultiValueDict<K: Eq + Hash, V> {
    positions: HashMap<K, usize>,
    entries: Vec<(K, Vec<V>)>,
}

impl<K: Eq + Hash, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> MultiValueDict<K, V> {
    /// Sets the value for a key, replacing any existing values.
    ///
    /// A replaced key keeps its original position.
    pub fn set(&mut self, key: K, value: V) {
        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos].1 = vec![value],
            None => self.push_entry(key, vec![value]),
        }
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos].1.push(value),
            None => self.push_entry(key, vec![value]),
        }
    }

    fn push_entry(&mut self, key: K, values: Vec<V>) {
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, values));
    }
}

impl<K: Eq + Hash, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Returns a reference to the **last** value associated with the key,
    /// or `None` if the key is not present.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_list(key).and_then(|v| v.last())
    }

    /// Returns a reference to all values associated with the key,
    /// or `None` if the key is not present.
    pub fn get_list(&self, key: &K) -> Option<&Vec<V>> {
        self.positions.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over all value lists in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Vec<V>> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Returns an iterator over (key, value-list) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Vec<V>)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }
}

impl<K: Eq + Hash, V> IntoIterator for MultiValueDict<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::vec::IntoIter<(K, Vec<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.append(k, v);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let d: MultiValueDict<String, String> = MultiValueDict::new();
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn test_set_and_get() {
        let mut d = MultiValueDict::new();
        d.set("key", "value");
        assert_eq!(d.get(&"key"), Some(&"value"));
        assert_eq!(d.get_list(&"key"), Some(&vec!["value"]));
    }

    #[test]
    fn test_append_and_get_returns_last() {
        let mut d = MultiValueDict::new();
        d.append("color", "red");
        d.append("color", "blue");
        d.append("color", "green");

        assert_eq!(d.get(&"color"), Some(&"green"));
        assert_eq!(d.get_list(&"color"), Some(&vec!["red", "blue", "green"]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_set_replaces_existing_in_place() {
        let mut d = MultiValueDict::new();
        d.append("k", "a");
        d.append("other", "x");
        d.append("k", "b");
        d.set("k", "c");
        assert_eq!(d.get_list(&"k"), Some(&vec!["c"]));
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["k", "other"]);
    }

    #[test]
    fn test_get_missing_key() {
        let d: MultiValueDict<&str, &str> = MultiValueDict::new();
        assert_eq!(d.get(&"missing"), None);
        assert_eq!(d.get_list(&"missing"), None);
    }

    #[test]
    fn test_contains_key() {
        let mut d = MultiValueDict::new();
        d.set("a", 1);
        assert!(d.contains_key(&"a"));
        assert!(!d.contains_key(&"b"));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut d = MultiValueDict::new();
        for key in ["z", "a", "m", "b"] {
            d.append(key, 0);
        }
        let keys: Vec<_> = d.keys().copied().collect();
        assert_eq!(keys, vec!["z", "a", "m", "b"]);
    }

    #[test]
    fn test_iter_and_into_iter() {
        let mut d = MultiValueDict::new();
        d.append("a", 1);
        d.append("b", 3);
        d.append("a", 2);

        let items: Vec<_> = d.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(items, vec![("a", vec![1, 2]), ("b", vec![3])]);

        let owned: Vec<_> = d.into_iter().collect();
        assert_eq!(owned, vec![("a", vec![1, 2]), ("b", vec![3])]);
    }

    #[test]
    fn test_from_iterator() {
        let d: MultiValueDict<&str, i32> = vec![("x", 1), ("y", 2), ("x", 3)].into_iter().collect();
        assert_eq!(d.get_list(&"x"), Some(&vec![1, 3]));
        assert_eq!(d.values().count(), 2);
    }
}
