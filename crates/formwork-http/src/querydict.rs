//! Ordered dictionary for submitted form body data.
//!
//! [`QueryDict`] wraps [`MultiValueDict`](formwork_core::utils::MultiValueDict)
//! and keeps keys in submission order, which the list-field decoder relies on
//! to enumerate sub-records in a stable order.

use formwork_core::utils::MultiValueDict;

/// An ordered, multi-valued dictionary of form body data.
///
/// # Examples
///
/// ```
/// use formwork_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("blue"));
/// assert_eq!(qd.get_list("color"), Some(&vec!["red".to_string(), "blue".to_string()]));
/// assert_eq!(qd.keys().collect::<Vec<_>>(), vec!["color", "size"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryDict {
    data: MultiValueDict<String, String>,
}

impl QueryDict {
    /// Creates a new, empty `QueryDict`.
    pub fn new() -> Self {
        Self {
            data: MultiValueDict::new(),
        }
    }

    /// Parses a URL-encoded string (e.g., `"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding and `+` as space, and supports multiple
    /// values per key.
    pub fn parse(query_string: &str) -> Self {
        let mut data = MultiValueDict::new();

        for pair in query_string.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));

            data.append(percent_decode(key), percent_decode(value));
        }

        Self { data }
    }

    /// Builds a `QueryDict` from `(key, value)` pairs, preserving their order.
    ///
    /// # Examples
    ///
    /// ```
    /// use formwork_http::QueryDict;
    ///
    /// let qd = QueryDict::from_pairs([("items_li0_qty", "3"), ("items_li0_note", "hi")]);
    /// assert_eq!(qd.get("items_li0_qty"), Some("3"));
    /// ```
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the last value for the given key, or `None` if not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(&key.to_string()).map(String::as_str)
    }

    /// Returns all values for the given key, or `None` if not present.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.data.get_list(&key.to_string())
    }

    /// Sets a single value for the given key, replacing any existing values.
    pub fn set(&mut self, key: &str, value: &str) {
        self.data.set(key.to_string(), value.to_string());
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: &str, value: &str) {
        self.data.append(key.to_string(), value.to_string());
    }

    /// Encodes this `QueryDict` as a URL-encoded string, in insertion order.
    pub fn urlencode(&self) -> String {
        let mut parts = Vec::new();

        for (key, values) in self.data.iter() {
            for value in values {
                parts.push(format!("{}={}", percent_encode(key), percent_encode(value)));
            }
        }

        parts.join("&")
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(&key.to_string())
    }

    /// Returns an iterator over the keys in submission order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Returns an iterator over `(key, values)` pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vec<String>)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Decodes a percent-encoded string.
fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Percent-encodes a string for use in a form body.
fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let qd = QueryDict::new();
        assert!(qd.is_empty());
        assert_eq!(qd.len(), 0);
    }

    #[test]
    fn test_parse_simple() {
        let qd = QueryDict::parse("key=value");
        assert_eq!(qd.get("key"), Some("value"));
        assert_eq!(qd.len(), 1);
    }

    #[test]
    fn test_parse_multiple_values() {
        let qd = QueryDict::parse("color=red&color=blue&color=green");
        assert_eq!(qd.get("color"), Some("green"));
        assert_eq!(qd.get_list("color").map(Vec::len), Some(3));
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(QueryDict::parse("").is_empty());
        assert!(QueryDict::parse("&&").is_empty());
    }

    #[test]
    fn test_parse_key_without_value() {
        let qd = QueryDict::parse("items_li0_note&x=1");
        assert_eq!(qd.get("items_li0_note"), Some(""));
    }

    #[test]
    fn test_parse_percent_and_plus() {
        let qd = QueryDict::parse("note=hello+world&city=S%C3%A3o%20Paulo&a%2Eb=1");
        assert_eq!(qd.get("note"), Some("hello world"));
        assert_eq!(qd.get("city"), Some("São Paulo"));
        assert_eq!(qd.get("a.b"), Some("1"));
    }

    #[test]
    fn test_parse_preserves_order() {
        let qd = QueryDict::parse("items_li3_qty=1&items_li0_qty=2&items_li1_qty=3");
        let keys: Vec<_> = qd.keys().collect();
        assert_eq!(keys, vec!["items_li3_qty", "items_li0_qty", "items_li1_qty"]);
    }

    #[test]
    fn test_set_and_append() {
        let mut qd = QueryDict::new();
        qd.set("a", "1");
        qd.append("a", "2");
        qd.set("b", "3");
        assert_eq!(qd.get_list("a"), Some(&vec!["1".to_string(), "2".to_string()]));
        qd.set("a", "9");
        assert_eq!(qd.get("a"), Some("9"));
        assert!(qd.contains_key("b"));
    }

    #[test]
    fn test_urlencode_keeps_order() {
        let qd = QueryDict::from_pairs([("z", "1"), ("a", "x y")]);
        assert_eq!(qd.urlencode(), "z=1&a=x%20y");
    }

    #[test]
    fn test_urlencode_roundtrip() {
        let qd = QueryDict::parse("items_li0_address.city=Paris&tags=a&tags=b");
        let again = QueryDict::parse(&qd.urlencode());
        assert_eq!(again.get("items_li0_address.city"), Some("Paris"));
        assert_eq!(again.get_list("tags").map(Vec::len), Some(2));
    }
}
