//! String utility functions used when rendering fields.

use regex::Regex;
use std::sync::OnceLock;

/// Capitalizes the first character of a string.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::text::capfirst;
///
/// assert_eq!(capfirst("hello"), "Hello");
/// assert_eq!(capfirst(""), "");
/// assert_eq!(capfirst("HELLO"), "HELLO");
/// ```
pub fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |c| {
        let mut result = c.to_uppercase().to_string();
        result.extend(chars);
        result
    })
}

/// Turns a field name into a display label.
///
/// The name is split on underscores, every non-empty word is capitalized and
/// the words are joined with single spaces. Empty words (from doubled
/// underscores) are kept, so they surface as extra spaces.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::text::humanize_name;
///
/// assert_eq!(humanize_name("first_name"), "First Name");
/// assert_eq!(humanize_name("email"), "Email");
/// assert_eq!(humanize_name("a__b"), "A  B");
/// ```
pub fn humanize_name(name: &str) -> String {
    name.split('_').map(capfirst).collect::<Vec<_>>().join(" ")
}

/// Escapes the five HTML-significant characters.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::text::escape_html;
///
/// assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replaces whitespace, hyphens and parentheses with underscores.
///
/// Used to build storage-safe filenames from client-supplied names.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::text::sanitize_filename_part;
///
/// assert_eq!(sanitize_filename_part("my file (1)-final"), "my_file__1__final");
/// ```
pub fn sanitize_filename_part(s: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[\s\-()]").expect("valid regex"));
    re.replace_all(s, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capfirst() {
        assert_eq!(capfirst("hello"), "Hello");
        assert_eq!(capfirst("h"), "H");
        assert_eq!(capfirst(""), "");
    }

    #[test]
    fn test_capfirst_unicode() {
        assert_eq!(capfirst("élan"), "Élan");
    }

    #[test]
    fn test_humanize_name() {
        assert_eq!(humanize_name("first_name"), "First Name");
        assert_eq!(humanize_name("qty"), "Qty");
        assert_eq!(humanize_name("_private"), " Private");
        assert_eq!(humanize_name(""), "");
    }

    #[test]
    fn test_humanize_name_keeps_dots() {
        assert_eq!(humanize_name("address.city"), "Address.city");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(escape_html("<b>"), "&lt;b&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
    }

    #[test]
    fn test_sanitize_filename_part() {
        assert_eq!(sanitize_filename_part("report"), "report");
        assert_eq!(sanitize_filename_part("a b\tc"), "a_b_c");
        assert_eq!(sanitize_filename_part("x-(y)"), "x__y_");
    }
}
