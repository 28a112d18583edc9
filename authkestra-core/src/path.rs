//! Paths are dot separated segments. A segment made only of ASCII digits
//! addresses an array element, anything else an object key.

use serde_json::Value;
use std::fmt;

/// One step of a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

impl Segment {
    /// Whether this segment addresses an array element.
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Classify a single path segment.
///
/// Digit-only segments too large for `usize` stay keys.
pub fn classify(segment: &str) -> Segment {
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(index) = segment.parse() {
            return Segment::Index(index);
        }
    }
    Segment::Key(segment.to_string())
}

/// Split a dotted path into classified segments.
pub fn split(path: &str) -> Vec<Segment> {
    path.split('.').map(classify).collect()
}

/// Walk `document` along `path` without modifying it.
///
/// Returns `None` as soon as a segment misses, including when a key is
/// applied to an array or an index to an object.
pub fn resolve<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .map(classify)
        .try_fold(document, |node, segment| match segment {
            Segment::Key(key) => node.as_object()?.get(&key),
            Segment::Index(index) => node.as_array()?.get(index),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digits_are_indices() {
        assert_eq!(classify("0"), Segment::Index(0));
        assert_eq!(classify("12"), Segment::Index(12));
        assert_eq!(classify("value"), Segment::Key("value".into()));
        assert_eq!(classify("1a"), Segment::Key("1a".into()));
        assert_eq!(classify("-1"), Segment::Key("-1".into()));
        assert_eq!(classify(""), Segment::Key(String::new()));
        assert_eq!(
            classify("99999999999999999999999999"),
            Segment::Key("99999999999999999999999999".into())
        );
    }

    #[test]
    fn split_keeps_order() {
        assert_eq!(
            split("emails.0.value"),
            vec![
                Segment::Key("emails".into()),
                Segment::Index(0),
                Segment::Key("value".into())
            ]
        );
    }

    #[test]
    fn resolve_walks_objects_and_arrays() {
        let doc = json!({ "cursus_users": [{ "grade": "Cadet" }], "phone": null });
        assert_eq!(resolve(&doc, "cursus_users.0.grade"), Some(&json!("Cadet")));
        assert_eq!(resolve(&doc, "phone"), Some(&Value::Null));
        assert_eq!(resolve(&doc, "cursus_users.1.grade"), None);
        assert_eq!(resolve(&doc, "missing.deeper"), None);
        assert_eq!(resolve(&doc, "phone.number"), None);
        assert_eq!(resolve(&doc, "cursus_users.grade"), None);
    }
}
