use std::fmt;
use std::sync::Arc;

use serde_json::Value;

type AccessorFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// How to drill into a resolved value.
///
/// Every lookup that misses (absent key, out-of-range index, indexing into a
/// scalar, or starting from `null`) yields `Value::Null` rather than an error.
#[derive(Clone)]
pub enum ValuePath {
    /// Index once. Objects are indexed by key, arrays by the key parsed as a
    /// position.
    Key(String),
    /// Split on `.` and index once per segment.
    Dotted(String),
    /// Index once per element.
    Segments(Vec<String>),
    /// A named accessor applied to the value.
    Accessor { name: String, accessor: AccessorFn },
}

impl ValuePath {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn dotted(path: impl Into<String>) -> Self {
        Self::Dotted(path.into())
    }

    pub fn segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Segments(segments.into_iter().map(Into::into).collect())
    }

    pub fn accessor<F>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Accessor {
            name: name.into(),
            accessor: Arc::new(accessor),
        }
    }

    /// Extract the value this path points at.
    #[must_use]
    pub fn extract(&self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        let found = match self {
            Self::Key(key) => index(value, key).cloned(),
            Self::Dotted(path) => dig(value, path.split('.')),
            Self::Segments(segments) => dig(value, segments.iter().map(String::as_str)),
            Self::Accessor { accessor, .. } => accessor(value),
        };
        found.unwrap_or(Value::Null)
    }
}

fn index<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn dig<'s>(value: &Value, segments: impl Iterator<Item = &'s str>) -> Option<Value> {
    let mut current = value;
    for segment in segments {
        current = index(current, segment)?;
    }
    Some(current.clone())
}

impl fmt::Debug for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Self::Dotted(path) => f.debug_tuple("Dotted").field(path).finish(),
            Self::Segments(segments) => f.debug_tuple("Segments").field(segments).finish(),
            Self::Accessor { name, .. } => f.debug_tuple("Accessor").field(name).finish(),
        }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Dotted(path) => f.write_str(path),
            Self::Segments(segments) => f.write_str(&segments.join(".")),
            Self::Accessor { name, .. } => write!(f, "{name}()"),
        }
    }
}

impl From<&str> for ValuePath {
    fn from(path: &str) -> Self {
        Self::dotted(path)
    }
}

impl From<String> for ValuePath {
    fn from(path: String) -> Self {
        Self::Dotted(path)
    }
}

impl From<usize> for ValuePath {
    fn from(position: usize) -> Self {
        Self::Key(position.to_string())
    }
}

impl<S: Into<String>> From<Vec<S>> for ValuePath {
    fn from(segments: Vec<S>) -> Self {
        Self::segments(segments)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user() -> Value {
        json!({
            "name": "ada",
            "address": {"city": "london", "lines": ["1 road", "flat 2"]},
            "a.b": "literal dotted key"
        })
    }

    #[test]
    fn key_indexes_once() {
        assert_eq!(ValuePath::key("name").extract(&user()), json!("ada"));
        assert_eq!(
            ValuePath::key("a.b").extract(&user()),
            json!("literal dotted key")
        );
    }

    #[test]
    fn dotted_path_indexes_each_segment() {
        assert_eq!(
            ValuePath::from("address.city").extract(&user()),
            json!("london")
        );
        assert_eq!(
            ValuePath::from("address.lines.1").extract(&user()),
            json!("flat 2")
        );
    }

    #[test]
    fn segments_index_once_per_element() {
        let path = ValuePath::from(vec!["address", "lines", "0"]);
        assert_eq!(path.extract(&user()), json!("1 road"));
    }

    #[test]
    fn accessor_is_applied_to_the_value() {
        let count = ValuePath::accessor("len", |value| {
            value.as_object().map(|map| json!(map.len()))
        });
        assert_eq!(count.extract(&user()), json!(3));
        assert_eq!(count.to_string(), "len()");
    }

    #[test]
    fn misses_yield_null() {
        assert_eq!(ValuePath::from("address.zip").extract(&user()), Value::Null);
        assert_eq!(ValuePath::from("name.first").extract(&user()), Value::Null);
        assert_eq!(ValuePath::from(9_usize).extract(&json!([1, 2])), Value::Null);
    }

    #[test]
    fn null_short_circuits() {
        let path = ValuePath::accessor("never", |_| panic!("accessor must not run on null"));
        assert_eq!(path.extract(&Value::Null), Value::Null);
        assert_eq!(ValuePath::from("a.b.c").extract(&Value::Null), Value::Null);
    }
}
