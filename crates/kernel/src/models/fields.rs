//! Input field shapes shared by the blog and site request bodies.

use serde::{Deserialize, Deserializer};

/// A list field that clients may send either as a comma-separated string or
/// as a JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    pub fn into_list(self) -> Vec<String> {
        to_string_list(self)
    }
}

impl From<&str> for StringOrList {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<String>> for StringOrList {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

/// Normalize a string-or-list value into an ordered list of trimmed, non-empty
/// strings.
///
/// `"a, b ,c"` and `["a", " b", "c"]` both yield `["a", "b", "c"]`.
pub fn to_string_list(value: StringOrList) -> Vec<String> {
    let entries: Vec<String> = match value {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::Many(v) => v,
    };

    entries
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Deserialize a field whose presence matters even when its value is `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(value))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Treat blank strings as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
