//! Query parameters for data calls.
//!
//! Lists become repeated keys in insertion order, scalars single keys,
//! and absent values disappear from the query string entirely.

use url::Url;

/// One query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// A single `key=value` pair.
    Single(String),
    /// Repeated `key=value` pairs, one per element.
    Many(Vec<String>),
    /// Omitted from the query string.
    Absent,
}

macro_rules! scalar_param {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Param {
                fn from(value: $t) -> Self {
                    Param::Single(value.to_string())
                }
            }
        )*
    };
}

scalar_param!(&str, String, i32, i64, u32, u64, f64, bool);

impl<T: ToString> From<Vec<T>> for Param {
    fn from(values: Vec<T>) -> Self {
        Param::Many(values.into_iter().map(|v| v.to_string()).collect())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Param::Absent,
        }
    }
}

/// Ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    entries: Vec<(String, Param)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, keeping insertion order. Setting the same key
    /// twice repeats it in the query string.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Whether the query would serialize to nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, param)| match param {
            Param::Single(_) => false,
            Param::Many(values) => values.is_empty(),
            Param::Absent => true,
        })
    }

    /// Append the pairs onto a URL.
    pub(crate) fn apply(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }

        let mut pairs = url.query_pairs_mut();
        for (key, param) in &self.entries {
            match param {
                Param::Single(value) => {
                    pairs.append_pair(key, value);
                }
                Param::Many(values) => {
                    for value in values {
                        pairs.append_pair(key, value);
                    }
                }
                Param::Absent => {}
            }
        }
    }
}
