// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Various utilities.

use std::fmt::Display;

use serde_json::{Map, Value};

use crate::{Error, ErrorKind, Result};

/// Query parameters of a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(pub Vec<(String, String)>);

impl Query {
    /// Empty query.
    pub fn new() -> Query {
        Query(Vec::new())
    }

    /// Add an item to the query.
    pub fn push<K, V>(&mut self, param: K, value: V)
    where
        K: Into<String>,
        V: Display,
    {
        self.0.push((param.into(), value.to_string()))
    }

    /// Add a string item to the query.
    pub fn push_str<K, V>(&mut self, param: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push((param.into(), value.into()))
    }

    /// Add an item if the value is present.
    pub fn push_opt<K, V>(&mut self, param: K, value: Option<V>)
    where
        K: Into<String>,
        V: Display,
    {
        if let Some(value) = value {
            self.push(param, value)
        }
    }

    /// Builder-style variant of `push`.
    pub fn with<K, V>(mut self, param: K, value: V) -> Query
    where
        K: Into<String>,
        V: Display,
    {
        self.push(param, value);
        self
    }

    /// Whether the query has no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Get one and only one item from a vector.
pub fn one<T, S1, S2>(collection: Vec<T>, not_found_msg: S1, too_many_msg: S2) -> Result<T>
where
    S1: Into<String>,
    S2: Into<String>,
{
    let mut iter = collection.into_iter();
    match iter.next() {
        Some(result) => {
            if iter.next().is_some() {
                Err(Error::new(ErrorKind::TooManyItems, too_many_msg))
            } else {
                Ok(result)
            }
        }
        None => Err(Error::new(ErrorKind::ResourceNotFound, not_found_msg)),
    }
}

/// Parse `key=value` items into a JSON object.
///
/// Items without `=` map to `null`, which is how keys are passed for unset.
pub fn parse_key_values<I, S>(items: I) -> Map<String, Value>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| match item.as_ref().split_once('=') {
            Some((key, value)) => (key.to_string(), Value::String(value.to_string())),
            None => (item.as_ref().to_string(), Value::Null),
        })
        .collect()
}

/// Whether the string looks like a UUID.
pub fn is_uuid_like(value: &str) -> bool {
    let hex: String = value.chars().filter(|c| *c != '-').collect();
    hex.len() == 32 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Whether the string is a decimal integer.
pub fn is_integer_like(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Convert a string to a boolean the way the API accepts it.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "t" | "true" | "on" | "y" | "yes" => Ok(true),
        "0" | "f" | "false" | "off" | "n" | "no" => Ok(false),
        _ => Err(Error::new(
            ErrorKind::InvalidInput,
            format!("Unrecognized value '{}', acceptable values are: true, false", value),
        )),
    }
}

#[cfg(test)]
pub mod test {
    use serde_json::{json, Value};

    use super::{is_integer_like, is_uuid_like, one, parse_bool, parse_key_values, Query};
    use crate::ErrorKind;

    #[test]
    fn test_query() {
        let mut query = Query::new();
        query.push("limit", 10);
        query.push_str("marker", "abcd");
        query.push_opt::<_, String>("name", None);
        assert_eq!(
            query.iter().collect::<Vec<_>>(),
            vec![("limit", "10"), ("marker", "abcd")]
        );
        assert!(!query.is_empty());
    }

    #[test]
    fn test_one() {
        assert_eq!(one(vec![1], "none", "many").unwrap(), 1);
        assert_eq!(
            one(Vec::<u8>::new(), "none", "many").err().unwrap().kind(),
            ErrorKind::ResourceNotFound
        );
        assert_eq!(
            one(vec![1, 2], "none", "many").err().unwrap().kind(),
            ErrorKind::TooManyItems
        );
    }

    #[test]
    fn test_parse_key_values() {
        let parsed = parse_key_values(vec!["k1=v1", "k2=a=b", "k3"]);
        assert_eq!(
            Value::Object(parsed),
            json!({"k1": "v1", "k2": "a=b", "k3": null})
        );
    }

    #[test]
    fn test_id_like() {
        assert!(is_uuid_like("8d3fa1b2-1cd4-4e3e-9c27-2b1c5a0f9e11"));
        assert!(is_uuid_like("8d3fa1b21cd44e3e9c272b1c5a0f9e11"));
        assert!(!is_uuid_like("my-volume"));
        assert!(is_integer_like("1234"));
        assert!(!is_integer_like("12a"));
        assert!(!is_integer_like(""));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("True").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
