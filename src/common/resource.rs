// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Generic resource record.

use std::fmt;

use serde_json::{Map, Value};

use crate::{Error, ErrorKind, Result};

/// A resource returned by the server.
///
/// The record keeps the JSON object as is. `loaded` is false for stubs
/// that only carry an ID.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    info: Map<String, Value>,
    loaded: bool,
    request_ids: Vec<String>,
}

impl Resource {
    /// Create a fully loaded resource.
    pub fn new(info: Map<String, Value>) -> Resource {
        Resource {
            info,
            loaded: true,
            request_ids: Vec::new(),
        }
    }

    /// Create a resource from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Resource> {
        match value {
            Value::Object(info) => Ok(Resource::new(info)),
            other => Err(Error::new(
                ErrorKind::InvalidResponse,
                format!("Expected a JSON object, got {}", other),
            )),
        }
    }

    /// Create a stub with an ID only.
    pub fn stub<S: Into<String>>(id: S) -> Resource {
        let mut info = Map::new();
        let _ = info.insert(String::from("id"), Value::String(id.into()));
        Resource {
            info,
            loaded: false,
            request_ids: Vec::new(),
        }
    }

    /// Resource ID (strings and numbers are accepted).
    pub fn id(&self) -> Option<String> {
        match self.info.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Resource name (`name` or `display_name`).
    pub fn name(&self) -> Option<&str> {
        self.get_str("name").or_else(|| self.get_str("display_name"))
    }

    /// Get a field.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.info.get(key)
    }

    /// Get a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.info.get(key).and_then(Value::as_str)
    }

    /// Set a field.
    pub fn set<K: Into<String>>(&mut self, key: K, value: Value) {
        let _ = self.info.insert(key.into(), value);
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.info.remove(key)
    }

    /// Copy fields under new names unless the new name is already present.
    pub fn translate_keys(&mut self, pairs: &[(&str, &str)]) {
        for (from, to) in pairs {
            if self.info.contains_key(*to) {
                continue;
            }
            if let Some(value) = self.info.get(*from).cloned() {
                let _ = self.info.insert(String::from(*to), value);
            }
        }
    }

    /// All fields.
    #[inline]
    pub fn info(&self) -> &Map<String, Value> {
        &self.info
    }

    /// Convert into the underlying fields.
    #[inline]
    pub fn into_info(self) -> Map<String, Value> {
        self.info
    }

    /// Whether the resource is fully populated.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Request IDs of the calls that produced this resource.
    #[inline]
    pub fn request_ids(&self) -> &[String] {
        &self.request_ids
    }

    pub(crate) fn with_request_id(mut self, request_id: Option<&str>) -> Resource {
        if let Some(value) = request_id {
            self.request_ids.push(value.to_string());
        }
        self
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "<Resource: {}>", id),
            None => write!(f, "<Resource>"),
        }
    }
}

#[cfg(test)]
pub mod test {
    use serde_json::json;

    use super::Resource;

    #[test]
    fn test_from_value() {
        let res = Resource::from_value(json!({"id": 1234, "display_name": "vol"})).unwrap();
        assert_eq!(res.id().as_deref(), Some("1234"));
        assert_eq!(res.name(), Some("vol"));
        assert!(res.is_loaded());
        assert!(Resource::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_stub() {
        let res = Resource::stub("abcd");
        assert_eq!(res.id().as_deref(), Some("abcd"));
        assert!(!res.is_loaded());
        assert_eq!(res.to_string(), "<Resource: abcd>");
    }

    #[test]
    fn test_translate_keys() {
        let mut res = Resource::from_value(json!({
            "os-vol-tenant-attr:tenant_id": "t1",
            "volume_type": "lvm",
            "volumeType": "other"
        }))
        .unwrap();
        res.translate_keys(&[
            ("os-vol-tenant-attr:tenant_id", "tenant_id"),
            ("volumeType", "volume_type"),
        ]);
        assert_eq!(res.get_str("tenant_id"), Some("t1"));
        assert_eq!(res.get_str("volume_type"), Some("lvm"));
    }

    #[test]
    fn test_request_ids() {
        let res = Resource::stub("a").with_request_id(Some("req-1")).with_request_id(None);
        assert_eq!(res.request_ids(), &[String::from("req-1")]);
    }
}
