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

//! Building blocks of resource managers.

use std::fmt::Display;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::Method;
use serde_json::{Map, Value};

use super::Resource;
use crate::http::Response;
use crate::session::{HookPoint, Session};
use crate::utils::{self, Query};
use crate::{Error, ErrorKind, Result};

/// Options of a list request.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Use the detailed variant of the list call (the default).
    pub detailed: bool,
    /// Filters to pass as query parameters.
    pub filters: Query,
    /// Marker of the last item of the previous page.
    pub marker: Option<String>,
    /// Maximum number of items to return.
    pub limit: Option<usize>,
    /// Sort specification `key[:dir][,key[:dir]...]`.
    pub sort: Option<String>,
}

impl Default for ListOptions {
    fn default() -> ListOptions {
        ListOptions {
            detailed: true,
            filters: Query::new(),
            marker: None,
            limit: None,
            sort: None,
        }
    }
}

const SORT_DIRS: &[&str] = &["asc", "desc"];

impl ListOptions {
    /// Detailed listing without filters.
    pub fn new() -> ListOptions {
        ListOptions::default()
    }

    /// Request only the summary of each item.
    pub fn summary(mut self) -> ListOptions {
        self.detailed = false;
        self
    }

    /// Add a filter.
    pub fn with_filter<K: Into<String>, V: Display>(mut self, key: K, value: V) -> ListOptions {
        self.filters.push(key, value);
        self
    }

    /// Add a filter if the value is present.
    pub fn with_optional_filter<K: Into<String>, V: Display>(
        mut self,
        key: K,
        value: Option<V>,
    ) -> ListOptions {
        self.filters.push_opt(key, value);
        self
    }

    /// Start after the given marker.
    pub fn with_marker<S: Into<String>>(mut self, marker: S) -> ListOptions {
        self.marker = Some(marker.into());
        self
    }

    /// Limit the number of items.
    pub fn with_limit(mut self, limit: usize) -> ListOptions {
        self.limit = Some(limit);
        self
    }

    /// Sort the results.
    pub fn with_sort<S: Into<String>>(mut self, sort: S) -> ListOptions {
        self.sort = Some(sort.into());
        self
    }

    /// Validate the options and build a query.
    ///
    /// An empty `sort_keys` accepts any key.
    pub fn to_query(&self, sort_keys: &[&str]) -> Result<Query> {
        let mut query = self.filters.clone();
        query.push_opt("marker", self.marker.as_ref());
        query.push_opt("limit", self.limit);
        if let Some(ref sort) = self.sort {
            validate_sort(sort, sort_keys)?;
            query.push_str("sort", sort.clone());
        }
        Ok(query)
    }
}

fn validate_sort(sort: &str, sort_keys: &[&str]) -> Result<()> {
    for item in sort.split(',') {
        let (key, dir) = match item.split_once(':') {
            Some((key, dir)) => (key, Some(dir)),
            None => (item, None),
        };
        if !sort_keys.is_empty() && !sort_keys.contains(&key) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("sort_key must be one of the following: {}.", sort_keys.join(", ")),
            ));
        }
        if let Some(dir) = dir {
            if !SORT_DIRS.contains(&dir) {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("sort_dir must be one of the following: {}.", SORT_DIRS.join(", ")),
                ));
            }
        }
    }
    Ok(())
}

/// Extract a resource stored under `key`.
pub(crate) fn resource_from(resp: &Response, key: &str) -> Result<Resource> {
    let value = resp
        .body
        .as_ref()
        .and_then(|body| body.get(key))
        .cloned()
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidResponse,
                format!("Missing key '{}' in the response", key),
            )
        })?;
    Ok(Resource::from_value(value)?.with_request_id(resp.request_id()))
}

/// Extract the whole response body as a resource.
pub(crate) fn resource_from_body(resp: &Response) -> Result<Resource> {
    match resp.body {
        Some(ref body) => Ok(Resource::from_value(body.clone())?.with_request_id(resp.request_id())),
        None => Ok(Resource::default().with_request_id(resp.request_id())),
    }
}

fn items_from(resp: &Response, key: &str) -> Result<Vec<Resource>> {
    let items = resp
        .body
        .as_ref()
        .and_then(|body| body.get(key))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidResponse,
                format!("Missing list '{}' in the response", key),
            )
        })?;
    items
        .iter()
        .cloned()
        .map(|item| Ok(Resource::from_value(item)?.with_request_id(resp.request_id())))
        .collect()
}

fn next_link(resp: &Response, key: &str) -> Option<String> {
    resp.body
        .as_ref()?
        .get(format!("{}_links", key))?
        .as_array()?
        .iter()
        .find(|link| link.get("rel").and_then(Value::as_str) == Some("next"))
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// Create a resource, returning the item under `key`.
pub(crate) async fn create(
    session: &Session,
    path: &str,
    key: &str,
    mut body: Value,
) -> Result<Resource> {
    session.run_hooks(HookPoint::Create, &mut body);
    trace!("Creating {} at {} with {}", key, path, body);
    let resp = session.post(path, Some(body)).await?;
    let result = resource_from(&resp, key)?;
    debug!("Created {} {:?}", key, result.id());
    Ok(result)
}

/// Get a resource stored under `key`.
pub(crate) async fn get(session: &Session, path: &str, key: &str) -> Result<Resource> {
    trace!("Fetching {} from {}", key, path);
    let resp = session.get(path, &Query::new()).await?;
    resource_from(&resp, key)
}

/// List resources stored under `key`.
///
/// Next links are followed until they end or `limit` items are collected.
pub(crate) async fn list(
    session: &Session,
    path: &str,
    key: &str,
    query: &Query,
    limit: Option<usize>,
) -> Result<Vec<Resource>> {
    trace!("Listing {} at {} with {:?}", key, path, query);
    let mut resp = session.get(path, query).await?;
    let mut result = items_from(&resp, key)?;

    loop {
        if let Some(limit) = limit {
            if result.len() >= limit {
                result.truncate(limit);
                break;
            }
        }

        let next = match next_link(&resp, key) {
            Some(next) => next,
            None => break,
        };
        debug!("Following next link {}", next);
        resp = session.get(&next, &Query::new()).await?;
        let page = items_from(&resp, key)?;
        if page.is_empty() {
            break;
        }
        result.extend(page);
    }

    trace!("Received {} {}", result.len(), key);
    Ok(result)
}

/// Update a resource with PUT.
///
/// Returns the item under `key` if the server sent it.
pub(crate) async fn update(
    session: &Session,
    path: &str,
    key: &str,
    mut body: Value,
) -> Result<Option<Resource>> {
    session.run_hooks(HookPoint::Update, &mut body);
    trace!("Updating {} at {} with {}", key, path, body);
    let resp = session.put(path, Some(body)).await?;
    match resp.body.as_ref().and_then(|body| body.get(key)) {
        Some(_) => Ok(Some(resource_from(&resp, key)?)),
        None => Ok(None),
    }
}

/// Delete a resource.
pub(crate) async fn delete(session: &Session, path: &str, query: &Query) -> Result<()> {
    trace!("Deleting {} with {:?}", path, query);
    let _ = session
        .request(Method::DELETE, path, query, None)
        .await?;
    debug!("Successfully requested deletion of {}", path);
    Ok(())
}

/// Call an action `{"<action>": info}` on `<path>/action`.
pub(crate) async fn action(
    session: &Session,
    path: &str,
    action: &str,
    info: Value,
) -> Result<Response> {
    let mut wrapper = Map::new();
    let _ = wrapper.insert(action.to_string(), info);
    let mut body = Value::Object(wrapper);
    session.run_hooks(HookPoint::Action, &mut body);
    trace!("Running action {} on {}", action, path);
    let resp = session.post(&format!("{}/action", path), Some(body)).await?;
    debug!("Action {} on {} finished with {}", action, path, resp.status);
    Ok(resp)
}

/// A manager that can look up its resources by name or ID.
#[async_trait]
pub trait Findable: Sync {
    /// Human-readable resource kind, e.g. `volume`.
    fn resource_kind(&self) -> &'static str;

    /// Get a resource by its ID.
    async fn get_by_id(&self, id: &str) -> Result<Resource>;

    /// List resources that may carry the name.
    ///
    /// The result may include non-matching items, they are filtered out.
    async fn list_by_name(&self, name: &str) -> Result<Vec<Resource>>;
}

/// Find a resource by its ID or name.
///
/// Integer and UUID-like values are tried as IDs first. Fails with
/// `ResourceNotFound` or `TooManyItems` if the name is not unique.
pub async fn find<F: Findable + ?Sized>(manager: &F, name_or_id: &str) -> Result<Resource> {
    let kind = manager.resource_kind();
    if utils::is_integer_like(name_or_id) || utils::is_uuid_like(name_or_id) {
        match manager.get_by_id(name_or_id).await {
            Ok(value) => return Ok(value),
            Err(err) if err.kind() == ErrorKind::ResourceNotFound => {
                debug!("No {} with ID {}, trying it as a name", kind, name_or_id)
            }
            Err(err) => return Err(err),
        }
    }

    let matching = manager
        .list_by_name(name_or_id)
        .await?
        .into_iter()
        .filter(|item| {
            item.name() == Some(name_or_id) || item.id().as_deref() == Some(name_or_id)
        })
        .collect::<Vec<_>>();
    utils::one(
        matching,
        format!("No {} with a name or ID of '{}' exists.", kind, name_or_id),
        format!(
            "Multiple {} matches found for '{}', use an ID to be more specific.",
            kind, name_or_id
        ),
    )
}

#[cfg(test)]
pub mod test {
    #![allow(unused_results)]

    use async_trait::async_trait;
    use serde_json::json;

    use super::{find, Findable, ListOptions};
    use crate::common::Resource;
    use crate::{Error, ErrorKind, Result};

    struct FakeManager {
        items: Vec<Resource>,
    }

    #[async_trait]
    impl Findable for FakeManager {
        fn resource_kind(&self) -> &'static str {
            "volume"
        }

        async fn get_by_id(&self, id: &str) -> Result<Resource> {
            self.items
                .iter()
                .find(|item| item.id().as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| Error::new(ErrorKind::ResourceNotFound, "not found"))
        }

        async fn list_by_name(&self, _name: &str) -> Result<Vec<Resource>> {
            Ok(self.items.clone())
        }
    }

    fn fake() -> FakeManager {
        FakeManager {
            items: vec![
                Resource::from_value(json!({"id": "1234", "name": "sample-volume"})).unwrap(),
                Resource::from_value(json!({"id": "5678", "name": "dup"})).unwrap(),
                Resource::from_value(json!({"id": "9012", "name": "dup"})).unwrap(),
            ],
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let found = find(&fake(), "1234").await.unwrap();
        assert_eq!(found.name(), Some("sample-volume"));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let found = find(&fake(), "sample-volume").await.unwrap();
        assert_eq!(found.id().as_deref(), Some("1234"));
    }

    #[tokio::test]
    async fn test_find_not_found() {
        let err = find(&fake(), "missing").await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
        assert_eq!(
            err.message(),
            Some("No volume with a name or ID of 'missing' exists.")
        );
    }

    #[tokio::test]
    async fn test_find_ambiguous() {
        let err = find(&fake(), "dup").await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::TooManyItems);
        assert_eq!(
            err.message(),
            Some("Multiple volume matches found for 'dup', use an ID to be more specific.")
        );
    }

    #[test]
    fn test_list_options_query() {
        let query = ListOptions::new()
            .with_filter("all_tenants", 1)
            .with_marker("abcd")
            .with_limit(10)
            .with_sort("name:asc,id")
            .to_query(&["id", "name"])
            .unwrap();
        assert_eq!(
            query.iter().collect::<Vec<_>>(),
            vec![
                ("all_tenants", "1"),
                ("marker", "abcd"),
                ("limit", "10"),
                ("sort", "name:asc,id")
            ]
        );
    }

    #[test]
    fn test_list_options_invalid_sort() {
        let err = ListOptions::new()
            .with_sort("foo")
            .to_query(&["id", "name"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = ListOptions::new()
            .with_sort("id:up")
            .to_query(&["id"])
            .err()
            .unwrap();
        assert_eq!(
            err.message(),
            Some("sort_dir must be one of the following: asc, desc.")
        );
    }
}
