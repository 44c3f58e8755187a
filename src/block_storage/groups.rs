// Copyright 2024 Sandro-Alessio Gierens <sandro@gierens.de>
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

//! Generic volume groups and their snapshots.

use async_trait::async_trait;
use serde_json::json;

use super::protocol::{GroupCreate, GroupFromSource, GroupUpdate};
use crate::client::Client;
use crate::common::manager::{self, resource_from};
use crate::common::{ApiVersion, Findable, ListOptions, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::{Error, ErrorKind, Result};

/// Group manager (API 3.13).
#[derive(Debug, Clone, Copy)]
pub struct Groups<'c> {
    client: &'c Client,
}

/// Group snapshot manager (API 3.14).
#[derive(Debug, Clone, Copy)]
pub struct GroupSnapshots<'c> {
    client: &'c Client,
}

fn group_path(id: &str) -> String {
    format!("/groups/{}", id)
}

fn group_snapshot_path(id: &str) -> String {
    format!("/group_snapshots/{}", id)
}

impl<'c> Groups<'c> {
    pub(crate) fn new(client: &'c Client) -> Groups<'c> {
        Groups { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    fn check(&self) -> Result<()> {
        self.client.require(ApiVersion(3, 13), "Groups")
    }

    /// List groups.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        self.check()?;
        let path = if options.detailed {
            "/groups/detail"
        } else {
            "/groups"
        };
        let query = options.to_query(&[])?;
        manager::list(self.session(), path, "groups", &query, options.limit).await
    }

    /// Get a group by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        self.check()?;
        manager::get(self.session(), &group_path(id), "group").await
    }

    /// Create a group.
    pub async fn create(&self, request: &GroupCreate) -> Result<Resource> {
        self.check()?;
        let body = json!({ "group": serde_json::to_value(request)? });
        manager::create(self.session(), "/groups", "group", body).await
    }

    /// Create a group from a group snapshot or a source group (API 3.14).
    pub async fn create_from_src(&self, request: &GroupFromSource) -> Result<Resource> {
        self.client
            .require(ApiVersion(3, 14), "Creating a group from a source")?;
        if request.group_snapshot_id.is_none() == request.source_group_id.is_none() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Exactly one of group snapshot or source group must be provided",
            ));
        }
        let resp = manager::action(
            self.session(),
            "/groups",
            "create-from-src",
            serde_json::to_value(request)?,
        )
        .await?;
        resource_from(&resp, "group")
    }

    /// Update a group.
    pub async fn update(&self, id: &str, request: &GroupUpdate) -> Result<()> {
        self.check()?;
        if request.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "At least one of name, description, add_volumes or remove_volumes must be set",
            ));
        }
        let _ = manager::update(
            self.session(),
            &group_path(id),
            "group",
            json!({ "group": serde_json::to_value(request)? }),
        )
        .await?;
        Ok(())
    }

    /// Delete a group, with its volumes if `delete_volumes` is set.
    pub async fn delete(&self, id: &str, delete_volumes: bool) -> Result<()> {
        self.check()?;
        let _ = manager::action(
            self.session(),
            &group_path(id),
            "delete",
            json!({ "delete-volumes": delete_volumes }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl<'c> Findable for Groups<'c> {
    fn resource_kind(&self) -> &'static str {
        "group"
    }

    async fn get_by_id(&self, id: &str) -> Result<Resource> {
        self.get(id).await
    }

    async fn list_by_name(&self, name: &str) -> Result<Vec<Resource>> {
        self.list(&ListOptions::new().with_filter("name", name))
            .await
    }
}

impl<'c> GroupSnapshots<'c> {
    pub(crate) fn new(client: &'c Client) -> GroupSnapshots<'c> {
        GroupSnapshots { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    fn check(&self) -> Result<()> {
        self.client.require(ApiVersion(3, 14), "Group snapshots")
    }

    /// List group snapshots.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        self.check()?;
        let path = if options.detailed {
            "/group_snapshots/detail"
        } else {
            "/group_snapshots"
        };
        let query = options.to_query(&[])?;
        manager::list(self.session(), path, "group_snapshots", &query, options.limit).await
    }

    /// Get a group snapshot by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        self.check()?;
        manager::get(self.session(), &group_snapshot_path(id), "group_snapshot").await
    }

    /// Create a snapshot of a group.
    pub async fn create(
        &self,
        group_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Resource> {
        self.check()?;
        let body = json!({
            "group_snapshot": {
                "group_id": group_id,
                "name": name,
                "description": description,
            }
        });
        manager::create(self.session(), "/group_snapshots", "group_snapshot", body).await
    }

    /// Delete a group snapshot.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.check()?;
        manager::delete(self.session(), &group_snapshot_path(id), &Query::new()).await
    }
}

#[async_trait]
impl<'c> Findable for GroupSnapshots<'c> {
    fn resource_kind(&self) -> &'static str {
        "group_snapshot"
    }

    async fn get_by_id(&self, id: &str) -> Result<Resource> {
        self.get(id).await
    }

    async fn list_by_name(&self, name: &str) -> Result<Vec<Resource>> {
        self.list(&ListOptions::new().with_filter("name", name))
            .await
    }
}
