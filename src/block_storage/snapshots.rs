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

//! Snapshot management via Block Storage API.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::protocol::SnapshotCreate;
use super::volumes::VOLUME_SORT_KEYS;
use crate::client::Client;
use crate::common::manager::{self, resource_from};
use crate::common::{Findable, ListOptions, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::Result;

/// Snapshot manager.
#[derive(Debug, Clone, Copy)]
pub struct Snapshots<'c> {
    client: &'c Client,
}

fn snapshot_path(id: &str) -> String {
    format!("/snapshots/{}", id)
}

impl<'c> Snapshots<'c> {
    pub(crate) fn new(client: &'c Client) -> Snapshots<'c> {
        Snapshots { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    /// List snapshots.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        let path = if options.detailed {
            "/snapshots/detail"
        } else {
            "/snapshots"
        };
        let query = options.to_query(VOLUME_SORT_KEYS)?;
        manager::list(self.session(), path, "snapshots", &query, options.limit).await
    }

    /// Get a snapshot by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        manager::get(self.session(), &snapshot_path(id), "snapshot").await
    }

    /// Create a snapshot of a volume.
    pub async fn create(&self, request: &SnapshotCreate) -> Result<Resource> {
        let body = request.to_body(self.client.api());
        manager::create(self.session(), "/snapshots", "snapshot", body).await
    }

    /// Update snapshot fields.
    pub async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<Option<Resource>> {
        if fields.is_empty() {
            return Ok(None);
        }
        manager::update(
            self.session(),
            &snapshot_path(id),
            "snapshot",
            json!({ "snapshot": fields }),
        )
        .await
    }

    /// Delete a snapshot.
    pub async fn delete(&self, id: &str) -> Result<()> {
        manager::delete(self.session(), &snapshot_path(id), &Query::new()).await
    }

    /// Explicitly update the state of a snapshot in the database.
    pub async fn reset_state(&self, id: &str, state: &str) -> Result<()> {
        let _ = manager::action(
            self.session(),
            &snapshot_path(id),
            "os-reset_status",
            json!({ "status": state }),
        )
        .await?;
        Ok(())
    }

    /// Set or update metadata items.
    pub async fn set_metadata(
        &self,
        id: &str,
        metadata: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let resp = self
            .session()
            .post(
                &format!("{}/metadata", snapshot_path(id)),
                Some(json!({ "metadata": metadata })),
            )
            .await?;
        Ok(resource_from(&resp, "metadata")?.into_info())
    }

    /// Delete metadata items by their keys.
    pub async fn delete_metadata<S: AsRef<str>>(&self, id: &str, keys: &[S]) -> Result<()> {
        for key in keys {
            manager::delete(
                self.session(),
                &format!("{}/metadata/{}", snapshot_path(id), key.as_ref()),
                &Query::new(),
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<'c> Findable for Snapshots<'c> {
    fn resource_kind(&self) -> &'static str {
        "snapshot"
    }

    async fn get_by_id(&self, id: &str) -> Result<Resource> {
        self.get(id).await
    }

    async fn list_by_name(&self, name: &str) -> Result<Vec<Resource>> {
        let options = ListOptions::new()
            .with_filter(self.client.api().name_key(), name)
            .with_filter("all_tenants", 1);
        self.list(&options).await
    }
}
