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

//! Volume ownership transfers.

use async_trait::async_trait;
use serde_json::json;

use crate::client::Client;
use crate::common::manager::{self, resource_from};
use crate::common::{ApiVersion, Findable, ListOptions, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::Result;

/// Transfer manager.
#[derive(Debug, Clone, Copy)]
pub struct Transfers<'c> {
    client: &'c Client,
}

impl<'c> Transfers<'c> {
    pub(crate) fn new(client: &'c Client) -> Transfers<'c> {
        Transfers { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    /// Collection path, which changed in API 3.55.
    pub fn base_path(&self) -> &'static str {
        if self.client.supports(ApiVersion(3, 55)) {
            "/volume-transfers"
        } else {
            "/os-volume-transfer"
        }
    }

    fn transfer_path(&self, id: &str) -> String {
        format!("{}/{}", self.base_path(), id)
    }

    /// List transfers.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        let path = if options.detailed {
            format!("{}/detail", self.base_path())
        } else {
            self.base_path().to_string()
        };
        let query = options.to_query(&[])?;
        manager::list(self.session(), &path, "transfers", &query, options.limit).await
    }

    /// Get a transfer by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        manager::get(self.session(), &self.transfer_path(id), "transfer").await
    }

    /// Create a transfer of a volume.
    ///
    /// The result carries the `auth_key` needed to accept it.
    pub async fn create(
        &self,
        volume_id: &str,
        name: Option<&str>,
        no_snapshots: bool,
    ) -> Result<Resource> {
        let mut transfer = json!({ "volume_id": volume_id, "name": name });
        if self.client.supports(ApiVersion(3, 55)) {
            transfer["no_snapshots"] = json!(no_snapshots);
        }
        manager::create(
            self.session(),
            self.base_path(),
            "transfer",
            json!({ "transfer": transfer }),
        )
        .await
    }

    /// Accept a transfer.
    pub async fn accept(&self, id: &str, auth_key: &str) -> Result<Resource> {
        let resp = self
            .session()
            .post(
                &format!("{}/accept", self.transfer_path(id)),
                Some(json!({ "accept": { "auth_key": auth_key } })),
            )
            .await?;
        resource_from(&resp, "transfer")
    }

    /// Delete (cancel) a transfer.
    pub async fn delete(&self, id: &str) -> Result<()> {
        manager::delete(self.session(), &self.transfer_path(id), &Query::new()).await
    }
}

#[async_trait]
impl<'c> Findable for Transfers<'c> {
    fn resource_kind(&self) -> &'static str {
        "transfer"
    }

    async fn get_by_id(&self, id: &str) -> Result<Resource> {
        self.get(id).await
    }

    async fn list_by_name(&self, name: &str) -> Result<Vec<Resource>> {
        self.list(&ListOptions::new().with_filter("name", name)).await
    }
}
