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

//! Backup management via Block Storage API.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::protocol::BackupCreate;
use crate::client::Client;
use crate::common::manager::{self, resource_from};
use crate::common::{ApiVersion, Findable, ListOptions, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::Result;

/// Keys accepted by `--sort` of backup lists.
pub const BACKUP_SORT_KEYS: &[&str] = &[
    "id",
    "status",
    "size",
    "availability_zone",
    "name",
    "created_at",
    "container",
    "volume_id",
];

/// Backup manager.
#[derive(Debug, Clone, Copy)]
pub struct Backups<'c> {
    client: &'c Client,
}

fn backup_path(id: &str) -> String {
    format!("/backups/{}", id)
}

impl<'c> Backups<'c> {
    pub(crate) fn new(client: &'c Client) -> Backups<'c> {
        Backups { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    /// List backups.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        let path = if options.detailed {
            "/backups/detail"
        } else {
            "/backups"
        };
        let query = options.to_query(BACKUP_SORT_KEYS)?;
        manager::list(self.session(), path, "backups", &query, options.limit).await
    }

    /// Get a backup by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        manager::get(self.session(), &backup_path(id), "backup").await
    }

    /// Create a backup of a volume.
    pub async fn create(&self, request: &BackupCreate) -> Result<Resource> {
        if !request.metadata.is_empty() || request.availability_zone.is_some() {
            self.client
                .require(ApiVersion(3, 43), "Backup metadata and availability zone")?;
        }
        let body = json!({ "backup": serde_json::to_value(request)? });
        manager::create(self.session(), "/backups", "backup", body).await
    }

    /// Update backup name or description.
    pub async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<Option<Resource>> {
        self.client.require(ApiVersion(3, 9), "Backup update")?;
        if fields.is_empty() {
            return Ok(None);
        }
        manager::update(
            self.session(),
            &backup_path(id),
            "backup",
            json!({ "backup": fields }),
        )
        .await
    }

    /// Delete a backup, regardless of its state if `force` is set.
    pub async fn delete(&self, id: &str, force: bool) -> Result<()> {
        if force {
            let _ =
                manager::action(self.session(), &backup_path(id), "os-force_delete", Value::Null)
                    .await?;
            Ok(())
        } else {
            manager::delete(self.session(), &backup_path(id), &Query::new()).await
        }
    }

    /// Restore a backup into a new or an existing volume.
    pub async fn restore(
        &self,
        id: &str,
        volume_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Resource> {
        let resp = self
            .session()
            .post(
                &format!("{}/restore", backup_path(id)),
                Some(json!({ "restore": { "volume_id": volume_id, "name": name } })),
            )
            .await?;
        resource_from(&resp, "restore")
    }

    /// Explicitly update the state of a backup in the database.
    pub async fn reset_state(&self, id: &str, state: &str) -> Result<()> {
        let _ = manager::action(
            self.session(),
            &backup_path(id),
            "os-reset_status",
            json!({ "status": state }),
        )
        .await?;
        Ok(())
    }

    /// Export the backup metadata record.
    pub async fn export_record(&self, id: &str) -> Result<Resource> {
        let resp = self
            .session()
            .get(&format!("{}/export_record", backup_path(id)), &Query::new())
            .await?;
        resource_from(&resp, "backup-record")
    }

    /// Import a backup metadata record.
    pub async fn import_record(&self, backup_service: &str, backup_url: &str) -> Result<Resource> {
        let resp = self
            .session()
            .post(
                "/backups/import_record",
                Some(json!({
                    "backup-record": {
                        "backup_service": backup_service,
                        "backup_url": backup_url,
                    }
                })),
            )
            .await?;
        resource_from(&resp, "backup")
    }
}

#[async_trait]
impl<'c> Findable for Backups<'c> {
    fn resource_kind(&self) -> &'static str {
        "backup"
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
