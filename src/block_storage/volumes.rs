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

//! Volume management via Block Storage API.

use async_trait::async_trait;
use log::debug;
use serde_json::{json, Map, Value};

use super::protocol::{ImageUpload, VolumeCreate, VolumeMigrate};
use crate::client::Client;
use crate::common::manager::{self, resource_from};
use crate::common::{ApiVersion, Findable, ListOptions, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::{Error, ErrorKind, Result};

/// Keys accepted by `--sort` of volume and snapshot lists.
pub const VOLUME_SORT_KEYS: &[&str] = &[
    "id",
    "status",
    "size",
    "availability_zone",
    "name",
    "bootable",
    "created_at",
    "reference",
];

/// Volume manager.
#[derive(Debug, Clone, Copy)]
pub struct Volumes<'c> {
    client: &'c Client,
}

fn volume_path(id: &str) -> String {
    format!("/volumes/{}", id)
}

impl<'c> Volumes<'c> {
    pub(crate) fn new(client: &'c Client) -> Volumes<'c> {
        Volumes { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    async fn action(&self, id: &str, action: &str, info: Value) -> Result<()> {
        let _ = manager::action(self.session(), &volume_path(id), action, info).await?;
        Ok(())
    }

    /// List volumes.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        let path = if options.detailed {
            "/volumes/detail"
        } else {
            "/volumes"
        };
        let query = options.to_query(VOLUME_SORT_KEYS)?;
        manager::list(self.session(), path, "volumes", &query, options.limit).await
    }

    /// Get a volume by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        manager::get(self.session(), &volume_path(id), "volume").await
    }

    /// Create a volume.
    ///
    /// `group_id` is only sent starting with API version 3.13.
    pub async fn create(&self, request: &VolumeCreate) -> Result<Resource> {
        let body = request.to_body(self.client.api(), self.client.supports(ApiVersion(3, 13)));
        manager::create(self.session(), "/volumes", "volume", body).await
    }

    /// Update volume fields, e.g. the name.
    pub async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<Option<Resource>> {
        if fields.is_empty() {
            return Ok(None);
        }
        manager::update(
            self.session(),
            &volume_path(id),
            "volume",
            json!({ "volume": fields }),
        )
        .await
    }

    /// Delete a volume, with its snapshots if `cascade` is set.
    pub async fn delete(&self, id: &str, cascade: bool) -> Result<()> {
        let mut query = Query::new();
        if cascade {
            if !self.client.api().supports_cascade() {
                return Err(Error::new(
                    ErrorKind::UnsupportedVersion,
                    "Cascade deletion requires API version 2 or later",
                ));
            }
            query.push_str("cascade", "True");
        }
        manager::delete(self.session(), &volume_path(id), &query).await
    }

    /// Delete a volume regardless of its state.
    pub async fn force_delete(&self, id: &str) -> Result<()> {
        self.action(id, "os-force_delete", Value::Null).await
    }

    /// Mark a volume as attached to an instance or a host.
    pub async fn attach(
        &self,
        id: &str,
        instance_uuid: Option<&str>,
        host_name: Option<&str>,
        mountpoint: &str,
        mode: &str,
    ) -> Result<()> {
        let mut info = json!({ "mountpoint": mountpoint, "mode": mode });
        if let Some(instance_uuid) = instance_uuid {
            info["instance_uuid"] = json!(instance_uuid);
        }
        if let Some(host_name) = host_name {
            info["host_name"] = json!(host_name);
        }
        self.action(id, "os-attach", info).await
    }

    /// Clear the attachment of a volume.
    pub async fn detach(&self, id: &str, attachment_id: Option<&str>) -> Result<()> {
        self.action(id, "os-detach", json!({ "attachment_id": attachment_id }))
            .await
    }

    /// Reserve a volume for attaching.
    pub async fn reserve(&self, id: &str) -> Result<()> {
        self.action(id, "os-reserve", Value::Null).await
    }

    /// Cancel a reservation.
    pub async fn unreserve(&self, id: &str) -> Result<()> {
        self.action(id, "os-unreserve", Value::Null).await
    }

    /// Mark a volume as detaching.
    pub async fn begin_detaching(&self, id: &str) -> Result<()> {
        self.action(id, "os-begin_detaching", Value::Null).await
    }

    /// Roll a detaching volume back to in-use.
    pub async fn roll_detaching(&self, id: &str) -> Result<()> {
        self.action(id, "os-roll_detaching", Value::Null).await
    }

    /// Extend a volume to the new size in GiB.
    pub async fn extend(&self, id: &str, new_size: u64) -> Result<()> {
        self.action(id, "os-extend", json!({ "new_size": new_size }))
            .await
    }

    /// Explicitly update the state of a volume in the database.
    pub async fn reset_state(
        &self,
        id: &str,
        state: Option<&str>,
        attach_status: Option<&str>,
        migration_status: Option<&str>,
    ) -> Result<()> {
        let mut info = Map::new();
        if let Some(state) = state {
            let _ = info.insert(String::from("status"), json!(state));
        }
        if let Some(attach_status) = attach_status {
            let _ = info.insert(String::from("attach_status"), json!(attach_status));
        }
        if let Some(migration_status) = migration_status {
            let _ = info.insert(String::from("migration_status"), json!(migration_status));
        }
        self.action(id, "os-reset_status", Value::Object(info)).await
    }

    /// Change the type of a volume.
    pub async fn retype(&self, id: &str, volume_type: &str, migration_policy: &str) -> Result<()> {
        self.action(
            id,
            "os-retype",
            json!({ "new_type": volume_type, "migration_policy": migration_policy }),
        )
        .await
    }

    /// Update the bootable flag.
    pub async fn set_bootable(&self, id: &str, bootable: bool) -> Result<()> {
        self.action(id, "os-set_bootable", json!({ "bootable": bootable }))
            .await
    }

    /// Update the read-only access mode flag.
    pub async fn update_readonly_flag(&self, id: &str, readonly: bool) -> Result<()> {
        self.action(id, "os-update_readonly_flag", json!({ "readonly": readonly }))
            .await
    }

    /// Upload a volume to the image service.
    pub async fn upload_to_image(&self, id: &str, request: &ImageUpload) -> Result<Resource> {
        if request.visibility.is_some() || request.protected.is_some() {
            self.client
                .require(ApiVersion(3, 1), "Image visibility and protection")?;
        }
        let resp = manager::action(
            self.session(),
            &volume_path(id),
            "os-volume_upload_image",
            serde_json::to_value(request)?,
        )
        .await?;
        resource_from(&resp, "os-volume_upload_image")
    }

    /// Migrate a volume to a new host.
    pub async fn migrate(&self, id: &str, request: &VolumeMigrate) -> Result<()> {
        self.action(id, "os-migrate_volume", serde_json::to_value(request)?)
            .await
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
                &format!("{}/metadata", volume_path(id)),
                Some(json!({ "metadata": metadata })),
            )
            .await?;
        Ok(resource_from(&resp, "metadata")?.into_info())
    }

    /// Delete metadata items by their keys.
    pub async fn delete_metadata<S: AsRef<str>>(&self, id: &str, keys: &[S]) -> Result<()> {
        for key in keys {
            debug!("Deleting metadata key {} of volume {}", key.as_ref(), id);
            manager::delete(
                self.session(),
                &format!("{}/metadata/{}", volume_path(id), key.as_ref()),
                &Query::new(),
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<'c> Findable for Volumes<'c> {
    fn resource_kind(&self) -> &'static str {
        "volume"
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
