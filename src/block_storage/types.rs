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

//! Volume types and default types.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::client::Client;
use crate::common::manager::{self, resource_from};
use crate::common::{ApiVersion, Findable, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::Result;

/// Volume type manager.
#[derive(Debug, Clone, Copy)]
pub struct VolumeTypes<'c> {
    client: &'c Client,
}

/// Default volume type manager (API 3.62).
#[derive(Debug, Clone, Copy)]
pub struct DefaultTypes<'c> {
    client: &'c Client,
}

fn type_path(id: &str) -> String {
    format!("/types/{}", id)
}

impl<'c> VolumeTypes<'c> {
    pub(crate) fn new(client: &'c Client) -> VolumeTypes<'c> {
        VolumeTypes { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    /// List volume types, private ones as well if `is_public` is `None`.
    pub async fn list(&self, is_public: Option<bool>) -> Result<Vec<Resource>> {
        let mut query = Query::new();
        match is_public {
            Some(value) => query.push("is_public", value),
            None => query.push_str("is_public", "None"),
        }
        manager::list(self.session(), "/types", "volume_types", &query, None).await
    }

    /// Get a volume type by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        manager::get(self.session(), &type_path(id), "volume_type").await
    }

    /// Get the default volume type.
    pub async fn default(&self) -> Result<Resource> {
        manager::get(self.session(), "/types/default", "volume_type").await
    }

    /// Create a volume type.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        is_public: bool,
    ) -> Result<Resource> {
        let body = json!({
            "volume_type": {
                "name": name,
                "description": description,
                "os-volume-type-access:is_public": is_public,
            }
        });
        manager::create(self.session(), "/types", "volume_type", body).await
    }

    /// Update name, description or visibility of a volume type.
    pub async fn update(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
        is_public: Option<bool>,
    ) -> Result<Option<Resource>> {
        let mut fields = Map::new();
        if let Some(name) = name {
            let _ = fields.insert(String::from("name"), json!(name));
        }
        if let Some(description) = description {
            let _ = fields.insert(String::from("description"), json!(description));
        }
        if let Some(is_public) = is_public {
            let _ = fields.insert(String::from("is_public"), json!(is_public));
        }
        manager::update(
            self.session(),
            &type_path(id),
            "volume_type",
            json!({ "volume_type": fields }),
        )
        .await
    }

    /// Delete a volume type.
    pub async fn delete(&self, id: &str) -> Result<()> {
        manager::delete(self.session(), &type_path(id), &Query::new()).await
    }

    /// Get the extra specs of a volume type.
    pub async fn get_keys(&self, id: &str) -> Result<Map<String, Value>> {
        let resp = self
            .session()
            .get(&format!("{}/extra_specs", type_path(id)), &Query::new())
            .await?;
        Ok(resource_from(&resp, "extra_specs")?.into_info())
    }

    /// Set or update extra specs.
    pub async fn set_keys(
        &self,
        id: &str,
        specs: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let resp = self
            .session()
            .post(
                &format!("{}/extra_specs", type_path(id)),
                Some(json!({ "extra_specs": specs })),
            )
            .await?;
        Ok(resource_from(&resp, "extra_specs")?.into_info())
    }

    /// Remove extra specs by their keys.
    pub async fn unset_keys<S: AsRef<str>>(&self, id: &str, keys: &[S]) -> Result<()> {
        for key in keys {
            manager::delete(
                self.session(),
                &format!("{}/extra_specs/{}", type_path(id), key.as_ref()),
                &Query::new(),
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<'c> Findable for VolumeTypes<'c> {
    fn resource_kind(&self) -> &'static str {
        "volume_type"
    }

    async fn get_by_id(&self, id: &str) -> Result<Resource> {
        self.get(id).await
    }

    async fn list_by_name(&self, _name: &str) -> Result<Vec<Resource>> {
        self.list(None).await
    }
}

impl<'c> DefaultTypes<'c> {
    pub(crate) fn new(client: &'c Client) -> DefaultTypes<'c> {
        DefaultTypes { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    fn check(&self) -> Result<()> {
        self.client.require(ApiVersion(3, 62), "Default volume types")
    }

    /// List default types of all projects.
    pub async fn list(&self) -> Result<Vec<Resource>> {
        self.check()?;
        manager::list(self.session(), "/default-types", "default_types", &Query::new(), None).await
    }

    /// Get the default type of a project.
    pub async fn get(&self, project_id: &str) -> Result<Resource> {
        self.check()?;
        manager::get(
            self.session(),
            &format!("/default-types/{}", project_id),
            "default_type",
        )
        .await
    }

    /// Set the default type of a project.
    pub async fn set(&self, project_id: &str, volume_type: &str) -> Result<Resource> {
        self.check()?;
        let resp = self
            .session()
            .put(
                &format!("/default-types/{}", project_id),
                Some(json!({ "default_type": { "volume_type": volume_type } })),
            )
            .await?;
        resource_from(&resp, "default_type")
    }

    /// Remove the default type of a project.
    pub async fn unset(&self, project_id: &str) -> Result<()> {
        self.check()?;
        manager::delete(
            self.session(),
            &format!("/default-types/{}", project_id),
            &Query::new(),
        )
        .await
    }
}
