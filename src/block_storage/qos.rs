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

//! Quality of service specifications.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::client::Client;
use crate::common::manager;
use crate::common::{Findable, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::Result;

/// QoS specs manager.
#[derive(Debug, Clone, Copy)]
pub struct QosSpecs<'c> {
    client: &'c Client,
}

fn qos_path(id: &str) -> String {
    format!("/qos-specs/{}", id)
}

impl<'c> QosSpecs<'c> {
    pub(crate) fn new(client: &'c Client) -> QosSpecs<'c> {
        QosSpecs { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    /// List QoS specs.
    pub async fn list(&self) -> Result<Vec<Resource>> {
        manager::list(self.session(), "/qos-specs", "qos_specs", &Query::new(), None).await
    }

    /// Get QoS specs by ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        manager::get(self.session(), &qos_path(id), "qos_specs").await
    }

    /// Create QoS specs.
    pub async fn create(&self, name: &str, specs: Map<String, Value>) -> Result<Resource> {
        let mut body = specs;
        let _ = body.insert(String::from("name"), json!(name));
        manager::create(
            self.session(),
            "/qos-specs",
            "qos_specs",
            json!({ "qos_specs": body }),
        )
        .await
    }

    /// Delete QoS specs, even if associated when `force` is set.
    pub async fn delete(&self, id: &str, force: bool) -> Result<()> {
        let query = Query::new().with("force", if force { "True" } else { "False" });
        manager::delete(self.session(), &qos_path(id), &query).await
    }

    /// Add or update keys.
    pub async fn set_keys(&self, id: &str, specs: Map<String, Value>) -> Result<()> {
        let _ = manager::update(
            self.session(),
            &qos_path(id),
            "qos_specs",
            json!({ "qos_specs": specs }),
        )
        .await?;
        Ok(())
    }

    /// Remove keys.
    pub async fn unset_keys<S: AsRef<str>>(&self, id: &str, keys: &[S]) -> Result<()> {
        let keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        let _ = self
            .session()
            .put(
                &format!("{}/delete_keys", qos_path(id)),
                Some(json!({ "keys": keys })),
            )
            .await?;
        Ok(())
    }

    /// Associate the QoS specs with a volume type.
    pub async fn associate(&self, id: &str, volume_type_id: &str) -> Result<()> {
        let query = Query::new().with("vol_type_id", volume_type_id);
        let _ = self
            .session()
            .get(&format!("{}/associate", qos_path(id)), &query)
            .await?;
        Ok(())
    }

    /// Remove the association with a volume type.
    pub async fn disassociate(&self, id: &str, volume_type_id: &str) -> Result<()> {
        let query = Query::new().with("vol_type_id", volume_type_id);
        let _ = self
            .session()
            .get(&format!("{}/disassociate", qos_path(id)), &query)
            .await?;
        Ok(())
    }

    /// Remove all associations.
    pub async fn disassociate_all(&self, id: &str) -> Result<()> {
        let _ = self
            .session()
            .get(&format!("{}/disassociate_all", qos_path(id)), &Query::new())
            .await?;
        Ok(())
    }

    /// Volume types associated with the QoS specs.
    pub async fn get_associations(&self, id: &str) -> Result<Vec<Resource>> {
        manager::list(
            self.session(),
            &format!("{}/associations", qos_path(id)),
            "qos_associations",
            &Query::new(),
            None,
        )
        .await
    }
}

#[async_trait]
impl<'c> Findable for QosSpecs<'c> {
    fn resource_kind(&self) -> &'static str {
        "qos_specs"
    }

    async fn get_by_id(&self, id: &str) -> Result<Resource> {
        self.get(id).await
    }

    async fn list_by_name(&self, _name: &str) -> Result<Vec<Resource>> {
        self.list().await
    }
}
