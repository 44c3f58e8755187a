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

//! Quotas, quota classes and limits.

use serde_json::{json, Map, Value};

use crate::client::Client;
use crate::common::manager;
use crate::common::Resource;
use crate::session::Session;
use crate::utils::Query;
use crate::Result;

/// Project quota manager.
#[derive(Debug, Clone, Copy)]
pub struct Quotas<'c> {
    client: &'c Client,
}

/// Quota class manager.
#[derive(Debug, Clone, Copy)]
pub struct QuotaClasses<'c> {
    client: &'c Client,
}

/// Limits manager.
#[derive(Debug, Clone, Copy)]
pub struct Limits<'c> {
    client: &'c Client,
}

fn quota_path(project_id: &str) -> String {
    format!("/os-quota-sets/{}", project_id)
}

impl<'c> Quotas<'c> {
    pub(crate) fn new(client: &'c Client) -> Quotas<'c> {
        Quotas { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    /// Quotas of a project, with in-use and reserved numbers if `usage` is set.
    pub async fn get(&self, project_id: &str, usage: bool) -> Result<Resource> {
        let mut query = Query::new();
        if usage {
            query.push_str("usage", "True");
        }
        let resp = self.session().get(&quota_path(project_id), &query).await?;
        manager::resource_from(&resp, "quota_set")
    }

    /// Default quotas.
    pub async fn defaults(&self, project_id: &str) -> Result<Resource> {
        manager::get(
            self.session(),
            &format!("{}/defaults", quota_path(project_id)),
            "quota_set",
        )
        .await
    }

    /// Update quotas of a project.
    pub async fn update(&self, project_id: &str, updates: Map<String, Value>) -> Result<Resource> {
        let mut body = updates;
        let _ = body.insert(String::from("tenant_id"), json!(project_id));
        let result = manager::update(
            self.session(),
            &quota_path(project_id),
            "quota_set",
            json!({ "quota_set": body }),
        )
        .await?;
        Ok(result.unwrap_or_default())
    }

    /// Reset quotas of a project to the defaults.
    pub async fn delete(&self, project_id: &str) -> Result<()> {
        manager::delete(self.session(), &quota_path(project_id), &Query::new()).await
    }
}

impl<'c> QuotaClasses<'c> {
    pub(crate) fn new(client: &'c Client) -> QuotaClasses<'c> {
        QuotaClasses { client }
    }

    /// Quotas of a class.
    pub async fn get(&self, class_name: &str) -> Result<Resource> {
        manager::get(
            self.client.session(),
            &format!("/os-quota-class-sets/{}", class_name),
            "quota_class_set",
        )
        .await
    }

    /// Update quotas of a class.
    pub async fn update(&self, class_name: &str, updates: Map<String, Value>) -> Result<Resource> {
        let mut body = updates;
        let _ = body.insert(String::from("class_name"), json!(class_name));
        let result = manager::update(
            self.client.session(),
            &format!("/os-quota-class-sets/{}", class_name),
            "quota_class_set",
            json!({ "quota_class_set": body }),
        )
        .await?;
        Ok(result.unwrap_or_default())
    }
}

impl<'c> Limits<'c> {
    pub(crate) fn new(client: &'c Client) -> Limits<'c> {
        Limits { client }
    }

    /// Absolute and rate limits, under the `absolute` and `rate` keys.
    pub async fn get(&self) -> Result<Resource> {
        manager::get(self.client.session(), "/limits", "limits").await
    }
}
