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

//! User messages and volume attachments.

use serde_json::json;

use super::protocol::AttachmentCreate;
use crate::client::Client;
use crate::common::manager;
use crate::common::{ApiVersion, ListOptions, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::Result;

/// Message manager (API 3.3).
#[derive(Debug, Clone, Copy)]
pub struct Messages<'c> {
    client: &'c Client,
}

/// Attachment manager (API 3.27).
#[derive(Debug, Clone, Copy)]
pub struct Attachments<'c> {
    client: &'c Client,
}

impl<'c> Messages<'c> {
    pub(crate) fn new(client: &'c Client) -> Messages<'c> {
        Messages { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    fn check(&self) -> Result<()> {
        self.client.require(ApiVersion(3, 3), "Messages")
    }

    /// List messages.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        self.check()?;
        let query = options.to_query(&[])?;
        manager::list(self.session(), "/messages", "messages", &query, options.limit).await
    }

    /// Get a message by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        self.check()?;
        manager::get(self.session(), &format!("/messages/{}", id), "message").await
    }

    /// Delete a message.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.check()?;
        manager::delete(self.session(), &format!("/messages/{}", id), &Query::new()).await
    }
}

impl<'c> Attachments<'c> {
    pub(crate) fn new(client: &'c Client) -> Attachments<'c> {
        Attachments { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    fn check(&self) -> Result<()> {
        self.client.require(ApiVersion(3, 27), "Attachments")
    }

    /// List attachments.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        self.check()?;
        let path = if options.detailed {
            "/attachments/detail"
        } else {
            "/attachments"
        };
        let query = options.to_query(&[])?;
        manager::list(self.session(), path, "attachments", &query, options.limit).await
    }

    /// Get an attachment by its ID.
    pub async fn get(&self, id: &str) -> Result<Resource> {
        self.check()?;
        manager::get(self.session(), &format!("/attachments/{}", id), "attachment").await
    }

    /// Create an attachment of a volume.
    ///
    /// The attach mode is only sent starting with API 3.54.
    pub async fn create(&self, request: &AttachmentCreate) -> Result<Resource> {
        self.check()?;
        let mut attachment = serde_json::to_value(request)?;
        if !self.client.supports(ApiVersion(3, 54)) {
            if let Some(object) = attachment.as_object_mut() {
                let _ = object.remove("mode");
            }
        }
        manager::create(
            self.session(),
            "/attachments",
            "attachment",
            json!({ "attachment": attachment }),
        )
        .await
    }

    /// Delete an attachment.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.check()?;
        manager::delete(
            self.session(),
            &format!("/attachments/{}", id),
            &Query::new(),
        )
        .await
    }
}
