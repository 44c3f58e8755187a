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

//! Services, clusters, availability zones and back end capabilities.

use serde_json::json;

use crate::client::Client;
use crate::common::manager::{self, resource_from, resource_from_body};
use crate::common::{ApiVersion, ListOptions, Resource};
use crate::session::Session;
use crate::utils::Query;
use crate::Result;

/// Service manager.
#[derive(Debug, Clone, Copy)]
pub struct Services<'c> {
    client: &'c Client,
}

/// Cluster manager (API 3.7).
#[derive(Debug, Clone, Copy)]
pub struct Clusters<'c> {
    client: &'c Client,
}

/// Availability zone manager.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityZones<'c> {
    client: &'c Client,
}

/// Capabilities manager.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities<'c> {
    client: &'c Client,
}

impl<'c> Services<'c> {
    pub(crate) fn new(client: &'c Client) -> Services<'c> {
        Services { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    /// List services, optionally filtered by host and binary.
    pub async fn list(&self, host: Option<&str>, binary: Option<&str>) -> Result<Vec<Resource>> {
        let mut query = Query::new();
        query.push_opt("host", host);
        query.push_opt("binary", binary);
        manager::list(self.session(), "/os-services", "services", &query, None).await
    }

    /// Enable a service.
    pub async fn enable(&self, host: &str, binary: &str) -> Result<Resource> {
        let resp = self
            .session()
            .put(
                "/os-services/enable",
                Some(json!({ "host": host, "binary": binary })),
            )
            .await?;
        resource_from_body(&resp)
    }

    /// Disable a service, recording the reason if given.
    pub async fn disable(
        &self,
        host: &str,
        binary: &str,
        reason: Option<&str>,
    ) -> Result<Resource> {
        let resp = match reason {
            Some(reason) => {
                self.session()
                    .put(
                        "/os-services/disable-log-reason",
                        Some(json!({
                            "host": host,
                            "binary": binary,
                            "disabled_reason": reason,
                        })),
                    )
                    .await?
            }
            None => {
                self.session()
                    .put(
                        "/os-services/disable",
                        Some(json!({ "host": host, "binary": binary })),
                    )
                    .await?
            }
        };
        resource_from_body(&resp)
    }
}

impl<'c> Clusters<'c> {
    pub(crate) fn new(client: &'c Client) -> Clusters<'c> {
        Clusters { client }
    }

    #[inline]
    fn session(&self) -> &'c Session {
        self.client.session()
    }

    fn check(&self) -> Result<()> {
        self.client.require(ApiVersion(3, 7), "Clusters")
    }

    /// List clusters.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Resource>> {
        self.check()?;
        let path = if options.detailed {
            "/clusters/detail"
        } else {
            "/clusters"
        };
        let query = options.to_query(&[])?;
        manager::list(self.session(), path, "clusters", &query, options.limit).await
    }

    /// Get a cluster by name and binary.
    pub async fn get(&self, name: &str, binary: &str) -> Result<Resource> {
        self.check()?;
        let query = Query::new().with("binary", binary);
        let resp = self
            .session()
            .get(&format!("/clusters/{}", name), &query)
            .await?;
        resource_from(&resp, "cluster")
    }

    /// Enable a cluster.
    pub async fn enable(&self, name: &str, binary: &str) -> Result<Resource> {
        self.check()?;
        let resp = self
            .session()
            .put(
                "/clusters/enable",
                Some(json!({ "name": name, "binary": binary })),
            )
            .await?;
        resource_from(&resp, "cluster")
    }

    /// Disable a cluster.
    pub async fn disable(
        &self,
        name: &str,
        binary: &str,
        reason: Option<&str>,
    ) -> Result<Resource> {
        self.check()?;
        let resp = self
            .session()
            .put(
                "/clusters/disable",
                Some(json!({
                    "name": name,
                    "binary": binary,
                    "disabled_reason": reason,
                })),
            )
            .await?;
        resource_from(&resp, "cluster")
    }
}

impl<'c> AvailabilityZones<'c> {
    pub(crate) fn new(client: &'c Client) -> AvailabilityZones<'c> {
        AvailabilityZones { client }
    }

    /// List availability zones.
    pub async fn list(&self, detailed: bool) -> Result<Vec<Resource>> {
        let path = if detailed {
            "/os-availability-zone/detail"
        } else {
            "/os-availability-zone"
        };
        manager::list(
            self.client.session(),
            path,
            "availabilityZoneInfo",
            &Query::new(),
            None,
        )
        .await
    }
}

impl<'c> Capabilities<'c> {
    pub(crate) fn new(client: &'c Client) -> Capabilities<'c> {
        Capabilities { client }
    }

    /// Capabilities of a back end `host@backend#pool`.
    pub async fn get(&self, host: &str) -> Result<Resource> {
        let resp = self
            .client
            .session()
            .get(&format!("/capabilities/{}", host), &Query::new())
            .await?;
        resource_from_body(&resp)
    }
}
