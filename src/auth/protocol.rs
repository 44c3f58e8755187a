// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
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

//! JSON structures and protocol bits for the Identity v2 API.

#![allow(missing_docs)]

use std::fmt;

use super::EndpointType;

#[derive(Clone, Serialize)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Serialize)]
pub struct Auth {
    #[serde(rename = "passwordCredentials")]
    pub password_credentials: PasswordCredentials,
    #[serde(rename = "tenantName", skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct AuthRoot {
    pub auth: Auth,
}

#[derive(Clone, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(default)]
    pub expires: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(rename = "publicURL", default)]
    pub public_url: Option<String>,
    #[serde(rename = "internalURL", default)]
    pub internal_url: Option<String>,
    #[serde(rename = "adminURL", default)]
    pub admin_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Access {
    pub token: Token,
    #[serde(rename = "serviceCatalog")]
    pub service_catalog: Vec<CatalogRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessRoot {
    pub access: Access,
}

impl Endpoint {
    pub fn url_for(&self, endpoint_type: EndpointType) -> Option<&str> {
        match endpoint_type {
            EndpointType::Public => self.public_url.as_deref(),
            EndpointType::Internal => self.internal_url.as_deref(),
            EndpointType::Admin => self.admin_url.as_deref(),
        }
    }
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PasswordCredentials {{ username: {:?}, password: *** }}", self.username)
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Auth")
            .field("password_credentials", &self.password_credentials)
            .field("tenant_name", &self.tenant_name)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl fmt::Debug for AuthRoot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AuthRoot").field("auth", &self.auth).finish()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Token {{ id: ***, expires: {:?} }}", self.expires)
    }
}
