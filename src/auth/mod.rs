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

//! Authentication modules.
//!
//! Accessing the Block Storage API requires a management URL and usually a
//! token. This module provides a way to obtain both from an Identity
//! service, as well as simple authentication implementations for
//! standalone use.
//!
//! The usual workflow is as follows:
//!
//! 1. Create a suitable authentication method, either directly or from an
//!    [AuthConfig](struct.AuthConfig.html).
//! 2. Create a [Session](../struct.Session.html) with it.
//! 3. Pass the session to a [Client](../struct.Client.html).
//!
//! # Password authentication
//!
//! [PasswordAuth](struct.PasswordAuth.html) speaks two protocols. When the
//! auth URL contains a `v2.0` path segment, credentials are posted as JSON
//! and the management URL is picked from the returned service catalog.
//! Otherwise the legacy header scheme is used first, falling back to
//! `<auth_url>/v2.0` when the server does not understand it.
//!
//! ```rust,no_run
//! use cinderclient::auth::PasswordAuth;
//!
//! let auth = PasswordAuth::new("https://my.cloud.com/identity/v2.0", "admin", "pa$$w0rd")
//!     .expect("Invalid auth URL")
//!     .with_project_name("project1")
//!     .with_region("RegionOne");
//! ```
//!
//! # Standalone clouds
//!
//! [NoAuth](struct.NoAuth.html) and [TokenAuth](struct.TokenAuth.html)
//! use a fixed endpoint, [CinderNoAuth](struct.CinderNoAuth.html) mimics
//! the `noauth` middleware of Cinder. Alternative mechanisms are looked up
//! by name in an [AuthPlugins](struct.AuthPlugins.html) registry.
//!
//! ```
//! use cinderclient::auth::NoAuth;
//!
//! let auth = NoAuth::new("https://my.cloud.com/volume/v3/project").unwrap();
//! ```

mod base;
mod catalog;
mod config;
mod password;
mod plugins;
mod protocol;
mod simple;

pub use self::base::{AuthMethod, AuthState};
pub use self::catalog::{EndpointFilters, EndpointType, ServiceCatalog};
pub use self::config::AuthConfig;
pub use self::password::PasswordAuth;
pub use self::plugins::{AuthPlugins, PluginFactory};
pub use self::simple::{CinderNoAuth, NoAuth, TokenAuth};

/// Tokens expiring sooner than this (in minutes) are refreshed.
pub(crate) const TOKEN_MIN_VALIDITY: i64 = 10;

/// Maximum number of HTTP 305 redirects followed during authentication.
pub const MAX_REDIRECTS: usize = 5;
