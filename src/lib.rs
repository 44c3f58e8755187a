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

//! OpenStack Block Storage (Cinder) client in Rust.
//!
//! The goal of this project is to provide a simple API for working with
//! the Block Storage service of OpenStack clouds, as well as a `cinder`
//! command line tool built on top of it.
//!
//! # Features
//!
//! * [Authentication](auth/index.html) against Keystone v2.0, the legacy
//!   header protocol, fixed tokens and `noauth` deployments
//! * An HTTP [session](struct.Session.html) with token refresh and retries
//! * [Block Storage API](block_storage/index.html) managers for volumes,
//!   snapshots, backups, types, QoS, quotas, transfers, groups and more
//! * The v1, v2 and v3 APIs with [microversions](struct.ApiVersion.html)
//!
//! # Example
//!
//! ```rust,no_run
//! use cinderclient::common::ListOptions;
//!
//! # async fn list() -> cinderclient::Result<()> {
//! let client = cinderclient::Client::from_env(cinderclient::ApiVersion(3, 0))?;
//! for volume in client.volumes().list(&ListOptions::new()).await? {
//!     println!("{:?} {:?}", volume.id(), volume.name());
//! }
//! # Ok(()) }
//! ```

#![crate_name = "cinderclient"]
#![crate_type = "lib"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    improper_ctypes,
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_extern_crates,
    unused_import_braces,
    unused_parens,
    while_true
)]
#![warn(unused_results)]

#[macro_use]
extern crate serde_derive;

pub mod auth;
pub mod block_storage;
mod client;
pub mod common;
mod error;
pub mod http;
mod session;
pub mod shell;
mod utils;

pub use crate::client::Client;
pub use crate::common::{ApiVersion, VolumeApi};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::session::{BodyHook, HookPoint, Session, DEFAULT_BACKOFF};
pub use crate::utils::Query;
