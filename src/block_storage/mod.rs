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

//! Block Storage API support.
//!
//! Managers are obtained from a [Client](../struct.Client.html) and borrow
//! it. Every call issues a single request (list calls may follow `next`
//! links) and returns generic [Resource](../common/struct.Resource.html)
//! records.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cinderclient::block_storage::VolumeCreate;
//! use cinderclient::common::ListOptions;
//!
//! # async fn volumes() -> cinderclient::Result<()> {
//! let client = cinderclient::Client::from_env(cinderclient::ApiVersion(3, 27))?;
//!
//! let volumes = client.volumes().list(&ListOptions::new().with_limit(10)).await?;
//! let mut request = VolumeCreate::new(Some(1));
//! request.name = Some(String::from("my-volume"));
//! let volume = client.volumes().create(&request).await?;
//! # Ok(()) }
//! ```
//!
//! Resources with a minimum microversion (groups, messages, clusters,
//! attachments, default types) fail with `UnsupportedVersion` when the
//! client was created with an older version.

mod backups;
mod groups;
mod messages;
mod protocol;
mod qos;
mod quotas;
mod services;
mod snapshots;
mod transfers;
mod types;
mod volumes;

pub use self::backups::{Backups, BACKUP_SORT_KEYS};
pub use self::groups::{GroupSnapshots, Groups};
pub use self::messages::{Attachments, Messages};
pub use self::protocol::{
    AttachmentCreate, BackupCreate, GroupCreate, GroupFromSource, GroupUpdate, ImageUpload,
    SnapshotCreate, VolumeCreate, VolumeMigrate,
};
pub use self::qos::QosSpecs;
pub use self::quotas::{Limits, QuotaClasses, Quotas};
pub use self::services::{AvailabilityZones, Capabilities, Clusters, Services};
pub use self::snapshots::Snapshots;
pub use self::transfers::Transfers;
pub use self::types::{DefaultTypes, VolumeTypes};
pub use self::volumes::{Volumes, VOLUME_SORT_KEYS};
