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

//! JSON structures of requests to the Block Storage API.

#![allow(missing_docs)]

use serde_json::{json, Map, Value};

use crate::common::VolumeApi;

/// Volume arguments for a create request.
#[derive(Debug, Clone, Default)]
pub struct VolumeCreate {
    pub size: Option<u64>,
    pub consistency_group_id: Option<String>,
    pub snapshot_id: Option<String>,
    pub source_volume_id: Option<String>,
    pub source_replica: Option<String>,
    pub backup_id: Option<String>,
    pub image_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub volume_type: Option<String>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub availability_zone: Option<String>,
    pub metadata: Map<String, Value>,
    pub multiattach: bool,
    pub group_id: Option<String>,
    pub scheduler_hints: Map<String, Value>,
}

impl VolumeCreate {
    pub fn new(size: Option<u64>) -> VolumeCreate {
        VolumeCreate {
            size,
            ..VolumeCreate::default()
        }
    }

    /// Request body, absent values are sent as `null`.
    pub fn to_body(&self, api: VolumeApi, with_group: bool) -> Value {
        let mut volume = json!({
            "size": self.size,
            "consistencygroup_id": self.consistency_group_id,
            "snapshot_id": self.snapshot_id,
            "volume_type": self.volume_type,
            "user_id": self.user_id,
            "project_id": self.project_id,
            "availability_zone": self.availability_zone,
            "status": "creating",
            "attach_status": "detached",
            "metadata": self.metadata,
            "imageRef": self.image_id,
            "source_volid": self.source_volume_id,
            "source_replica": self.source_replica,
            "multiattach": self.multiattach,
        });
        if let Some(object) = volume.as_object_mut() {
            let _ = object.insert(api.name_key().to_string(), json!(self.name));
            let _ = object.insert(api.description_key().to_string(), json!(self.description));
            if api != VolumeApi::V1 {
                let _ = object.insert(String::from("backup_id"), json!(self.backup_id));
            }
            if with_group {
                if let Some(ref group_id) = self.group_id {
                    let _ = object.insert(String::from("group_id"), json!(group_id));
                }
            }
        }

        let mut body = json!({ "volume": volume });
        if !self.scheduler_hints.is_empty() {
            body["OS-SCH-HNT:scheduler_hints"] = Value::Object(self.scheduler_hints.clone());
        }
        body
    }
}

/// Snapshot arguments for a create request.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCreate {
    pub volume_id: String,
    pub force: bool,
    pub name: Option<String>,
    pub description: Option<String>,
    pub metadata: Map<String, Value>,
}

impl SnapshotCreate {
    pub fn new<S: Into<String>>(volume_id: S) -> SnapshotCreate {
        SnapshotCreate {
            volume_id: volume_id.into(),
            ..SnapshotCreate::default()
        }
    }

    /// Request body, absent values are sent as `null`.
    pub fn to_body(&self, api: VolumeApi) -> Value {
        let mut snapshot = json!({
            "volume_id": self.volume_id,
            "force": self.force,
        });
        if let Some(object) = snapshot.as_object_mut() {
            let _ = object.insert(api.name_key().to_string(), json!(self.name));
            let _ = object.insert(api.description_key().to_string(), json!(self.description));
            if api != VolumeApi::V1 {
                let _ = object.insert(String::from("metadata"), Value::Object(self.metadata.clone()));
            }
        }
        json!({ "snapshot": snapshot })
    }
}

/// Backup arguments for a create request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupCreate {
    pub volume_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub incremental: bool,
    pub force: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Group arguments for a create request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupCreate {
    pub group_type: String,
    pub volume_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

/// Arguments for creating a group from a group snapshot or another group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupFromSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Group arguments for an update request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_volumes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_volumes: Option<String>,
}

impl GroupUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.add_volumes.is_none()
            && self.remove_volumes.is_none()
    }
}

/// Attachment arguments for a create request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttachmentCreate {
    pub volume_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Image upload arguments.
#[derive(Debug, Clone, Serialize)]
pub struct ImageUpload {
    pub force: bool,
    pub image_name: String,
    pub container_format: String,
    pub disk_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
}

impl ImageUpload {
    pub fn new<S: Into<String>>(image_name: S) -> ImageUpload {
        ImageUpload {
            force: false,
            image_name: image_name.into(),
            container_format: String::from("bare"),
            disk_format: String::from("raw"),
            visibility: None,
            protected: None,
        }
    }
}

/// Volume migration arguments.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeMigrate {
    pub host: String,
    pub force_host_copy: bool,
    pub lock_volume: bool,
}

#[cfg(test)]
pub mod test {
    use serde_json::{json, to_value};

    use super::{BackupCreate, SnapshotCreate, VolumeCreate};
    use crate::common::VolumeApi;

    #[test]
    fn test_volume_create_body() {
        let body = VolumeCreate::new(Some(1)).to_body(VolumeApi::V3, true);
        assert_eq!(
            body,
            json!({"volume": {
                "size": 1,
                "consistencygroup_id": null,
                "snapshot_id": null,
                "name": null,
                "description": null,
                "volume_type": null,
                "user_id": null,
                "project_id": null,
                "availability_zone": null,
                "status": "creating",
                "attach_status": "detached",
                "metadata": {},
                "imageRef": null,
                "source_volid": null,
                "source_replica": null,
                "multiattach": false,
                "backup_id": null
            }})
        );
    }

    #[test]
    fn test_volume_create_v1_and_hints() {
        let mut req = VolumeCreate::new(Some(2));
        req.name = Some(String::from("vol"));
        req.group_id = Some(String::from("g1"));
        let _ = req.scheduler_hints.insert(String::from("same_host"), json!("abcd"));
        let body = req.to_body(VolumeApi::V1, false);
        assert_eq!(body["volume"]["display_name"], json!("vol"));
        assert!(body["volume"].get("name").is_none());
        assert!(body["volume"].get("group_id").is_none());
        assert_eq!(body["OS-SCH-HNT:scheduler_hints"], json!({"same_host": "abcd"}));

        let body = req.to_body(VolumeApi::V3, true);
        assert_eq!(body["volume"]["group_id"], json!("g1"));
    }

    #[test]
    fn test_snapshot_create_body() {
        let mut req = SnapshotCreate::new("1234");
        req.force = true;
        assert_eq!(
            req.to_body(VolumeApi::V2),
            json!({"snapshot": {
                "volume_id": "1234",
                "force": true,
                "name": null,
                "description": null,
                "metadata": {}
            }})
        );
    }

    #[test]
    fn test_backup_create_body() {
        let req = BackupCreate {
            volume_id: String::from("1234"),
            ..BackupCreate::default()
        };
        assert_eq!(
            to_value(&req).unwrap(),
            json!({"volume_id": "1234", "incremental": false, "force": false})
        );
    }
}
