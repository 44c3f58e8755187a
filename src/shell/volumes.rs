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

//! Volume and snapshot commands.

use std::io::Write;

use clap::ArgMatches;
use serde_json::{json, Map, Value};

use super::descriptor::{
    flag, list_options, parse, parse_bool, required, value, values, ArgSpec, CommandSpec,
};
use super::output::{print_dict, print_list, print_resource, Formatter};
use super::{find, resource_id, summarize_failures};
use crate::block_storage::{ImageUpload, SnapshotCreate, VolumeCreate, VolumeMigrate};
use crate::common::{ApiVersion, ListOptions, Resource};
use crate::utils::parse_key_values;
use crate::{Client, Error, Result};

const VOLUME_KEYS: &[(&str, &str)] = &[
    ("os-vol-tenant-attr:tenant_id", "tenant_id"),
    ("display_name", "name"),
    ("display_description", "description"),
];

const METADATA_ACTIONS: &[&str] = &["set", "unset"];

pub(super) static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "list",
        about: "Lists all volumes.",
        args: &[
            ArgSpec::flag("all-tenants", "Shows details for all tenants. Admin only."),
            ArgSpec::option("tenant", "Display information from single tenant (Admin only)."),
            ArgSpec::option("name", "Filters results by a name."),
            ArgSpec::option("status", "Filters results by a status."),
            ArgSpec::option("bootable", "Filters results by bootable status."),
            ArgSpec::option("migration-status", "Filters results by a migration status."),
            ArgSpec::repeated("metadata", "Filters results by metadata key=value pairs."),
            ArgSpec::option("marker", "Begin returning volumes that appear later in the list."),
            ArgSpec::option("limit", "Maximum number of volumes to return."),
            ArgSpec::option("sort", "Comma-separated list of sort keys and directions."),
        ],
        min_version: None,
        handler: handler!(do_list),
    },
    CommandSpec {
        name: "show",
        about: "Shows volume details.",
        args: &[ArgSpec::positional("volume", "Name or ID of volume.")],
        min_version: None,
        handler: handler!(do_show),
    },
    CommandSpec {
        name: "create",
        about: "Creates a volume.",
        args: &[
            ArgSpec::positional(
                "size",
                "Size of volume, in GiBs. Required unless snapshot-id/source-volid/backup-id is specified.",
            )
            .optional(),
            ArgSpec::option("consisgroup-id", "ID of a consistency group."),
            ArgSpec::option("group-id", "ID of a group (API 3.13 or later)."),
            ArgSpec::option("snapshot-id", "Creates volume from snapshot ID."),
            ArgSpec::option("source-volid", "Creates volume from volume ID."),
            ArgSpec::option("source-replica", "Creates volume from replicated volume ID."),
            ArgSpec::option("backup-id", "Creates a volume by restoring a backup."),
            ArgSpec::option("image-id", "Creates volume from image ID."),
            ArgSpec::option("name", "Volume name."),
            ArgSpec::option("description", "Volume description."),
            ArgSpec::option("volume-type", "Volume type."),
            ArgSpec::option("availability-zone", "Availability zone for volume."),
            ArgSpec::repeated("metadata", "Metadata key and value pairs."),
            ArgSpec::repeated("hint", "Scheduler hint, like in nova."),
            ArgSpec::flag("allow-multiattach", "Allow volume to be attached more than once."),
        ],
        min_version: None,
        handler: handler!(do_create),
    },
    CommandSpec {
        name: "delete",
        about: "Removes one or more volumes.",
        args: &[
            ArgSpec::flag("cascade", "Remove any snapshots along with volume."),
            ArgSpec::positionals("volume", "Name or ID of volume or volumes to delete."),
        ],
        min_version: None,
        handler: handler!(do_delete),
    },
    CommandSpec {
        name: "force-delete",
        about: "Attempts force-delete of volume, regardless of state.",
        args: &[ArgSpec::positionals("volume", "Name or ID of volume or volumes to delete.")],
        min_version: None,
        handler: handler!(do_force_delete),
    },
    CommandSpec {
        name: "rename",
        about: "Renames a volume.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume to rename."),
            ArgSpec::positional("name", "New name for volume.").optional(),
            ArgSpec::option("description", "Volume description."),
        ],
        min_version: None,
        handler: handler!(do_rename),
    },
    CommandSpec {
        name: "metadata",
        about: "Sets or deletes volume metadata.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume for which to update metadata."),
            ArgSpec::positional("action", "The action.").choices(METADATA_ACTIONS),
            ArgSpec::positionals("metadata", "Metadata key and value pair to set or unset."),
        ],
        min_version: None,
        handler: handler!(do_metadata),
    },
    CommandSpec {
        name: "extend",
        about: "Attempts to extend size of an existing volume.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume to extend."),
            ArgSpec::positional("new-size", "New size of volume, in GiBs."),
        ],
        min_version: None,
        handler: handler!(do_extend),
    },
    CommandSpec {
        name: "reset-state",
        about: "Explicitly updates the volume state in the Cinder database.",
        args: &[
            ArgSpec::positionals("volume", "Name or ID of volume to modify."),
            ArgSpec::option("state", "The state to assign to the volume."),
            ArgSpec::option("attach-status", "The attach status to assign to the volume.")
                .choices(&["attached", "detached"]),
            ArgSpec::flag("reset-migration-status", "Clears the migration status of the volume."),
        ],
        min_version: None,
        handler: handler!(do_reset_state),
    },
    CommandSpec {
        name: "retype",
        about: "Changes the volume type for a volume.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume for which to modify type."),
            ArgSpec::positional("volume-type", "New volume type."),
            ArgSpec::option("migration-policy", "Migration policy during retype of volume.")
                .choices(&["never", "on-demand"])
                .default_value("never"),
        ],
        min_version: None,
        handler: handler!(do_retype),
    },
    CommandSpec {
        name: "set-bootable",
        about: "Update bootable status of a volume.",
        args: &[
            ArgSpec::positional("volume", "ID of the volume to update."),
            ArgSpec::option("bootable", "Flag to indicate whether volume is bootable.").required(),
        ],
        min_version: None,
        handler: handler!(do_set_bootable),
    },
    CommandSpec {
        name: "readonly-mode-update",
        about: "Updates volume read-only access-mode flag.",
        args: &[
            ArgSpec::positional("volume", "ID of volume to update."),
            ArgSpec::positional("read-only", "Enables or disables update of volume to read-only access mode."),
        ],
        min_version: None,
        handler: handler!(do_readonly_mode_update),
    },
    CommandSpec {
        name: "upload-to-image",
        about: "Uploads volume to Image Service as an image.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume to snapshot."),
            ArgSpec::positional("image-name", "The new image name."),
            ArgSpec::flag("force", "Enables upload of a volume that is attached to an instance."),
            ArgSpec::option("container-format", "Container format type.").default_value("bare"),
            ArgSpec::option("disk-format", "Disk format type.").default_value("raw"),
            ArgSpec::option("visibility", "Makes image publicly accessible (API 3.1 or later).")
                .choices(&["public", "private", "shared", "community"]),
            ArgSpec::option("protected", "Prevents image from being deleted (API 3.1 or later)."),
        ],
        min_version: None,
        handler: handler!(do_upload_to_image),
    },
    CommandSpec {
        name: "migrate",
        about: "Migrates volume to a new host.",
        args: &[
            ArgSpec::positional("volume", "ID of volume to migrate."),
            ArgSpec::positional("host", "Destination host, host@backend-name#pool."),
            ArgSpec::flag("force-host-copy", "Enables or disables generic host-based force-migration."),
            ArgSpec::flag("lock-volume", "Enables or disables the termination of volume migration caused by other commands."),
        ],
        min_version: None,
        handler: handler!(do_migrate),
    },
    CommandSpec {
        name: "snapshot-list",
        about: "Lists all snapshots.",
        args: &[
            ArgSpec::flag("all-tenants", "Shows details for all tenants. Admin only."),
            ArgSpec::option("name", "Filters results by a name."),
            ArgSpec::option("status", "Filters results by a status."),
            ArgSpec::option("volume-id", "Filters results by a volume ID."),
            ArgSpec::option("marker", "Begin returning snapshots that appear later in the list."),
            ArgSpec::option("limit", "Maximum number of snapshots to return."),
            ArgSpec::option("sort", "Comma-separated list of sort keys and directions."),
        ],
        min_version: None,
        handler: handler!(do_snapshot_list),
    },
    CommandSpec {
        name: "snapshot-show",
        about: "Shows snapshot details.",
        args: &[ArgSpec::positional("snapshot", "Name or ID of snapshot.")],
        min_version: None,
        handler: handler!(do_snapshot_show),
    },
    CommandSpec {
        name: "snapshot-create",
        about: "Creates a snapshot.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume to snapshot."),
            ArgSpec::flag("force", "Allows a snapshot of a volume attached to an instance."),
            ArgSpec::option("name", "Snapshot name."),
            ArgSpec::option("description", "Snapshot description."),
            ArgSpec::repeated("metadata", "Snapshot metadata key and value pairs."),
        ],
        min_version: None,
        handler: handler!(do_snapshot_create),
    },
    CommandSpec {
        name: "snapshot-delete",
        about: "Removes one or more snapshots.",
        args: &[ArgSpec::positionals("snapshot", "Name or ID of the snapshot(s) to delete.")],
        min_version: None,
        handler: handler!(do_snapshot_delete),
    },
    CommandSpec {
        name: "snapshot-rename",
        about: "Renames a snapshot.",
        args: &[
            ArgSpec::positional("snapshot", "Name or ID of snapshot."),
            ArgSpec::positional("name", "New name for snapshot.").optional(),
            ArgSpec::option("description", "Snapshot description."),
        ],
        min_version: None,
        handler: handler!(do_snapshot_rename),
    },
    CommandSpec {
        name: "snapshot-reset-state",
        about: "Explicitly updates the snapshot state.",
        args: &[
            ArgSpec::positionals("snapshot", "Name or ID of snapshot to modify."),
            ArgSpec::option("state", "The state to assign to the snapshot.").default_value("available"),
        ],
        min_version: None,
        handler: handler!(do_snapshot_reset_state),
    },
    CommandSpec {
        name: "snapshot-metadata",
        about: "Sets or deletes snapshot metadata.",
        args: &[
            ArgSpec::positional("snapshot", "ID of snapshot for which to update metadata."),
            ArgSpec::positional("action", "The action.").choices(METADATA_ACTIONS),
            ArgSpec::positionals("metadata", "Metadata key and value pair to set or unset."),
        ],
        min_version: None,
        handler: handler!(do_snapshot_metadata),
    },
];

fn attached_to(volume: &Resource) -> String {
    volume
        .get("attachments")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("server_id").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}

fn translate_volume_keys(volume: &mut Resource) {
    volume.translate_keys(VOLUME_KEYS);
}

fn metadata_filter(items: &[&str]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(Value::Object(parse_key_values(items)).to_string())
    }
}

/// Name and description fields of an update, with the keys of the API version.
fn rename_fields(client: &Client, args: &ArgMatches) -> Result<Map<String, Value>> {
    let api = client.api();
    let mut fields = Map::new();
    if let Some(name) = value(args, "name") {
        let _ = fields.insert(String::from(api.name_key()), json!(name));
    }
    if let Some(description) = value(args, "description") {
        let _ = fields.insert(String::from(api.description_key()), json!(description));
    }
    if fields.is_empty() {
        return Err(Error::new_command_error(
            "Must supply either name or description.",
        ));
    }
    Ok(fields)
}

async fn do_list(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let tenant = value(args, "tenant");
    let all_tenants = flag(args, "all-tenants") || tenant.is_some();
    let mut options = list_options(args)?;
    if tenant.is_some() && !flag(args, "all-tenants") {
        options = options.with_filter("all_tenants", 1);
    }
    let options = options
        .with_optional_filter("project_id", tenant)
        .with_optional_filter(client.api().name_key(), value(args, "name"))
        .with_optional_filter("status", value(args, "status"))
        .with_optional_filter("bootable", value(args, "bootable"))
        .with_optional_filter("migration_status", value(args, "migration-status"))
        .with_optional_filter("metadata", metadata_filter(&values(args, "metadata")));

    let mut volumes = client.volumes().list(&options).await?;
    for volume in &mut volumes {
        translate_volume_keys(volume);
    }

    let mut fields = vec!["ID", "Status", "Name", "Size", "Volume Type", "Bootable", "Attached to"];
    if all_tenants {
        fields.insert(1, "Tenant ID");
    }
    let formatters: &[(&str, Formatter)] = &[("Attached to", attached_to)];
    let sortby_index = if options.sort.is_some() { None } else { Some(0) };
    print_list(out, &volumes, &fields, formatters, sortby_index)
}

async fn do_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let mut volume = find(&client.volumes(), required(args, "volume")?).await?;
    translate_volume_keys(&mut volume);
    if let Some(readonly) = volume
        .get("metadata")
        .and_then(|metadata| metadata.get("readonly"))
        .cloned()
    {
        volume.set("readonly", readonly);
    }
    print_resource(out, &volume)
}

async fn do_create(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let size = parse::<u64>(args, "size")?;
    let snapshot_id = value(args, "snapshot-id");
    let source_volid = value(args, "source-volid");
    let backup_id = value(args, "backup-id");
    if size.is_none() && snapshot_id.is_none() && source_volid.is_none() && backup_id.is_none() {
        return Err(Error::new_command_error(
            "Size is a required parameter if snapshot or source volume or backup is not specified.",
        ));
    }
    if value(args, "group-id").is_some() {
        client.require(ApiVersion(3, 13), "Creating a volume in a group")?;
    }

    let mut hints = Map::new();
    for hint in values(args, "hint") {
        let (key, item) = hint.split_once('=').unwrap_or((hint, ""));
        match hints.get_mut(key) {
            Some(Value::Array(existing)) => existing.push(json!(item)),
            Some(existing) => {
                let previous = existing.take();
                *existing = json!([previous, item]);
            }
            None => {
                let _ = hints.insert(String::from(key), json!(item));
            }
        }
    }

    let mut request = VolumeCreate::new(size);
    request.consistency_group_id = value(args, "consisgroup-id").map(String::from);
    request.group_id = value(args, "group-id").map(String::from);
    request.snapshot_id = snapshot_id.map(String::from);
    request.source_volume_id = source_volid.map(String::from);
    request.source_replica = value(args, "source-replica").map(String::from);
    request.backup_id = backup_id.map(String::from);
    request.image_id = value(args, "image-id").map(String::from);
    request.name = value(args, "name").map(String::from);
    request.description = value(args, "description").map(String::from);
    request.volume_type = value(args, "volume-type").map(String::from);
    request.availability_zone = value(args, "availability-zone").map(String::from);
    request.metadata = parse_key_values(values(args, "metadata"));
    request.scheduler_hints = hints;
    request.multiattach = flag(args, "allow-multiattach");

    let volume = client.volumes().create(&request).await?;
    let mut volume = client.volumes().get(&resource_id(&volume)?).await?;
    translate_volume_keys(&mut volume);
    if let Some(readonly) = volume
        .get("metadata")
        .and_then(|metadata| metadata.get("readonly"))
        .cloned()
    {
        volume.set("readonly", readonly);
    }
    print_resource(out, &volume)
}

async fn do_delete(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let cascade = flag(args, "cascade");
    let items = values(args, "volume");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.volumes(), item).await {
            Ok(volume) => client.volumes().delete(&resource_id(&volume)?, cascade).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => writeln!(out, "Request to delete volume {} has been accepted.", item)?,
            Err(e) => failures.push((item.to_string(), e)),
        }
    }
    summarize_failures(out, items.len(), failures, "delete volume")
}

async fn do_force_delete(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let items = values(args, "volume");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.volumes(), item).await {
            Ok(volume) => client.volumes().force_delete(&resource_id(&volume)?).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "force delete volume")
}

async fn do_rename(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    let fields = rename_fields(client, args)?;
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    let _ = client.volumes().update(&resource_id(&volume)?, fields).await?;
    Ok(())
}

async fn do_metadata(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    let id = resource_id(&volume)?;
    let items = values(args, "metadata");
    if required(args, "action")? == "set" {
        let metadata = client
            .volumes()
            .set_metadata(&id, parse_key_values(items))
            .await?;
        print_dict(out, &metadata)
    } else {
        let keys: Vec<String> = parse_key_values(items).keys().cloned().collect();
        client.volumes().delete_metadata(&id, &keys).await
    }
}

async fn do_extend(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    let new_size = parse::<u64>(args, "new-size")?
        .ok_or_else(|| Error::new_command_error("New size is required"))?;
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    client.volumes().extend(&resource_id(&volume)?, new_size).await
}

async fn do_reset_state(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let attach_status = value(args, "attach-status");
    let migration_status = if flag(args, "reset-migration-status") {
        Some("none")
    } else {
        None
    };
    // Without other changes the state is reset to available.
    let state = match value(args, "state") {
        Some(state) => Some(state),
        None if attach_status.is_none() && migration_status.is_none() => Some("available"),
        None => None,
    };

    let items = values(args, "volume");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.volumes(), item).await {
            Ok(volume) => {
                client
                    .volumes()
                    .reset_state(&resource_id(&volume)?, state, attach_status, migration_status)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "update the state of volume")
}

async fn do_retype(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    client
        .volumes()
        .retype(
            &resource_id(&volume)?,
            required(args, "volume-type")?,
            value(args, "migration-policy").unwrap_or("never"),
        )
        .await
}

async fn do_set_bootable(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    let bootable = parse_bool(args, "bootable")?.unwrap_or(false);
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    client
        .volumes()
        .set_bootable(&resource_id(&volume)?, bootable)
        .await
}

async fn do_readonly_mode_update(
    client: &Client,
    args: &ArgMatches,
    _out: &mut dyn Write,
) -> Result<()> {
    let readonly = parse_bool(args, "read-only")?.unwrap_or(false);
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    client
        .volumes()
        .update_readonly_flag(&resource_id(&volume)?, readonly)
        .await
}

async fn do_upload_to_image(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let mut request = ImageUpload::new(required(args, "image-name")?);
    request.force = flag(args, "force");
    if let Some(container_format) = value(args, "container-format") {
        request.container_format = String::from(container_format);
    }
    if let Some(disk_format) = value(args, "disk-format") {
        request.disk_format = String::from(disk_format);
    }
    request.visibility = value(args, "visibility").map(String::from);
    request.protected = parse_bool(args, "protected")?;

    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    let result = client
        .volumes()
        .upload_to_image(&resource_id(&volume)?, &request)
        .await?;
    print_dict(out, result.info())
}

async fn do_migrate(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    let request = VolumeMigrate {
        host: String::from(required(args, "host")?),
        force_host_copy: flag(args, "force-host-copy"),
        lock_volume: flag(args, "lock-volume"),
    };
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    client
        .volumes()
        .migrate(&resource_id(&volume)?, &request)
        .await
}

async fn do_snapshot_list(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let options: ListOptions = list_options(args)?
        .with_optional_filter(client.api().name_key(), value(args, "name"))
        .with_optional_filter("status", value(args, "status"))
        .with_optional_filter("volume_id", value(args, "volume-id"));
    let mut snapshots = client.snapshots().list(&options).await?;
    for snapshot in &mut snapshots {
        snapshot.translate_keys(VOLUME_KEYS);
    }
    let sortby_index = if options.sort.is_some() { None } else { Some(0) };
    print_list(
        out,
        &snapshots,
        &["ID", "Volume ID", "Status", "Name", "Size"],
        &[],
        sortby_index,
    )
}

async fn do_snapshot_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let mut snapshot = find(&client.snapshots(), required(args, "snapshot")?).await?;
    snapshot.translate_keys(VOLUME_KEYS);
    print_resource(out, &snapshot)
}

async fn do_snapshot_create(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    let mut request = SnapshotCreate::new(resource_id(&volume)?);
    request.force = flag(args, "force");
    request.name = value(args, "name").map(String::from);
    request.description = value(args, "description").map(String::from);
    request.metadata = parse_key_values(values(args, "metadata"));
    let mut snapshot = client.snapshots().create(&request).await?;
    snapshot.translate_keys(VOLUME_KEYS);
    print_resource(out, &snapshot)
}

async fn do_snapshot_delete(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let items = values(args, "snapshot");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.snapshots(), item).await {
            Ok(snapshot) => client.snapshots().delete(&resource_id(&snapshot)?).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "delete snapshot")
}

async fn do_snapshot_rename(
    client: &Client,
    args: &ArgMatches,
    _out: &mut dyn Write,
) -> Result<()> {
    let fields = rename_fields(client, args)?;
    let snapshot = find(&client.snapshots(), required(args, "snapshot")?).await?;
    let _ = client
        .snapshots()
        .update(&resource_id(&snapshot)?, fields)
        .await?;
    Ok(())
}

async fn do_snapshot_reset_state(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let state = value(args, "state").unwrap_or("available");
    let items = values(args, "snapshot");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.snapshots(), item).await {
            Ok(snapshot) => {
                client
                    .snapshots()
                    .reset_state(&resource_id(&snapshot)?, state)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "update the state of snapshot")
}

async fn do_snapshot_metadata(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let snapshot = find(&client.snapshots(), required(args, "snapshot")?).await?;
    let id = resource_id(&snapshot)?;
    let items = values(args, "metadata");
    if required(args, "action")? == "set" {
        let metadata = client
            .snapshots()
            .set_metadata(&id, parse_key_values(items))
            .await?;
        print_dict(out, &metadata)
    } else {
        let keys: Vec<String> = parse_key_values(items).keys().cloned().collect();
        client.snapshots().delete_metadata(&id, &keys).await
    }
}

#[cfg(test)]
pub mod test {
    use serde_json::json;

    use super::{attached_to, metadata_filter};
    use crate::common::Resource;

    #[test]
    fn test_attached_to() {
        let volume = Resource::from_value(json!({
            "attachments": [{"server_id": "s1"}, {"server_id": "s2"}, {}]
        }))
        .unwrap();
        assert_eq!(attached_to(&volume), "s1,s2");
        assert_eq!(attached_to(&Resource::default()), "");
    }

    #[test]
    fn test_metadata_filter() {
        assert_eq!(metadata_filter(&[]), None);
        assert_eq!(
            metadata_filter(&["a=b"]),
            Some(String::from("{\"a\":\"b\"}"))
        );
    }
}
