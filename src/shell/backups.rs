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

//! Backup commands.

use std::io::Write;

use clap::ArgMatches;
use serde_json::{json, Map};

use super::descriptor::{flag, list_options, required, value, values, ArgSpec, CommandSpec};
use super::output::{print_dict, print_list, print_resource};
use super::{find, resource_id, summarize_failures};
use crate::block_storage::BackupCreate;
use crate::common::ApiVersion;
use crate::utils::parse_key_values;
use crate::{Client, Error, Result};

pub(super) static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "backup-list",
        about: "Lists all backups.",
        args: &[
            ArgSpec::flag("all-tenants", "Shows details for all tenants. Admin only."),
            ArgSpec::option("name", "Filters results by a name."),
            ArgSpec::option("status", "Filters results by a status."),
            ArgSpec::option("volume-id", "Filters results by a volume ID."),
            ArgSpec::option("marker", "Begin returning backups that appear later in the list."),
            ArgSpec::option("limit", "Maximum number of backups to return."),
            ArgSpec::option("sort", "Comma-separated list of sort keys and directions."),
        ],
        min_version: None,
        handler: handler!(do_backup_list),
    },
    CommandSpec {
        name: "backup-show",
        about: "Shows backup details.",
        args: &[ArgSpec::positional("backup", "Name or ID of backup.")],
        min_version: None,
        handler: handler!(do_backup_show),
    },
    CommandSpec {
        name: "backup-create",
        about: "Creates a volume backup.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume to backup."),
            ArgSpec::option("container", "Backup container name."),
            ArgSpec::option("name", "Backup name."),
            ArgSpec::option("description", "Backup description."),
            ArgSpec::flag("incremental", "Incremental backup."),
            ArgSpec::flag("force", "Allows a volume that is in-use to be backed up."),
            ArgSpec::option("snapshot-id", "ID of snapshot to backup."),
            ArgSpec::repeated("metadata", "Metadata key and value pairs (API 3.43 or later)."),
            ArgSpec::option("availability-zone", "AZ where the backup should be stored (API 3.43 or later)."),
        ],
        min_version: None,
        handler: handler!(do_backup_create),
    },
    CommandSpec {
        name: "backup-delete",
        about: "Removes one or more backups.",
        args: &[
            ArgSpec::flag("force", "Allows deleting backup of a volume when its status is other than available or error."),
            ArgSpec::positionals("backup", "Name or ID of backup(s) to delete."),
        ],
        min_version: None,
        handler: handler!(do_backup_delete),
    },
    CommandSpec {
        name: "backup-restore",
        about: "Restores a backup.",
        args: &[
            ArgSpec::positional("backup", "Name or ID of backup to restore."),
            ArgSpec::option("volume", "Name or ID of existing volume to which to restore."),
            ArgSpec::option("name", "Name of the new volume to restore to."),
        ],
        min_version: None,
        handler: handler!(do_backup_restore),
    },
    CommandSpec {
        name: "backup-reset-state",
        about: "Explicitly updates the backup state.",
        args: &[
            ArgSpec::positionals("backup", "Name or ID of the backup to modify."),
            ArgSpec::option("state", "The state to assign to the backup.").default_value("available"),
        ],
        min_version: None,
        handler: handler!(do_backup_reset_state),
    },
    CommandSpec {
        name: "backup-update",
        about: "Updates a backup.",
        args: &[
            ArgSpec::positional("backup", "Name or ID of backup to update."),
            ArgSpec::option("name", "New name for backup."),
            ArgSpec::option("description", "Backup description."),
        ],
        min_version: Some(ApiVersion(3, 9)),
        handler: handler!(do_backup_update),
    },
    CommandSpec {
        name: "backup-export",
        about: "Export backup metadata record.",
        args: &[ArgSpec::positional("backup", "ID of the backup to export.")],
        min_version: None,
        handler: handler!(do_backup_export),
    },
    CommandSpec {
        name: "backup-import",
        about: "Import backup metadata record.",
        args: &[
            ArgSpec::positional("backup-service", "Backup service to use for importing the backup."),
            ArgSpec::positional("backup-url", "Backup URL for importing the backup metadata."),
        ],
        min_version: None,
        handler: handler!(do_backup_import),
    },
];

async fn do_backup_list(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let options = list_options(args)?
        .with_optional_filter("name", value(args, "name"))
        .with_optional_filter("status", value(args, "status"))
        .with_optional_filter("volume_id", value(args, "volume-id"));
    let backups = client.backups().list(&options).await?;
    let sortby_index = if options.sort.is_some() { None } else { Some(0) };
    print_list(
        out,
        &backups,
        &["ID", "Volume ID", "Status", "Name", "Size", "Object Count", "Container"],
        &[],
        sortby_index,
    )
}

async fn do_backup_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let backup = find(&client.backups(), required(args, "backup")?).await?;
    print_resource(out, &backup)
}

async fn do_backup_create(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    let request = BackupCreate {
        volume_id: resource_id(&volume)?,
        container: value(args, "container").map(String::from),
        name: value(args, "name").map(String::from),
        description: value(args, "description").map(String::from),
        incremental: flag(args, "incremental"),
        force: flag(args, "force"),
        snapshot_id: value(args, "snapshot-id").map(String::from),
        availability_zone: value(args, "availability-zone").map(String::from),
        metadata: parse_key_values(values(args, "metadata")),
    };
    let mut backup = client.backups().create(&request).await?;
    let _ = backup.remove("links");
    print_dict(out, backup.info())
}

async fn do_backup_delete(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let force = flag(args, "force");
    let items = values(args, "backup");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.backups(), item).await {
            Ok(backup) => client.backups().delete(&resource_id(&backup)?, force).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => writeln!(out, "Request to delete backup {} has been accepted.", item)?,
            Err(e) => failures.push((item.to_string(), e)),
        }
    }
    summarize_failures(out, items.len(), failures, "delete backup")
}

async fn do_backup_restore(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let volume_id = match value(args, "volume") {
        Some(volume) => Some(resource_id(&find(&client.volumes(), volume).await?)?),
        None => None,
    };
    let name = value(args, "name");
    if volume_id.is_some() && name.is_some() {
        return Err(Error::new_command_error(
            "Cannot specify both a volume and a name for the new volume.",
        ));
    }
    let backup = find(&client.backups(), required(args, "backup")?).await?;
    let restore = client
        .backups()
        .restore(&resource_id(&backup)?, volume_id.as_deref(), name)
        .await?;
    print_dict(out, restore.info())
}

async fn do_backup_reset_state(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let state = value(args, "state").unwrap_or("available");
    let items = values(args, "backup");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.backups(), item).await {
            Ok(backup) => {
                client
                    .backups()
                    .reset_state(&resource_id(&backup)?, state)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "update the state of backup")
}

async fn do_backup_update(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let mut fields = Map::new();
    if let Some(name) = value(args, "name") {
        let _ = fields.insert(String::from("name"), json!(name));
    }
    if let Some(description) = value(args, "description") {
        let _ = fields.insert(String::from("description"), json!(description));
    }
    if fields.is_empty() {
        return Err(Error::new_command_error(
            "Must supply either name or description to update.",
        ));
    }
    let backup = find(&client.backups(), required(args, "backup")?).await?;
    let id = resource_id(&backup)?;
    let _ = client.backups().update(&id, fields).await?;
    writeln!(out, "Request to update backup '{}' has been accepted.", id)?;
    Ok(())
}

async fn do_backup_export(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let record = client
        .backups()
        .export_record(required(args, "backup")?)
        .await?;
    print_dict(out, record.info())
}

async fn do_backup_import(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let mut backup = client
        .backups()
        .import_record(required(args, "backup-service")?, required(args, "backup-url")?)
        .await?;
    let _ = backup.remove("links");
    print_dict(out, backup.info())
}
