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

//! Generic volume group commands.

use std::io::Write;

use clap::ArgMatches;

use super::descriptor::{flag, list_options, required, value, values, ArgSpec, CommandSpec};
use super::output::{print_dict, print_list, print_resource};
use super::{find, resource_id, summarize_failures};
use crate::block_storage::{GroupCreate, GroupFromSource, GroupUpdate};
use crate::common::ApiVersion;
use crate::{Client, Error, Result};

pub(super) static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "group-list",
        about: "Lists all groups.",
        args: &[
            ArgSpec::flag("all-tenants", "Shows details for all tenants. Admin only."),
            ArgSpec::option("marker", "Begin returning groups that appear later in the list."),
            ArgSpec::option("limit", "Maximum number of groups to return."),
            ArgSpec::option("sort", "Comma-separated list of sort keys and directions."),
        ],
        min_version: Some(ApiVersion(3, 13)),
        handler: handler!(do_group_list),
    },
    CommandSpec {
        name: "group-show",
        about: "Shows details of a group.",
        args: &[ArgSpec::positional("group", "Name or ID of a group.")],
        min_version: Some(ApiVersion(3, 13)),
        handler: handler!(do_group_show),
    },
    CommandSpec {
        name: "group-create",
        about: "Creates a group.",
        args: &[
            ArgSpec::positional("grouptype", "Group type."),
            ArgSpec::positional("volume-types", "Comma-separated list of volume types."),
            ArgSpec::option("name", "Name of a group."),
            ArgSpec::option("description", "Description of a group."),
            ArgSpec::option("availability-zone", "Availability zone for group."),
        ],
        min_version: Some(ApiVersion(3, 13)),
        handler: handler!(do_group_create),
    },
    CommandSpec {
        name: "group-create-from-src",
        about: "Creates a group from a group snapshot or a source group.",
        args: &[
            ArgSpec::option("group-snapshot", "Name or ID of a group snapshot."),
            ArgSpec::option("source-group", "Name or ID of a source group."),
            ArgSpec::option("name", "Name of a group."),
            ArgSpec::option("description", "Description of a group."),
        ],
        min_version: Some(ApiVersion(3, 14)),
        handler: handler!(do_group_create_from_src),
    },
    CommandSpec {
        name: "group-update",
        about: "Updates a group.",
        args: &[
            ArgSpec::positional("group", "Name or ID of a group."),
            ArgSpec::option("name", "New name for group."),
            ArgSpec::option("description", "New description for group."),
            ArgSpec::option("add-volumes", "UUID of one or more volumes to be added to the group, separated by commas."),
            ArgSpec::option("remove-volumes", "UUID of one or more volumes to be removed from the group, separated by commas."),
        ],
        min_version: Some(ApiVersion(3, 13)),
        handler: handler!(do_group_update),
    },
    CommandSpec {
        name: "group-delete",
        about: "Removes one or more groups.",
        args: &[
            ArgSpec::positionals("group", "Name or ID of one or more groups to be deleted."),
            ArgSpec::flag("delete-volumes", "Allows or disallows groups to be deleted if they are not empty."),
        ],
        min_version: Some(ApiVersion(3, 13)),
        handler: handler!(do_group_delete),
    },
    CommandSpec {
        name: "group-snapshot-list",
        about: "Lists all group snapshots.",
        args: &[
            ArgSpec::flag("all-tenants", "Shows details for all tenants. Admin only."),
            ArgSpec::option("status", "Filters results by a status."),
            ArgSpec::option("group-id", "Filters results by a group ID."),
        ],
        min_version: Some(ApiVersion(3, 14)),
        handler: handler!(do_group_snapshot_list),
    },
    CommandSpec {
        name: "group-snapshot-show",
        about: "Shows group snapshot details.",
        args: &[ArgSpec::positional("group-snapshot", "Name or ID of group snapshot.")],
        min_version: Some(ApiVersion(3, 14)),
        handler: handler!(do_group_snapshot_show),
    },
    CommandSpec {
        name: "group-snapshot-create",
        about: "Creates a group snapshot.",
        args: &[
            ArgSpec::positional("group", "Name or ID of a group."),
            ArgSpec::option("name", "Group snapshot name."),
            ArgSpec::option("description", "Group snapshot description."),
        ],
        min_version: Some(ApiVersion(3, 14)),
        handler: handler!(do_group_snapshot_create),
    },
    CommandSpec {
        name: "group-snapshot-delete",
        about: "Removes one or more group snapshots.",
        args: &[ArgSpec::positionals("group-snapshot", "Name or ID of one or more group snapshots to be deleted.")],
        min_version: Some(ApiVersion(3, 14)),
        handler: handler!(do_group_snapshot_delete),
    },
];

/// Split a comma-separated list, dropping empty items.
fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

async fn do_group_list(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let options = list_options(args)?;
    let groups = client.groups().list(&options).await?;
    let sortby_index = if options.sort.is_some() { None } else { Some(0) };
    print_list(out, &groups, &["ID", "Status", "Name"], &[], sortby_index)
}

async fn do_group_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let group = find(&client.groups(), required(args, "group")?).await?;
    print_resource(out, &group)
}

async fn do_group_create(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let request = GroupCreate {
        group_type: required(args, "grouptype")?.to_string(),
        volume_types: split_list(required(args, "volume-types")?),
        name: value(args, "name").map(String::from),
        description: value(args, "description").map(String::from),
        availability_zone: value(args, "availability-zone").map(String::from),
    };
    let group = client.groups().create(&request).await?;
    let mut info = group.info().clone();
    let _ = info.remove("links");
    print_dict(out, &info)
}

async fn do_group_create_from_src(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let group_snapshot_id = match value(args, "group-snapshot") {
        Some(snapshot) => Some(resource_id(&find(&client.group_snapshots(), snapshot).await?)?),
        None => None,
    };
    let source_group_id = match value(args, "source-group") {
        Some(group) => Some(resource_id(&find(&client.groups(), group).await?)?),
        None => None,
    };
    if group_snapshot_id.is_none() == source_group_id.is_none() {
        return Err(Error::new_command_error(
            "Must supply exactly one of group snapshot or source group.",
        ));
    }
    let request = GroupFromSource {
        group_snapshot_id,
        source_group_id,
        name: value(args, "name").map(String::from),
        description: value(args, "description").map(String::from),
    };
    let group = client.groups().create_from_src(&request).await?;
    let mut info = group.info().clone();
    let _ = info.remove("links");
    print_dict(out, &info)
}

async fn do_group_update(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    let request = GroupUpdate {
        name: value(args, "name").map(String::from),
        description: value(args, "description").map(String::from),
        add_volumes: value(args, "add-volumes").map(String::from),
        remove_volumes: value(args, "remove-volumes").map(String::from),
    };
    if request.is_empty() {
        return Err(Error::new_command_error(
            "At least one of name, description, add-volumes or remove-volumes must be specified.",
        ));
    }
    let group = find(&client.groups(), required(args, "group")?).await?;
    client.groups().update(&resource_id(&group)?, &request).await
}

async fn do_group_delete(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let delete_volumes = flag(args, "delete-volumes");
    let items = values(args, "group");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.groups(), item).await {
            Ok(group) => {
                client
                    .groups()
                    .delete(&resource_id(&group)?, delete_volumes)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "delete group")
}

async fn do_group_snapshot_list(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let options = list_options(args)?
        .with_optional_filter("status", value(args, "status"))
        .with_optional_filter("group_id", value(args, "group-id"));
    let snapshots = client.group_snapshots().list(&options).await?;
    print_list(out, &snapshots, &["ID", "Status", "Name"], &[], Some(0))
}

async fn do_group_snapshot_show(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let snapshot = find(&client.group_snapshots(), required(args, "group-snapshot")?).await?;
    print_resource(out, &snapshot)
}

async fn do_group_snapshot_create(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let group = find(&client.groups(), required(args, "group")?).await?;
    let snapshot = client
        .group_snapshots()
        .create(
            &resource_id(&group)?,
            value(args, "name"),
            value(args, "description"),
        )
        .await?;
    let mut info = snapshot.info().clone();
    let _ = info.remove("links");
    print_dict(out, &info)
}

async fn do_group_snapshot_delete(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let items = values(args, "group-snapshot");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.group_snapshots(), item).await {
            Ok(snapshot) => client.group_snapshots().delete(&resource_id(&snapshot)?).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "delete group snapshot")
}

#[cfg(test)]
pub mod test {
    use super::split_list;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("lvm, ceph,,"), vec!["lvm", "ceph"]);
        assert!(split_list("").is_empty());
    }
}
