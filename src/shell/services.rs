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

//! Service, cluster, message, attachment and discovery commands.

use std::io::Write;

use clap::ArgMatches;
use serde_json::{json, Map, Value};

use super::descriptor::{
    flag, list_options, parse_bool, required, value, values, ArgSpec, CommandSpec,
};
use super::output::{print_dict, print_list, print_resource, Formatter};
use super::{find, resource_id, summarize_failures};
use crate::block_storage::AttachmentCreate;
use crate::common::{ApiVersion, ListOptions, Resource};
use crate::{Client, Result};

const DEFAULT_BINARY: &str = "cinder-volume";

pub(super) static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "service-list",
        about: "Lists all services. Filter by host and service binary.",
        args: &[
            ArgSpec::option("host", "Host name."),
            ArgSpec::option("binary", "Service binary."),
            ArgSpec::flag("withreplication", "Enables or disables display of Replication info for c-vol services."),
        ],
        min_version: None,
        handler: handler!(do_service_list),
    },
    CommandSpec {
        name: "service-enable",
        about: "Enables the service.",
        args: &[
            ArgSpec::positional("host", "Host name."),
            ArgSpec::positional("binary", "Service binary."),
        ],
        min_version: None,
        handler: handler!(do_service_enable),
    },
    CommandSpec {
        name: "service-disable",
        about: "Disables the service.",
        args: &[
            ArgSpec::positional("host", "Host name."),
            ArgSpec::positional("binary", "Service binary."),
            ArgSpec::option("reason", "Reason for disabling service."),
        ],
        min_version: None,
        handler: handler!(do_service_disable),
    },
    CommandSpec {
        name: "cluster-list",
        about: "Lists clustered services with optional filtering.",
        args: &[
            ArgSpec::option("name", "Filter by cluster name, without backend."),
            ArgSpec::option("binary", "Cluster binary."),
            ArgSpec::option("is-up", "Filter by up/down status."),
            ArgSpec::option("disabled", "Filter by disabled status."),
            ArgSpec::option("num-hosts", "Filter by number of hosts in the cluster."),
            ArgSpec::option("num-down-hosts", "Filter by number of hosts that are down."),
            ArgSpec::flag("detailed", "Get detailed clustered service information."),
        ],
        min_version: Some(ApiVersion(3, 7)),
        handler: handler!(do_cluster_list),
    },
    CommandSpec {
        name: "cluster-show",
        about: "Show detailed information on a clustered service.",
        args: &[
            ArgSpec::positional("name", "Name of the clustered service to show."),
            ArgSpec::option("binary", "Binary to filter by.").default_value(DEFAULT_BINARY),
        ],
        min_version: Some(ApiVersion(3, 7)),
        handler: handler!(do_cluster_show),
    },
    CommandSpec {
        name: "cluster-enable",
        about: "Enables clustered services.",
        args: &[
            ArgSpec::positional("name", "Name of the clustered services to update."),
            ArgSpec::option("binary", "Binary to filter by.").default_value(DEFAULT_BINARY),
        ],
        min_version: Some(ApiVersion(3, 7)),
        handler: handler!(do_cluster_enable),
    },
    CommandSpec {
        name: "cluster-disable",
        about: "Disables clustered services.",
        args: &[
            ArgSpec::positional("name", "Name of the clustered services to update."),
            ArgSpec::option("binary", "Binary to filter by.").default_value(DEFAULT_BINARY),
            ArgSpec::option("reason", "Reason for disabling clustered service."),
        ],
        min_version: Some(ApiVersion(3, 7)),
        handler: handler!(do_cluster_disable),
    },
    CommandSpec {
        name: "availability-zone-list",
        about: "Lists all availability zones.",
        args: &[],
        min_version: None,
        handler: handler!(do_availability_zone_list),
    },
    CommandSpec {
        name: "get-capabilities",
        about: "Show backend volume stats and properties. Admin only.",
        args: &[ArgSpec::positional("host", "Cinder host to show backend volume stats and properties; takes the form: host@backend-name.")],
        min_version: None,
        handler: handler!(do_get_capabilities),
    },
    CommandSpec {
        name: "api-version",
        about: "Display the server API version information.",
        args: &[],
        min_version: Some(ApiVersion(3, 0)),
        handler: handler!(do_api_version),
    },
    CommandSpec {
        name: "message-list",
        about: "Lists all messages.",
        args: &[
            ArgSpec::option("marker", "Begin returning messages that appear later in the list (API 3.5 or later)."),
            ArgSpec::option("limit", "Maximum number of messages to return (API 3.5 or later)."),
            ArgSpec::option("sort", "Comma-separated list of sort keys and directions (API 3.5 or later)."),
            ArgSpec::option("resource-uuid", "Filters results by a resource uuid."),
            ArgSpec::option("resource-type", "Filters results by a resource type."),
            ArgSpec::option("event-id", "Filters results by event id."),
            ArgSpec::option("request-id", "Filters results by request id."),
            ArgSpec::option("level", "Filters results by the message level."),
        ],
        min_version: Some(ApiVersion(3, 3)),
        handler: handler!(do_message_list),
    },
    CommandSpec {
        name: "message-show",
        about: "Shows message details.",
        args: &[ArgSpec::positional("message", "ID of message.")],
        min_version: Some(ApiVersion(3, 3)),
        handler: handler!(do_message_show),
    },
    CommandSpec {
        name: "message-delete",
        about: "Removes one or more messages.",
        args: &[ArgSpec::positionals("message", "ID of one or more messages to delete.")],
        min_version: Some(ApiVersion(3, 3)),
        handler: handler!(do_message_delete),
    },
    CommandSpec {
        name: "attachment-list",
        about: "Lists all attachments.",
        args: &[
            ArgSpec::flag("all-tenants", "Shows details for all tenants. Admin only."),
            ArgSpec::option("volume-id", "Filters results by a volume ID."),
            ArgSpec::option("status", "Filters results by a status."),
            ArgSpec::option("marker", "Begin returning attachments that appear later in the list."),
            ArgSpec::option("limit", "Maximum number of attachments to return."),
            ArgSpec::option("sort", "Comma-separated list of sort keys and directions."),
        ],
        min_version: Some(ApiVersion(3, 27)),
        handler: handler!(do_attachment_list),
    },
    CommandSpec {
        name: "attachment-show",
        about: "Show detailed information for attachment.",
        args: &[ArgSpec::positional("attachment", "ID of attachment.")],
        min_version: Some(ApiVersion(3, 27)),
        handler: handler!(do_attachment_show),
    },
    CommandSpec {
        name: "attachment-create",
        about: "Create an attachment for a cinder volume.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume or volumes to attach."),
            ArgSpec::positional("server-id", "ID of server attaching to.").optional(),
            ArgSpec::option("initiator", "iqn of the initiator attaching to."),
            ArgSpec::option("ip", "ip of the system attaching to."),
            ArgSpec::option("host", "Name of the host attaching to."),
            ArgSpec::option("platform", "Platform type."),
            ArgSpec::option("ostype", "OS type."),
            ArgSpec::option("multipath", "Use multipath."),
            ArgSpec::option("mountpoint", "Mountpoint volume will be attached at."),
            ArgSpec::option("mode", "Mode of attachment, rw, ro (API 3.54 or later).")
                .choices(&["rw", "ro"]),
        ],
        min_version: Some(ApiVersion(3, 27)),
        handler: handler!(do_attachment_create),
    },
    CommandSpec {
        name: "attachment-delete",
        about: "Delete an attachment for a cinder volume.",
        args: &[ArgSpec::positionals("attachment", "ID of attachment or attachments to delete.")],
        min_version: Some(ApiVersion(3, 27)),
        handler: handler!(do_attachment_delete),
    },
];

fn zone_name(zone: &Resource) -> String {
    zone.get_str("zoneName").unwrap_or("-").to_string()
}

fn zone_status(zone: &Resource) -> String {
    let available = zone
        .get("zoneState")
        .and_then(|state| state.get("available"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    String::from(if available { "available" } else { "not available" })
}

async fn do_service_list(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let services = client
        .services()
        .list(value(args, "host"), value(args, "binary"))
        .await?;
    let mut fields = vec!["Binary", "Host", "Zone", "Status", "State", "Updated_at"];
    if client.supports(ApiVersion(3, 7)) {
        fields.push("Cluster");
    }
    if flag(args, "withreplication") {
        fields.extend(["Replication Status", "Active Backend ID", "Frozen"]);
    }
    if services
        .first()
        .map(|service| service.get("disabled_reason").is_some())
        .unwrap_or(false)
    {
        fields.push("Disabled Reason");
    }
    print_list(out, &services, &fields, &[], Some(0))
}

async fn do_service_enable(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let result = client
        .services()
        .enable(required(args, "host")?, required(args, "binary")?)
        .await?;
    print_list(out, &[result], &["Host", "Binary", "Status"], &[], None)
}

async fn do_service_disable(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let reason = value(args, "reason");
    let result = client
        .services()
        .disable(required(args, "host")?, required(args, "binary")?, reason)
        .await?;
    let fields: &[&str] = if reason.is_some() {
        &["Host", "Binary", "Status", "Disabled Reason"]
    } else {
        &["Host", "Binary", "Status"]
    };
    print_list(out, &[result], fields, &[], None)
}

async fn do_cluster_list(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let detailed = flag(args, "detailed");
    let mut options = ListOptions::new()
        .with_optional_filter("name", value(args, "name"))
        .with_optional_filter("binary", value(args, "binary"))
        .with_optional_filter("is_up", parse_bool(args, "is-up")?)
        .with_optional_filter("disabled", parse_bool(args, "disabled")?)
        .with_optional_filter("num_hosts", value(args, "num-hosts"))
        .with_optional_filter("num_down_hosts", value(args, "num-down-hosts"));
    if !detailed {
        options = options.summary();
    }
    let clusters = client.clusters().list(&options).await?;
    let mut fields = vec!["Name", "Binary", "State", "Status"];
    if detailed {
        fields.extend([
            "Num Hosts",
            "Num Down Hosts",
            "Last Heartbeat",
            "Disabled Reason",
            "Created At",
            "Updated at",
        ]);
    }
    print_list(out, &clusters, &fields, &[], Some(0))
}

async fn do_cluster_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let cluster = client
        .clusters()
        .get(
            required(args, "name")?,
            value(args, "binary").unwrap_or(DEFAULT_BINARY),
        )
        .await?;
    print_resource(out, &cluster)
}

async fn do_cluster_enable(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let cluster = client
        .clusters()
        .enable(
            required(args, "name")?,
            value(args, "binary").unwrap_or(DEFAULT_BINARY),
        )
        .await?;
    print_resource(out, &cluster)
}

async fn do_cluster_disable(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let cluster = client
        .clusters()
        .disable(
            required(args, "name")?,
            value(args, "binary").unwrap_or(DEFAULT_BINARY),
            value(args, "reason"),
        )
        .await?;
    print_resource(out, &cluster)
}

async fn do_availability_zone_list(
    client: &Client,
    _args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let zones = client.availability_zones().list(false).await?;
    let formatters: &[(&str, Formatter)] = &[("Name", zone_name), ("Status", zone_status)];
    print_list(out, &zones, &["Name", "Status"], formatters, Some(0))
}

async fn do_get_capabilities(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let capabilities = client.capabilities().get(required(args, "host")?).await?;
    let mut info = capabilities.info().clone();
    let properties = info.remove("properties");
    print_dict(out, &info)?;
    if let Some(Value::Object(properties)) = properties {
        for (name, property) in properties {
            writeln!(out, "{}", name)?;
            if let Value::Object(details) = property {
                print_dict(out, &details)?;
            }
        }
    }
    Ok(())
}

async fn do_api_version(client: &Client, _args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let versions = client.server_versions().await?;
    print_list(
        out,
        &versions,
        &["ID", "Status", "Version", "Min_version"],
        &[],
        Some(0),
    )
}

async fn do_message_list(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let paginated = ["marker", "limit", "sort"]
        .iter()
        .any(|name| value(args, name).is_some());
    if paginated {
        client.require(ApiVersion(3, 5), "Pagination of messages")?;
    }
    let options = list_options(args)?
        .with_optional_filter("resource_uuid", value(args, "resource-uuid"))
        .with_optional_filter("resource_type", value(args, "resource-type"))
        .with_optional_filter("event_id", value(args, "event-id"))
        .with_optional_filter("request_id", value(args, "request-id"))
        .with_optional_filter("message_level", value(args, "level"));
    let messages = client.messages().list(&options).await?;
    let sortby_index = if options.sort.is_some() { None } else { Some(0) };
    print_list(
        out,
        &messages,
        &["ID", "Resource Type", "Resource UUID", "Event ID", "User Message"],
        &[],
        sortby_index,
    )
}

async fn do_message_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let message = client.messages().get(required(args, "message")?).await?;
    print_resource(out, &message)
}

async fn do_message_delete(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let items = values(args, "message");
    let mut failures = Vec::new();
    for item in &items {
        if let Err(e) = client.messages().delete(item).await {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "delete message")
}

async fn do_attachment_list(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let options = list_options(args)?
        .with_optional_filter("volume_id", value(args, "volume-id"))
        .with_optional_filter("status", value(args, "status"));
    let attachments = client.attachments().list(&options).await?;
    let sortby_index = if options.sort.is_some() { None } else { Some(0) };
    print_list(
        out,
        &attachments,
        &["ID", "Volume ID", "Status", "Instance"],
        &[],
        sortby_index,
    )
}

async fn do_attachment_show(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let attachment = client
        .attachments()
        .get(required(args, "attachment")?)
        .await?;
    print_resource(out, &attachment)
}

/// Connector from the connection flags, if any of them was given.
fn connector(args: &ArgMatches) -> Result<Option<Map<String, Value>>> {
    let mut connector = Map::new();
    for (name, key) in [
        ("initiator", "initiator"),
        ("ip", "ip"),
        ("host", "host"),
        ("platform", "platform"),
        ("ostype", "os_type"),
        ("mountpoint", "mountpoint"),
    ] {
        if let Some(item) = value(args, name) {
            let _ = connector.insert(String::from(key), json!(item));
        }
    }
    if let Some(multipath) = parse_bool(args, "multipath")? {
        let _ = connector.insert(String::from("multipath"), json!(multipath));
    }
    Ok(if connector.is_empty() {
        None
    } else {
        Some(connector)
    })
}

async fn do_attachment_create(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let mode = value(args, "mode");
    if mode.is_some() {
        client.require(ApiVersion(3, 54), "Attachment mode")?;
    }
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    let request = AttachmentCreate {
        volume_uuid: resource_id(&volume)?,
        instance_uuid: value(args, "server-id").map(String::from),
        connector: connector(args)?,
        mode: mode.map(String::from),
    };
    let mut attachment = client.attachments().create(&request).await?;
    let connection_info = attachment.remove("connection_info");
    print_resource(out, &attachment)?;
    if let Some(Value::Object(connection_info)) = connection_info {
        print_dict(out, &connection_info)?;
    }
    Ok(())
}

async fn do_attachment_delete(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let items = values(args, "attachment");
    let mut failures = Vec::new();
    for item in &items {
        if let Err(e) = client.attachments().delete(item).await {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "delete attachment")
}

#[cfg(test)]
pub mod test {
    use serde_json::json;

    use super::{zone_name, zone_status};
    use crate::common::Resource;

    #[test]
    fn test_zone_formatters() {
        let zone = Resource::from_value(json!({
            "zoneName": "nova",
            "zoneState": {"available": true}
        }))
        .unwrap();
        assert_eq!(zone_name(&zone), "nova");
        assert_eq!(zone_status(&zone), "available");
        assert_eq!(zone_status(&Resource::default()), "not available");
    }
}
