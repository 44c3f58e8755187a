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

//! Quota and limit commands.

use std::io::Write;

use clap::ArgMatches;
use serde_json::{json, Map, Value};

use super::descriptor::{parse, required, value, ArgSpec, CommandSpec};
use super::output::{print_dict, print_list};
use crate::common::{ApiVersion, Resource};
use crate::{Client, Error, Result};

/// Quota flags and the quota names they update.
const QUOTA_FLAGS: &[(&str, &str)] = &[
    ("volumes", "volumes"),
    ("snapshots", "snapshots"),
    ("gigabytes", "gigabytes"),
    ("backups", "backups"),
    ("backup-gigabytes", "backup_gigabytes"),
    ("groups", "groups"),
    ("per-volume-gigabytes", "per_volume_gigabytes"),
];

/// Quotas that can be set per volume type.
const TYPED_QUOTAS: &[&str] = &["volumes", "snapshots", "gigabytes"];

/// Arguments of quota updates after the leading positional.
macro_rules! quota_update_args {
    ($target:expr) => {
        &[
            $target,
            ArgSpec::option("volumes", "The new \"volumes\" quota value."),
            ArgSpec::option("snapshots", "The new \"snapshots\" quota value."),
            ArgSpec::option("gigabytes", "The new \"gigabytes\" quota value."),
            ArgSpec::option("backups", "The new \"backups\" quota value."),
            ArgSpec::option("backup-gigabytes", "The new \"backup_gigabytes\" quota value."),
            ArgSpec::option("groups", "The new \"groups\" quota value (API 3.13 or later)."),
            ArgSpec::option("per-volume-gigabytes", "Set max volume size limit."),
            ArgSpec::option("volume-type", "Volume type."),
        ]
    };
}

pub(super) static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "quota-show",
        about: "Lists quotas for a tenant.",
        args: &[ArgSpec::positional("tenant", "ID of tenant for which to list quotas.")],
        min_version: None,
        handler: handler!(do_quota_show),
    },
    CommandSpec {
        name: "quota-usage",
        about: "Lists quota usage for a tenant.",
        args: &[ArgSpec::positional("tenant", "ID of tenant for which to list quota usage.")],
        min_version: None,
        handler: handler!(do_quota_usage),
    },
    CommandSpec {
        name: "quota-defaults",
        about: "Lists default quotas for a tenant.",
        args: &[ArgSpec::positional("tenant", "ID of tenant for which to list quota defaults.")],
        min_version: None,
        handler: handler!(do_quota_defaults),
    },
    CommandSpec {
        name: "quota-update",
        about: "Updates quotas for a tenant.",
        args: quota_update_args!(ArgSpec::positional(
            "tenant",
            "ID of tenant for which to set quotas."
        )),
        min_version: None,
        handler: handler!(do_quota_update),
    },
    CommandSpec {
        name: "quota-delete",
        about: "Delete the quotas for a tenant.",
        args: &[ArgSpec::positional("tenant", "UUID of tenant to delete the quotas for.")],
        min_version: None,
        handler: handler!(do_quota_delete),
    },
    CommandSpec {
        name: "quota-class-show",
        about: "Lists quotas for a quota class.",
        args: &[ArgSpec::positional("class", "Name of quota class for which to list quotas.")],
        min_version: None,
        handler: handler!(do_quota_class_show),
    },
    CommandSpec {
        name: "quota-class-update",
        about: "Updates quotas for a quota class.",
        args: quota_update_args!(ArgSpec::positional(
            "class-name",
            "Name of quota class for which to set quotas."
        )),
        min_version: None,
        handler: handler!(do_quota_class_update),
    },
    CommandSpec {
        name: "absolute-limits",
        about: "Lists absolute limits for a user.",
        args: &[],
        min_version: None,
        handler: handler!(do_absolute_limits),
    },
    CommandSpec {
        name: "rate-limits",
        about: "Lists rate limits for a user.",
        args: &[],
        min_version: None,
        handler: handler!(do_rate_limits),
    },
];

/// Quota updates from command line flags.
fn quota_updates(client: &Client, args: &ArgMatches) -> Result<Map<String, Value>> {
    let volume_type = value(args, "volume-type");
    let mut updates = Map::new();
    for (flag, quota) in QUOTA_FLAGS {
        let Some(amount) = parse::<i64>(args, flag)? else {
            continue;
        };
        if *flag == "groups" {
            client.require(ApiVersion(3, 13), "The groups quota")?;
        }
        let key = match volume_type {
            Some(volume_type) if TYPED_QUOTAS.contains(quota) => {
                format!("{}_{}", quota, volume_type)
            }
            _ => String::from(*quota),
        };
        let _ = updates.insert(key, json!(amount));
    }
    if updates.is_empty() {
        return Err(Error::new_command_error(
            "Must supply at least one quota field to update.",
        ));
    }
    Ok(updates)
}

fn print_quotas(out: &mut dyn Write, quotas: &Resource) -> Result<()> {
    let mut info = quotas.info().clone();
    let _ = info.remove("id");
    print_dict(out, &info)
}

/// One row per quota with its limit, usage and reservation.
fn usage_rows(quotas: &Resource) -> Vec<Resource> {
    quotas
        .info()
        .iter()
        .filter_map(|(name, usage)| {
            let usage = usage.as_object()?;
            let mut row = Map::new();
            let _ = row.insert(String::from("type"), json!(name));
            for key in ["in_use", "reserved", "limit", "allocated"] {
                if let Some(item) = usage.get(key) {
                    let _ = row.insert(String::from(key), item.clone());
                }
            }
            Some(Resource::new(row))
        })
        .collect()
}

/// One row per rate limit of every URI.
fn rate_rows(limits: &Resource) -> Vec<Resource> {
    let mut rows = Vec::new();
    let rates = limits
        .get("rate")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for rate in rates {
        let uri = rate.get("uri").cloned().unwrap_or(Value::Null);
        let items = rate
            .get("limit")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for item in items {
            let mut row = Map::new();
            let _ = row.insert(String::from("verb"), item.get("verb").cloned().unwrap_or(Value::Null));
            let _ = row.insert(String::from("uri"), uri.clone());
            let _ = row.insert(String::from("value"), item.get("value").cloned().unwrap_or(Value::Null));
            let _ = row.insert(
                String::from("remain"),
                item.get("remaining").cloned().unwrap_or(Value::Null),
            );
            let _ = row.insert(String::from("unit"), item.get("unit").cloned().unwrap_or(Value::Null));
            let _ = row.insert(
                String::from("next_available"),
                item.get("next-available").cloned().unwrap_or(Value::Null),
            );
            rows.push(Resource::new(row));
        }
    }
    rows
}

async fn do_quota_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let quotas = client.quotas().get(required(args, "tenant")?, false).await?;
    print_quotas(out, &quotas)
}

async fn do_quota_usage(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let quotas = client.quotas().get(required(args, "tenant")?, true).await?;
    print_list(
        out,
        &usage_rows(&quotas),
        &["Type", "In_use", "Reserved", "Limit", "Allocated"],
        &[],
        Some(0),
    )
}

async fn do_quota_defaults(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let quotas = client.quotas().defaults(required(args, "tenant")?).await?;
    print_quotas(out, &quotas)
}

async fn do_quota_update(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let updates = quota_updates(client, args)?;
    let quotas = client
        .quotas()
        .update(required(args, "tenant")?, updates)
        .await?;
    print_quotas(out, &quotas)
}

async fn do_quota_delete(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    client.quotas().delete(required(args, "tenant")?).await
}

async fn do_quota_class_show(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let quotas = client.quota_classes().get(required(args, "class")?).await?;
    print_quotas(out, &quotas)
}

async fn do_quota_class_update(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let updates = quota_updates(client, args)?;
    let quotas = client
        .quota_classes()
        .update(required(args, "class-name")?, updates)
        .await?;
    print_quotas(out, &quotas)
}

async fn do_absolute_limits(
    client: &Client,
    _args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let limits = client.limits().get().await?;
    let rows: Vec<Resource> = limits
        .get("absolute")
        .and_then(Value::as_object)
        .map(|absolute| {
            absolute
                .iter()
                .map(|(name, item)| {
                    let mut row = Map::new();
                    let _ = row.insert(String::from("name"), json!(name));
                    let _ = row.insert(String::from("value"), item.clone());
                    Resource::new(row)
                })
                .collect()
        })
        .unwrap_or_default();
    print_list(out, &rows, &["Name", "Value"], &[], Some(0))
}

async fn do_rate_limits(client: &Client, _args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let limits = client.limits().get().await?;
    print_list(
        out,
        &rate_rows(&limits),
        &["Verb", "URI", "Value", "Remain", "Unit", "Next_Available"],
        &[],
        None,
    )
}

#[cfg(test)]
pub mod test {
    use serde_json::json;

    use super::{rate_rows, usage_rows};
    use crate::common::Resource;

    #[test]
    fn test_usage_rows() {
        let quotas = Resource::from_value(json!({
            "id": "p1",
            "volumes": {"in_use": 1, "reserved": 0, "limit": 10}
        }))
        .unwrap();
        let rows = usage_rows(&quotas);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("type"), Some("volumes"));
        assert_eq!(rows[0].get("limit"), Some(&json!(10)));
    }

    #[test]
    fn test_rate_rows() {
        let limits = Resource::from_value(json!({
            "rate": [{
                "uri": "*",
                "regex": ".*",
                "limit": [
                    {"verb": "POST", "value": 10, "remaining": 2, "unit": "MINUTE",
                     "next-available": "2011-12-15T22:42:45Z"},
                    {"verb": "PUT", "value": 10, "remaining": 2, "unit": "MINUTE"}
                ]
            }],
            "absolute": {}
        }))
        .unwrap();
        let rows = rate_rows(&limits);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_str("uri"), Some("*"));
        assert_eq!(rows[0].get_str("next_available"), Some("2011-12-15T22:42:45Z"));
        assert_eq!(rows[1].get("next_available"), Some(&serde_json::Value::Null));
    }
}
