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

//! Volume transfer commands.

use std::io::Write;

use clap::ArgMatches;

use super::descriptor::{flag, list_options, required, value, values, ArgSpec, CommandSpec};
use super::output::{print_dict, print_list, print_resource};
use super::{find, resource_id, summarize_failures};
use crate::common::ApiVersion;
use crate::{Client, Result};

pub(super) static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "transfer-list",
        about: "Lists all transfers.",
        args: &[
            ArgSpec::flag("all-tenants", "Shows details for all tenants. Admin only."),
            ArgSpec::option("marker", "Begin returning transfers that appear later in the list (API 3.59 or later)."),
            ArgSpec::option("limit", "Maximum number of transfers to return (API 3.59 or later)."),
            ArgSpec::option("sort", "Comma-separated list of sort keys and directions (API 3.59 or later)."),
        ],
        min_version: None,
        handler: handler!(do_transfer_list),
    },
    CommandSpec {
        name: "transfer-show",
        about: "Shows transfer details.",
        args: &[ArgSpec::positional("transfer", "Name or ID of transfer to show.")],
        min_version: None,
        handler: handler!(do_transfer_show),
    },
    CommandSpec {
        name: "transfer-create",
        about: "Creates a volume transfer.",
        args: &[
            ArgSpec::positional("volume", "Name or ID of volume to transfer."),
            ArgSpec::option("name", "Transfer name."),
            ArgSpec::flag("no-snapshots", "Allows transferring the volume without its snapshots (API 3.55 or later)."),
        ],
        min_version: None,
        handler: handler!(do_transfer_create),
    },
    CommandSpec {
        name: "transfer-accept",
        about: "Accepts a volume transfer.",
        args: &[
            ArgSpec::positional("transfer", "ID of transfer to accept."),
            ArgSpec::positional("auth-key", "Authentication key of transfer to accept."),
        ],
        min_version: None,
        handler: handler!(do_transfer_accept),
    },
    CommandSpec {
        name: "transfer-delete",
        about: "Undoes a transfer.",
        args: &[ArgSpec::positionals("transfer", "Name or ID of transfer or transfers to delete.")],
        min_version: None,
        handler: handler!(do_transfer_delete),
    },
];

async fn do_transfer_list(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let paginated = ["marker", "limit", "sort"]
        .iter()
        .any(|name| value(args, name).is_some());
    if paginated {
        client.require(ApiVersion(3, 59), "Pagination of transfers")?;
    }
    let options = list_options(args)?;
    let transfers = client.transfers().list(&options).await?;
    let sortby_index = if options.sort.is_some() { None } else { Some(0) };
    print_list(out, &transfers, &["ID", "Volume ID", "Name"], &[], sortby_index)
}

async fn do_transfer_show(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let transfer = find(&client.transfers(), required(args, "transfer")?).await?;
    print_resource(out, &transfer)
}

async fn do_transfer_create(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let no_snapshots = flag(args, "no-snapshots");
    if no_snapshots {
        client.require(ApiVersion(3, 55), "Transferring without snapshots")?;
    }
    let volume = find(&client.volumes(), required(args, "volume")?).await?;
    let mut transfer = client
        .transfers()
        .create(&resource_id(&volume)?, value(args, "name"), no_snapshots)
        .await?;
    let _ = transfer.remove("links");
    print_dict(out, transfer.info())
}

async fn do_transfer_accept(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let mut transfer = client
        .transfers()
        .accept(required(args, "transfer")?, required(args, "auth-key")?)
        .await?;
    let _ = transfer.remove("links");
    print_dict(out, transfer.info())
}

async fn do_transfer_delete(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let items = values(args, "transfer");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.transfers(), item).await {
            Ok(transfer) => client.transfers().delete(&resource_id(&transfer)?).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((item.to_string(), e));
        }
    }
    summarize_failures(out, items.len(), failures, "delete transfer")
}
