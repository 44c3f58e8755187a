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

//! Volume type, default type and QoS commands.

use std::io::Write;

use clap::ArgMatches;

use super::descriptor::{flag, parse_bool, required, value, values, ArgSpec, CommandSpec};
use super::output::{format_value, print_dict, print_list, print_resource, Formatter};
use super::{find, resource_id, summarize_failures};
use crate::common::{ApiVersion, Resource};
use crate::utils::parse_key_values;
use crate::{Client, Error, Result};

const KEY_ACTIONS: &[&str] = &["set", "unset"];

const TYPE_KEYS: &[(&str, &str)] = &[("os-volume-type-access:is_public", "is_public")];

pub(super) static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "type-list",
        about: "Lists available 'volume types'.",
        args: &[ArgSpec::flag(
            "all",
            "Lists private volume types as well. Admin only.",
        )],
        min_version: None,
        handler: handler!(do_type_list),
    },
    CommandSpec {
        name: "type-show",
        about: "Show volume type details.",
        args: &[ArgSpec::positional("volume-type", "Name or ID of the volume type.")],
        min_version: None,
        handler: handler!(do_type_show),
    },
    CommandSpec {
        name: "type-create",
        about: "Creates a volume type.",
        args: &[
            ArgSpec::positional("name", "Name of new volume type."),
            ArgSpec::option("description", "Description of new volume type."),
            ArgSpec::option("is-public", "Make type accessible to the public (default true).")
                .default_value("true"),
        ],
        min_version: None,
        handler: handler!(do_type_create),
    },
    CommandSpec {
        name: "type-update",
        about: "Updates volume type name, description, and/or is_public.",
        args: &[
            ArgSpec::positional("id", "ID of the volume type."),
            ArgSpec::option("name", "Name of the volume type."),
            ArgSpec::option("description", "Description of the volume type."),
            ArgSpec::option("is-public", "Make type accessible to the public or not."),
        ],
        min_version: None,
        handler: handler!(do_type_update),
    },
    CommandSpec {
        name: "type-delete",
        about: "Deletes volume type or types.",
        args: &[ArgSpec::positionals("volume-type", "Name or ID of volume type or types to delete.")],
        min_version: None,
        handler: handler!(do_type_delete),
    },
    CommandSpec {
        name: "type-default",
        about: "List the default volume type.",
        args: &[],
        min_version: None,
        handler: handler!(do_type_default),
    },
    CommandSpec {
        name: "type-key",
        about: "Sets or unsets extra_spec for a volume type.",
        args: &[
            ArgSpec::positional("vtype", "Name or ID of volume type."),
            ArgSpec::positional("action", "The action.").choices(KEY_ACTIONS),
            ArgSpec::positionals("metadata", "The extra specs key and value pair to set or unset."),
        ],
        min_version: None,
        handler: handler!(do_type_key),
    },
    CommandSpec {
        name: "extra-specs-list",
        about: "Lists current volume types and extra specs.",
        args: &[],
        min_version: None,
        handler: handler!(do_extra_specs_list),
    },
    CommandSpec {
        name: "default-type-list",
        about: "Lists all default volume types.",
        args: &[ArgSpec::option("project-id", "ID of project for which to show the default type.")],
        min_version: Some(ApiVersion(3, 62)),
        handler: handler!(do_default_type_list),
    },
    CommandSpec {
        name: "default-type-set",
        about: "Sets a default volume type for a project.",
        args: &[
            ArgSpec::positional("volume-type", "The name or ID of the volume type."),
            ArgSpec::positional("project", "ID of project for which to set default type."),
        ],
        min_version: Some(ApiVersion(3, 62)),
        handler: handler!(do_default_type_set),
    },
    CommandSpec {
        name: "default-type-unset",
        about: "Unset default volume types.",
        args: &[ArgSpec::positionals("project-id", "ID of project for which to unset default type.")],
        min_version: Some(ApiVersion(3, 62)),
        handler: handler!(do_default_type_unset),
    },
    CommandSpec {
        name: "qos-list",
        about: "Lists qos specs.",
        args: &[],
        min_version: None,
        handler: handler!(do_qos_list),
    },
    CommandSpec {
        name: "qos-show",
        about: "Shows qos specs details.",
        args: &[ArgSpec::positional("qos-specs", "ID of QoS specifications to show.")],
        min_version: None,
        handler: handler!(do_qos_show),
    },
    CommandSpec {
        name: "qos-create",
        about: "Creates a qos specs.",
        args: &[
            ArgSpec::positional("name", "Name of new QoS specifications."),
            ArgSpec::positionals("metadata", "QoS specifications."),
        ],
        min_version: None,
        handler: handler!(do_qos_create),
    },
    CommandSpec {
        name: "qos-delete",
        about: "Deletes a specified qos specs.",
        args: &[
            ArgSpec::flag("force", "Enables deletion of in-use QoS specifications."),
            ArgSpec::positional("qos-specs", "ID of QoS specifications to delete."),
        ],
        min_version: None,
        handler: handler!(do_qos_delete),
    },
    CommandSpec {
        name: "qos-key",
        about: "Sets or unsets specifications for a qos spec.",
        args: &[
            ArgSpec::positional("qos-specs", "ID of QoS specifications."),
            ArgSpec::positional("action", "The action.").choices(KEY_ACTIONS),
            ArgSpec::positionals("metadata", "Metadata key and value pair to set or unset."),
        ],
        min_version: None,
        handler: handler!(do_qos_key),
    },
    CommandSpec {
        name: "qos-associate",
        about: "Associates qos specs with specified volume type.",
        args: &[
            ArgSpec::positional("qos-specs", "ID of QoS specifications."),
            ArgSpec::positional("vol-type-id", "ID of volume type with which to associate QoS specifications."),
        ],
        min_version: None,
        handler: handler!(do_qos_associate),
    },
    CommandSpec {
        name: "qos-disassociate",
        about: "Disassociates qos specs from specified volume type.",
        args: &[
            ArgSpec::positional("qos-specs", "ID of QoS specifications."),
            ArgSpec::positional("vol-type-id", "ID of volume type with which to associate QoS specifications."),
        ],
        min_version: None,
        handler: handler!(do_qos_disassociate),
    },
    CommandSpec {
        name: "qos-disassociate-all",
        about: "Disassociates qos specs from all its associations.",
        args: &[ArgSpec::positional("qos-specs", "ID of QoS specifications on which to operate.")],
        min_version: None,
        handler: handler!(do_qos_disassociate_all),
    },
    CommandSpec {
        name: "qos-get-association",
        about: "Lists all associations for specified qos specs.",
        args: &[ArgSpec::positional("qos-specs", "ID of QoS specifications.")],
        min_version: None,
        handler: handler!(do_qos_get_association),
    },
];

fn extra_specs(item: &Resource) -> String {
    format_value(item.get("extra_specs"))
}

fn qos_specs(item: &Resource) -> String {
    format_value(item.get("specs"))
}

fn print_types(out: &mut dyn Write, types: &mut [Resource]) -> Result<()> {
    for item in types.iter_mut() {
        item.translate_keys(TYPE_KEYS);
    }
    print_list(out, types, &["ID", "Name", "Description", "Is_Public"], &[], Some(0))
}

async fn do_type_list(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let is_public = if flag(args, "all") { None } else { Some(true) };
    let mut types = client.volume_types().list(is_public).await?;
    print_types(out, &mut types)
}

async fn do_type_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let mut volume_type = find(&client.volume_types(), required(args, "volume-type")?).await?;
    volume_type.translate_keys(TYPE_KEYS);
    let _ = volume_type.remove("os-volume-type-access:is_public");
    print_resource(out, &volume_type)
}

async fn do_type_create(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let is_public = parse_bool(args, "is-public")?.unwrap_or(true);
    let volume_type = client
        .volume_types()
        .create(required(args, "name")?, value(args, "description"), is_public)
        .await?;
    print_types(out, &mut [volume_type])
}

async fn do_type_update(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let name = value(args, "name");
    let description = value(args, "description");
    let is_public = parse_bool(args, "is-public")?;
    if name.is_none() && description.is_none() && is_public.is_none() {
        return Err(Error::new_command_error(
            "Specify a new type name, description, is_public or a combination thereof.",
        ));
    }
    let updated = client
        .volume_types()
        .update(required(args, "id")?, name, description, is_public)
        .await?;
    match updated {
        Some(volume_type) => print_types(out, &mut [volume_type]),
        None => Ok(()),
    }
}

async fn do_type_delete(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let items = values(args, "volume-type");
    let mut failures = Vec::new();
    for item in &items {
        let result = match find(&client.volume_types(), item).await {
            Ok(volume_type) => {
                client
                    .volume_types()
                    .delete(&resource_id(&volume_type)?)
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => writeln!(out, "Request to delete volume type {} has been accepted.", item)?,
            Err(e) => failures.push((item.to_string(), e)),
        }
    }
    summarize_failures(out, items.len(), failures, "delete volume type")
}

async fn do_type_default(client: &Client, _args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let volume_type = client.volume_types().default().await?;
    print_types(out, &mut [volume_type])
}

async fn do_type_key(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let volume_type = find(&client.volume_types(), required(args, "vtype")?).await?;
    let id = resource_id(&volume_type)?;
    let items = values(args, "metadata");
    if required(args, "action")? == "set" {
        let specs = client
            .volume_types()
            .set_keys(&id, parse_key_values(items))
            .await?;
        print_dict(out, &specs)
    } else {
        let keys: Vec<String> = parse_key_values(items).keys().cloned().collect();
        client.volume_types().unset_keys(&id, &keys).await
    }
}

async fn do_extra_specs_list(
    client: &Client,
    _args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let types = client.volume_types().list(None).await?;
    let formatters: &[(&str, Formatter)] = &[("extra_specs", extra_specs)];
    print_list(out, &types, &["ID", "Name", "extra_specs"], formatters, Some(0))
}

async fn do_default_type_list(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let default_types = match value(args, "project-id") {
        Some(project_id) => vec![client.default_types().get(project_id).await?],
        None => client.default_types().list().await?,
    };
    print_list(
        out,
        &default_types,
        &["Volume Type ID", "Project ID"],
        &[],
        Some(0),
    )
}

async fn do_default_type_set(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let default_type = client
        .default_types()
        .set(required(args, "project")?, required(args, "volume-type")?)
        .await?;
    print_list(
        out,
        &[default_type],
        &["Volume Type ID", "Project ID"],
        &[],
        Some(0),
    )
}

async fn do_default_type_unset(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    for project_id in values(args, "project-id") {
        client.default_types().unset(project_id).await?;
        writeln!(
            out,
            "Default volume type for project {} has been unset successfully.",
            project_id
        )?;
    }
    Ok(())
}

async fn do_qos_list(client: &Client, _args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let specs = client.qos_specs().list().await?;
    let formatters: &[(&str, Formatter)] = &[("specs", qos_specs)];
    print_list(out, &specs, &["ID", "Name", "Consumer", "specs"], formatters, Some(0))
}

async fn do_qos_show(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let specs = find(&client.qos_specs(), required(args, "qos-specs")?).await?;
    print_resource(out, &specs)
}

async fn do_qos_create(client: &Client, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let specs = parse_key_values(values(args, "metadata"));
    let qos = client
        .qos_specs()
        .create(required(args, "name")?, specs)
        .await?;
    print_resource(out, &qos)
}

async fn do_qos_delete(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    let specs = find(&client.qos_specs(), required(args, "qos-specs")?).await?;
    client
        .qos_specs()
        .delete(&resource_id(&specs)?, flag(args, "force"))
        .await
}

async fn do_qos_key(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    let id = required(args, "qos-specs")?;
    let items = values(args, "metadata");
    if required(args, "action")? == "set" {
        client
            .qos_specs()
            .set_keys(id, parse_key_values(items))
            .await
    } else {
        let keys: Vec<String> = parse_key_values(items).keys().cloned().collect();
        client.qos_specs().unset_keys(id, &keys).await
    }
}

async fn do_qos_associate(client: &Client, args: &ArgMatches, _out: &mut dyn Write) -> Result<()> {
    client
        .qos_specs()
        .associate(required(args, "qos-specs")?, required(args, "vol-type-id")?)
        .await
}

async fn do_qos_disassociate(
    client: &Client,
    args: &ArgMatches,
    _out: &mut dyn Write,
) -> Result<()> {
    client
        .qos_specs()
        .disassociate(required(args, "qos-specs")?, required(args, "vol-type-id")?)
        .await
}

async fn do_qos_disassociate_all(
    client: &Client,
    args: &ArgMatches,
    _out: &mut dyn Write,
) -> Result<()> {
    client
        .qos_specs()
        .disassociate_all(required(args, "qos-specs")?)
        .await
}

async fn do_qos_get_association(
    client: &Client,
    args: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let associations = client
        .qos_specs()
        .get_associations(required(args, "qos-specs")?)
        .await?;
    print_list(
        out,
        &associations,
        &["Association_Type", "Name", "ID"],
        &[],
        Some(0),
    )
}

#[cfg(test)]
pub mod test {
    use serde_json::json;

    use super::{extra_specs, qos_specs};
    use crate::common::Resource;

    #[test]
    fn test_spec_formatters() {
        let item = Resource::from_value(json!({
            "extra_specs": {"a": "b"},
            "specs": null
        }))
        .unwrap();
        assert_eq!(extra_specs(&item), "{\"a\":\"b\"}");
        assert_eq!(qos_specs(&item), "-");
    }
}
