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

//! The `cinder` command line interface.
//!
//! Every sub-command is a row of a static [CommandSpec](struct.CommandSpec.html)
//! table. [build_command](fn.build_command.html) turns the table into a
//! `clap::Command` and [main_with](fn.main_with.html) runs a command line
//! against an injectable environment and output streams.
//!
//! ```rust,no_run
//! # async fn run() {
//! let args = vec!["cinder", "--os-volume-api-version", "3.27", "list"];
//! let code = cinderclient::shell::main_with(
//!     args,
//!     &|name| std::env::var(name).ok(),
//!     &mut std::io::stdout(),
//!     &mut std::io::stderr(),
//! )
//! .await;
//! # }
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::debug;
use reqwest::Url;

use crate::auth::{AuthConfig, AuthPlugins};
use crate::common::{self, ApiVersion, Findable, Resource, VolumeApi};
use crate::http::{HttpClient, TransportOptions};
use crate::utils;
use crate::{Client, Error, ErrorKind, Result, Session};

#[macro_use]
mod descriptor;
mod backups;
mod groups;
mod output;
mod quotas;
mod services;
mod transfers;
mod types;
mod volumes;

pub use self::descriptor::{ArgKind, ArgSpec, CommandSpec, Handler};

/// Lookup of environment variables.
pub type EnvLookup<'e> = &'e dyn Fn(&str) -> Option<String>;

/// API version used when neither a flag nor the environment sets one.
pub const DEFAULT_API_VERSION: &str = "3.0";

static TABLES: &[&[CommandSpec]] = &[
    volumes::COMMANDS,
    backups::COMMANDS,
    types::COMMANDS,
    quotas::COMMANDS,
    services::COMMANDS,
    transfers::COMMANDS,
    groups::COMMANDS,
];

/// All known sub-commands.
pub fn commands() -> impl Iterator<Item = &'static CommandSpec> {
    TABLES.iter().flat_map(|table| table.iter())
}

/// Find a sub-command by its name.
pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    commands().find(|spec| spec.name == name)
}

fn global_option(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

/// Build the `cinder` command with all sub-commands.
pub fn build_command() -> Command {
    Command::new("cinder")
        .about("Command-line interface to the OpenStack Block Storage API.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(global_option("os-username", "OpenStack user name. Default=env[OS_USERNAME]."))
        .arg(global_option("os-user-id", "OpenStack user ID. Default=env[OS_USER_ID]."))
        .arg(global_option("os-password", "Password for the user. Default=env[OS_PASSWORD]."))
        .arg(
            global_option("os-project-name", "Project name. Default=env[OS_PROJECT_NAME].")
                .alias("os-tenant-name"),
        )
        .arg(
            global_option("os-project-id", "Project ID. Default=env[OS_PROJECT_ID].")
                .alias("os-tenant-id"),
        )
        .arg(global_option("os-auth-url", "Identity service URL. Default=env[OS_AUTH_URL]."))
        .arg(global_option("os-region-name", "Region name. Default=env[OS_REGION_NAME]."))
        .arg(global_option(
            "os-endpoint-type",
            "Endpoint type: publicURL, internalURL or adminURL. Default=env[OS_ENDPOINT_TYPE].",
        ))
        .arg(global_option(
            "os-volume-api-version",
            "Block Storage API version. Default=env[OS_VOLUME_API_VERSION].",
        ))
        .arg(
            global_option(
                "bypass-url",
                "Use this API endpoint instead of the service catalog. \
                 Default=env[CINDERCLIENT_BYPASS_URL].",
            )
            .alias("os-endpoint"),
        )
        .arg(global_option(
            "os-auth-system",
            "Authentication system to use. Default=env[OS_AUTH_SYSTEM].",
        ))
        .arg(
            global_option("os-auth-token", "Pre-acquired token. Default=env[OS_AUTH_TOKEN].")
                .alias("os-token"),
        )
        .arg(global_option("os-cacert", "CA certificate bundle file. Default=env[OS_CACERT]."))
        .arg(global_option(
            "os-cloud",
            "Name of a cloud from clouds.yaml. Default=env[OS_CLOUD].",
        ))
        .arg(global_option("service-type", "Service type. Default=volumev3."))
        .arg(global_option(
            "service-name",
            "Service name. Default=env[CINDER_SERVICE_NAME].",
        ))
        .arg(global_option("retries", "Number of retries.").default_value("0"))
        .arg(global_option("timeout", "Request timeout in seconds."))
        .arg(
            Arg::new("insecure")
                .long("insecure")
                .help("Do not verify TLS certificates. Default=env[CINDERCLIENT_INSECURE].")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Print debugging output. Default=env[CINDERCLIENT_DEBUG].")
                .action(ArgAction::SetTrue),
        )
        .subcommands(commands().map(CommandSpec::to_command))
}

fn env_flag(env: EnvLookup<'_>, name: &str) -> bool {
    env(name)
        .map(|value| utils::parse_bool(&value).unwrap_or(false))
        .unwrap_or(false)
}

/// Whether debugging output was requested by a flag or the environment.
pub fn debug_requested<I, S>(args: I, env: EnvLookup<'_>) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().any(|arg| arg.as_ref() == "--debug") || env_flag(env, "CINDERCLIENT_DEBUG")
}

fn global_value(matches: &ArgMatches, name: &str, env: EnvLookup<'_>, var: &str) -> Option<String> {
    descriptor::value(matches, name)
        .map(String::from)
        .or_else(|| env(var).filter(|value| !value.is_empty()))
}

/// Requested API version from `--os-volume-api-version` or the environment.
fn requested_version(matches: &ArgMatches, env: EnvLookup<'_>) -> Result<ApiVersion> {
    let version = global_value(matches, "os-volume-api-version", env, "OS_VOLUME_API_VERSION")
        .unwrap_or_else(|| String::from(DEFAULT_API_VERSION));
    let version: ApiVersion = version
        .parse()
        .map_err(|e: Error| Error::new_command_error(e.to_string()))?;
    let _ = VolumeApi::from_version(version)?;
    Ok(version)
}

/// Merge clouds.yaml or environment configuration with explicit flags.
fn auth_config(matches: &ArgMatches, env: EnvLookup<'_>) -> Result<AuthConfig> {
    let mut config = match global_value(matches, "os-cloud", env, "OS_CLOUD") {
        Some(cloud) => {
            debug!("Using cloud {} from clouds.yaml", cloud);
            AuthConfig::from_config(cloud)?
        }
        None => AuthConfig::from_env_with(|name| env(name))?,
    };

    let overrides: [(&str, &mut Option<String>); 12] = [
        ("os-auth-system", &mut config.auth_system),
        ("os-auth-url", &mut config.auth_url),
        ("os-username", &mut config.username),
        ("os-user-id", &mut config.user_id),
        ("os-password", &mut config.password),
        ("os-project-name", &mut config.project_name),
        ("os-project-id", &mut config.project_id),
        ("os-auth-token", &mut config.token),
        ("bypass-url", &mut config.bypass_url),
        ("os-region-name", &mut config.region_name),
        ("service-type", &mut config.service_type),
        ("service-name", &mut config.service_name),
    ];
    for (name, target) in overrides {
        if let Some(value) = descriptor::value(matches, name) {
            *target = Some(String::from(value));
        }
    }
    if let Some(endpoint_type) = descriptor::value(matches, "os-endpoint-type") {
        config.endpoint_type = endpoint_type.parse()?;
    }
    Ok(config)
}

fn transport_options(matches: &ArgMatches, env: EnvLookup<'_>) -> Result<TransportOptions> {
    let timeout = descriptor::parse::<u64>(matches, "timeout")?.map(Duration::from_secs);
    Ok(TransportOptions {
        insecure: descriptor::flag(matches, "insecure") || env_flag(env, "CINDERCLIENT_INSECURE"),
        cacert: global_value(matches, "os-cacert", env, "OS_CACERT").map(PathBuf::from),
        timeout,
        http_log_debug: descriptor::flag(matches, "debug") || env_flag(env, "CINDERCLIENT_DEBUG"),
        user_agent: None,
    })
}

/// Create a client from global options.
pub fn client_from_matches(
    matches: &ArgMatches,
    env: EnvLookup<'_>,
    version: ApiVersion,
) -> Result<Client> {
    let api = VolumeApi::from_version(version)?;
    let config = auth_config(matches, env)?;
    let auth = config
        .create(&AuthPlugins::default(), api.service_type())
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidConfig => Error::new_command_error(e.to_string()),
            _ => e,
        })?;
    let http = HttpClient::new(transport_options(matches, env)?)?;
    let retries = descriptor::parse::<u32>(matches, "retries")?.unwrap_or(0);
    let mut session = Session::from_boxed(auth, http).with_retries(retries);
    if let Some(url) = config.session_bypass_url() {
        let url = Url::parse(url).map_err(|e| {
            Error::new_command_error(format!("Invalid bypass URL {}: {}", url, e))
        })?;
        session = session.with_bypass_url(url);
    }
    Client::new(session, version)
}

/// Resolve a name or ID, reporting failures as `CommandError`.
pub(crate) async fn find<F: Findable + ?Sized>(manager: &F, name_or_id: &str) -> Result<Resource> {
    common::find(manager, name_or_id).await.map_err(|e| match e.kind() {
        ErrorKind::ResourceNotFound | ErrorKind::TooManyItems => {
            Error::new_command_error(e.to_string())
        }
        _ => e,
    })
}

/// ID of a resource, failing if the server did not return one.
pub(crate) fn resource_id(resource: &Resource) -> Result<String> {
    resource.id().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidResponse,
            format!("Resource without an ID: {:?}", resource.info()),
        )
    })
}

/// Print failures of a command applied to several items.
///
/// Fails with `CommandError` only if the command failed for every item.
pub(crate) fn summarize_failures(
    out: &mut dyn Write,
    total: usize,
    failures: Vec<(String, Error)>,
    what: &str,
) -> Result<()> {
    for (item, err) in &failures {
        writeln!(out, "Request to {} {} failed: {}", what, item, err)?;
    }
    if total > 0 && failures.len() == total {
        Err(Error::new_command_error(format!(
            "Unable to {} any of the specified items.",
            what
        )))
    } else {
        Ok(())
    }
}

async fn run(matches: &ArgMatches, env: EnvLookup<'_>, out: &mut dyn Write) -> Result<()> {
    let version = requested_version(matches, env)?;
    let (name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| Error::new_command_error("A sub-command is required"))?;
    let spec = find_command(name)
        .ok_or_else(|| Error::new_command_error(format!("Unknown command {}", name)))?;
    spec.check_version(version)?;

    let client = client_from_matches(matches, env, version)?;
    debug!("Running {} with API version {}", name, version);
    (spec.handler)(&client, sub_matches, out).await
}

/// Run a command line, returning the process exit code.
///
/// Argument errors exit with 2 before any request is made, other errors
/// print `ERROR: <message>` to `err` and exit with 1.
pub async fn main_with<I, T>(
    args: I,
    env: EnvLookup<'_>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match build_command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => {
            use clap::error::ErrorKind as ClapErrorKind;
            return match e.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                    let _ = write!(out, "{}", e.render());
                    0
                }
                _ => {
                    let _ = write!(err, "{}", e.render());
                    2
                }
            };
        }
    };

    match run(&matches, env, out).await {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(err, "ERROR: {}", e);
            1
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::{build_command, commands, debug_requested, find_command, requested_version};
    use crate::common::ApiVersion;
    use crate::ErrorKind;

    #[test]
    fn test_command_names_unique() {
        let mut seen = HashSet::new();
        for spec in commands() {
            assert!(seen.insert(spec.name), "duplicate command {}", spec.name);
        }
        assert!(seen.len() >= 90);
    }

    #[test]
    fn test_build_command() {
        build_command().debug_assert();
    }

    #[test]
    fn test_find_command() {
        assert_eq!(find_command("list").unwrap().name, "list");
        assert_eq!(
            find_command("group-list").unwrap().min_version,
            Some(ApiVersion(3, 13))
        );
        assert!(find_command("nope").is_none());
    }

    #[test]
    fn test_requested_version() {
        let matches = build_command()
            .try_get_matches_from(["cinder", "--os-volume-api-version", "3.27", "list"])
            .unwrap();
        assert_eq!(
            requested_version(&matches, &|_| None).unwrap(),
            ApiVersion(3, 27)
        );

        let matches = build_command()
            .try_get_matches_from(["cinder", "list"])
            .unwrap();
        assert_eq!(
            requested_version(&matches, &|name| {
                (name == "OS_VOLUME_API_VERSION").then(|| String::from("2"))
            })
            .unwrap(),
            ApiVersion(2, 0)
        );
        assert_eq!(
            requested_version(&matches, &|_| None).unwrap(),
            ApiVersion(3, 0)
        );

        let matches = build_command()
            .try_get_matches_from(["cinder", "--os-volume-api-version", "3.99", "list"])
            .unwrap();
        let err = requested_version(&matches, &|_| None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    }

    #[test]
    fn test_debug_requested() {
        assert!(debug_requested(["cinder", "--debug", "list"], &|_| None));
        assert!(!debug_requested(["cinder", "list"], &|_| None));
        assert!(debug_requested(["cinder", "list"], &|name| {
            (name == "CINDERCLIENT_DEBUG").then(|| String::from("1"))
        }));
    }
}
