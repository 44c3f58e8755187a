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

//! Declarative command descriptors and accessors for parsed arguments.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use futures::future::LocalBoxFuture;

use crate::common::{ApiVersion, ListOptions};
use crate::utils;
use crate::{Client, Error, Result};

/// Function running a command.
pub type Handler =
    for<'a> fn(&'a Client, &'a ArgMatches, &'a mut dyn Write) -> LocalBoxFuture<'a, Result<()>>;

/// Wrap an `async fn (client, args, out) -> Result<()>` into a `Handler`.
macro_rules! handler {
    ($target:path) => {{
        fn wrapper<'a>(
            client: &'a $crate::Client,
            args: &'a ::clap::ArgMatches,
            out: &'a mut dyn ::std::io::Write,
        ) -> ::futures::future::LocalBoxFuture<'a, $crate::Result<()>> {
            Box::pin($target(client, args, out))
        }
        wrapper
    }};
}

/// How an argument is passed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Single positional value.
    Positional,
    /// One or more positional values.
    Positionals,
    /// `--name value`.
    Option,
    /// `--name value [value ...]`, may be repeated.
    Repeated,
    /// `--name` without a value.
    Flag,
}

/// Descriptor of a single command argument.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    /// Argument name, also the long flag for options.
    pub name: &'static str,
    /// Help text.
    pub help: &'static str,
    /// Kind of the argument.
    pub kind: ArgKind,
    /// Whether the argument must be provided.
    pub required: bool,
    /// Default value.
    pub default: Option<&'static str>,
    /// Accepted values, empty to accept anything.
    pub choices: &'static [&'static str],
}

impl ArgSpec {
    const fn with_kind(name: &'static str, help: &'static str, kind: ArgKind) -> ArgSpec {
        ArgSpec {
            name,
            help,
            kind,
            required: matches!(kind, ArgKind::Positional | ArgKind::Positionals),
            default: None,
            choices: &[],
        }
    }

    /// Required positional argument.
    pub const fn positional(name: &'static str, help: &'static str) -> ArgSpec {
        ArgSpec::with_kind(name, help, ArgKind::Positional)
    }

    /// One or more positional values.
    pub const fn positionals(name: &'static str, help: &'static str) -> ArgSpec {
        ArgSpec::with_kind(name, help, ArgKind::Positionals)
    }

    /// Optional `--name value`.
    pub const fn option(name: &'static str, help: &'static str) -> ArgSpec {
        ArgSpec::with_kind(name, help, ArgKind::Option)
    }

    /// Optional `--name value [value ...]`.
    pub const fn repeated(name: &'static str, help: &'static str) -> ArgSpec {
        ArgSpec::with_kind(name, help, ArgKind::Repeated)
    }

    /// Boolean switch.
    pub const fn flag(name: &'static str, help: &'static str) -> ArgSpec {
        ArgSpec::with_kind(name, help, ArgKind::Flag)
    }

    /// Make the argument optional.
    pub const fn optional(mut self) -> ArgSpec {
        self.required = false;
        self
    }

    /// Make the argument mandatory.
    pub const fn required(mut self) -> ArgSpec {
        self.required = true;
        self
    }

    /// Set a default value.
    pub const fn default_value(mut self, value: &'static str) -> ArgSpec {
        self.default = Some(value);
        self
    }

    /// Restrict accepted values.
    pub const fn choices(mut self, values: &'static [&'static str]) -> ArgSpec {
        self.choices = values;
        self
    }

    /// Convert into a clap argument.
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name).help(self.help);
        arg = match self.kind {
            ArgKind::Positional => arg.required(self.required && self.default.is_none()),
            ArgKind::Positionals => arg
                .required(self.required)
                .num_args(1..)
                .action(ArgAction::Append),
            ArgKind::Option => arg.long(self.name).required(self.required),
            ArgKind::Repeated => arg
                .long(self.name)
                .required(self.required)
                .num_args(1..)
                .action(ArgAction::Append),
            ArgKind::Flag => arg.long(self.name).action(ArgAction::SetTrue),
        };
        if let Some(default) = self.default {
            arg = arg.default_value(default);
        }
        if !self.choices.is_empty() {
            arg = arg.value_parser(PossibleValuesParser::new(self.choices.iter().copied()));
        }
        arg
    }
}

/// Descriptor of a sub-command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Name of the sub-command.
    pub name: &'static str,
    /// Help text.
    pub about: &'static str,
    /// Arguments of the sub-command.
    pub args: &'static [ArgSpec],
    /// Minimum API version supporting the command.
    pub min_version: Option<ApiVersion>,
    /// Function running the command.
    pub handler: Handler,
}

impl CommandSpec {
    /// Convert into a clap sub-command.
    pub fn to_command(&self) -> Command {
        Command::new(self.name)
            .about(self.about)
            .args(self.args.iter().map(ArgSpec::to_arg))
    }

    /// Fail with `CommandError` if the command is not available in `version`.
    pub fn check_version(&self, version: ApiVersion) -> Result<()> {
        match self.min_version {
            Some(min) if version < min => Err(Error::new_command_error(format!(
                "The '{}' command requires API version {} or later, the requested version is {}",
                self.name, min, version
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("min_version", &self.min_version)
            .finish()
    }
}

/// Value of an argument, if present.
pub(crate) fn value<'m>(args: &'m ArgMatches, name: &str) -> Option<&'m str> {
    args.try_get_one::<String>(name)
        .ok()
        .flatten()
        .map(String::as_str)
}

/// Value of an argument that clap guarantees to be present.
pub(crate) fn required<'m>(args: &'m ArgMatches, name: &str) -> Result<&'m str> {
    value(args, name).ok_or_else(|| {
        Error::new_command_error(format!("The argument <{}> is required", name))
    })
}

/// All values of a multi-valued argument.
pub(crate) fn values<'m>(args: &'m ArgMatches, name: &str) -> Vec<&'m str> {
    args.try_get_many::<String>(name)
        .ok()
        .flatten()
        .map(|items| items.map(String::as_str).collect())
        .unwrap_or_default()
}

/// Whether a switch is set.
pub(crate) fn flag(args: &ArgMatches, name: &str) -> bool {
    args.try_get_one::<bool>(name)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

/// Parse an argument into a type.
pub(crate) fn parse<T>(args: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value(args, name)
        .map(|item| {
            item.parse().map_err(|e| {
                Error::new_command_error(format!("Invalid value '{}' for {}: {}", item, name, e))
            })
        })
        .transpose()
}

/// Parse a boolean argument.
pub(crate) fn parse_bool(args: &ArgMatches, name: &str) -> Result<Option<bool>> {
    value(args, name)
        .map(|item| utils::parse_bool(item).map_err(|e| Error::new_command_error(e.to_string())))
        .transpose()
}

/// List options from `--marker`, `--limit`, `--sort` and `--all-tenants`.
pub(crate) fn list_options(args: &ArgMatches) -> Result<ListOptions> {
    let mut options = ListOptions::new();
    if let Some(marker) = value(args, "marker") {
        options = options.with_marker(marker);
    }
    if let Some(limit) = parse::<usize>(args, "limit")? {
        options = options.with_limit(limit);
    }
    if let Some(sort) = value(args, "sort") {
        options = options.with_sort(sort);
    }
    if flag(args, "all-tenants") {
        options = options.with_filter("all_tenants", 1);
    }
    Ok(options)
}

#[cfg(test)]
pub mod test {
    use clap::Command;

    use super::{flag, list_options, parse, value, values, ArgSpec, CommandSpec};
    use crate::common::ApiVersion;
    use crate::ErrorKind;

    async fn noop(
        _client: &crate::Client,
        _args: &clap::ArgMatches,
        _out: &mut dyn std::io::Write,
    ) -> crate::Result<()> {
        Ok(())
    }

    static ARGS: &[ArgSpec] = &[
        ArgSpec::positionals("volumes", "Volumes."),
        ArgSpec::option("state", "State.").default_value("available"),
        ArgSpec::repeated("metadata", "Metadata."),
        ArgSpec::flag("force", "Force."),
        ArgSpec::option("policy", "Policy.").choices(&["never", "on-demand"]),
        ArgSpec::option("limit", "Limit."),
    ];

    static SPEC: CommandSpec = CommandSpec {
        name: "test-command",
        about: "Test command.",
        args: ARGS,
        min_version: Some(ApiVersion(3, 13)),
        handler: handler!(noop),
    };

    fn parse_args(args: &[&str]) -> Result<clap::ArgMatches, clap::Error> {
        Command::new("cinder")
            .subcommand(SPEC.to_command())
            .try_get_matches_from(args)
    }

    #[test]
    fn test_parse_descriptor() {
        let matches = parse_args(&[
            "cinder",
            "test-command",
            "v1",
            "v2",
            "--metadata",
            "a=b",
            "c=d",
            "--force",
            "--limit",
            "5",
        ])
        .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "test-command");
        assert_eq!(values(sub, "volumes"), vec!["v1", "v2"]);
        assert_eq!(values(sub, "metadata"), vec!["a=b", "c=d"]);
        assert_eq!(value(sub, "state"), Some("available"));
        assert!(flag(sub, "force"));
        assert_eq!(parse::<usize>(sub, "limit").unwrap(), Some(5));
        assert_eq!(list_options(sub).unwrap().limit, Some(5));
        // Unknown arguments are simply absent.
        assert_eq!(value(sub, "nope"), None);
        assert!(!flag(sub, "nope"));
    }

    #[test]
    fn test_missing_positional() {
        let err = parse_args(&["cinder", "test-command"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_invalid_choice() {
        let err = parse_args(&["cinder", "test-command", "v1", "--policy", "always"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_invalid_number() {
        let matches = parse_args(&["cinder", "test-command", "v1", "--limit", "x"]).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let err = parse::<usize>(sub, "limit").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommandError);
    }

    #[test]
    fn test_check_version() {
        SPEC.check_version(ApiVersion(3, 13)).unwrap();
        let err = SPEC.check_version(ApiVersion(3, 12)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommandError);
        assert!(err.to_string().contains("3.13"));
    }
}
