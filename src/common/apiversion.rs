// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
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

//! ApiVersion implementation.

use std::fmt;
use std::str::FromStr;

use serde::de::{Error as DeserError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, ErrorKind, Result};

/// API version (major, minor).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ApiVersion(pub u16, pub u16);

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

fn parse_component(component: &str, source: &str) -> Result<u16> {
    component.parse().map_err(|_| {
        Error::new(
            ErrorKind::UnsupportedVersion,
            format!("The format of the version {} is invalid, expected X or X.Y", source),
        )
    })
}

impl ApiVersion {
    /// Whether the version lies within `[min, max]`.
    pub fn matches(&self, min: ApiVersion, max: ApiVersion) -> bool {
        *self >= min && *self <= max
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    /// Parse `X.Y`, a bare `X` means `X.0`.
    fn from_str(s: &str) -> Result<ApiVersion> {
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);
        let parts: Vec<&str> = s.split('.').collect();

        match parts.len() {
            1 => Ok(ApiVersion(parse_component(parts[0], s)?, 0)),
            2 => Ok(ApiVersion(
                parse_component(parts[0], s)?,
                parse_component(parts[1], s)?,
            )),
            _ => Err(Error::new(
                ErrorKind::UnsupportedVersion,
                format!("The format of the version {} is invalid, expected X or X.Y", s),
            )),
        }
    }
}

impl Serialize for ApiVersion {
    fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct ApiVersionVisitor;

impl<'de> Visitor<'de> for ApiVersionVisitor {
    type Value = ApiVersion;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string in format X.Y")
    }

    fn visit_str<E>(self, value: &str) -> ::std::result::Result<ApiVersion, E>
    where
        E: DeserError,
    {
        ApiVersion::from_str(value).map_err(DeserError::custom)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<ApiVersion, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ApiVersionVisitor)
    }
}

#[cfg(test)]
pub mod test {
    use std::str::FromStr;

    use super::ApiVersion;
    use crate::ErrorKind;

    #[test]
    fn test_apiversion_format() {
        let ver = ApiVersion(3, 27);
        assert_eq!(&ver.to_string(), "3.27");
        assert_eq!(ApiVersion::from_str("3.27").unwrap(), ver);
    }

    #[test]
    fn test_apiversion_major_only() {
        assert_eq!(ApiVersion::from_str("3").unwrap(), ApiVersion(3, 0));
        assert_eq!(ApiVersion::from_str("v2").unwrap(), ApiVersion(2, 0));
    }

    #[test]
    fn test_apiversion_invalid() {
        for value in &["", "3.x", "3.1.1", "latest"] {
            let err = ApiVersion::from_str(value).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
        }
    }

    #[test]
    fn test_apiversion_ordering() {
        assert!(ApiVersion(3, 9) < ApiVersion(3, 10));
        assert!(ApiVersion(3, 13).matches(ApiVersion(3, 0), ApiVersion(3, 62)));
        assert!(!ApiVersion(3, 63).matches(ApiVersion(3, 0), ApiVersion(3, 62)));
    }

    #[test]
    fn test_apiversion_serde() {
        let ver = ApiVersion(3, 27);
        let ser = serde_json::to_string(&ver).unwrap();
        assert_eq!(&ser, "\"3.27\"");
        assert_eq!(serde_json::from_str::<ApiVersion>(&ser).unwrap(), ver);
    }
}
