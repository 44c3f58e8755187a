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

//! Differences between the major versions of the Block Storage API.

use std::fmt;

use reqwest::Url;

use super::ApiVersion;
use crate::{Error, ErrorKind, Result};

/// Lowest supported microversion of the v3 API.
pub const MIN_VERSION: ApiVersion = ApiVersion(3, 0);

/// Highest supported microversion of the v3 API.
pub const MAX_VERSION: ApiVersion = ApiVersion(3, 62);

/// Header carrying the requested microversion.
pub const API_VERSION_HEADER: &str = "OpenStack-API-Version";

/// Major version of the Block Storage API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeApi {
    /// Legacy v1 API.
    V1,
    /// v2 API.
    V2,
    /// v3 API with microversions.
    V3,
}

fn unsupported<S: Into<String>>(message: S) -> Error {
    Error::new(ErrorKind::UnsupportedVersion, message)
}

impl VolumeApi {
    /// All major versions, oldest first.
    pub const ALL: [VolumeApi; 3] = [VolumeApi::V1, VolumeApi::V2, VolumeApi::V3];

    /// Major version by its number.
    pub fn from_major(major: u16) -> Result<VolumeApi> {
        match major {
            1 => Ok(VolumeApi::V1),
            2 => Ok(VolumeApi::V2),
            3 => Ok(VolumeApi::V3),
            other => Err(unsupported(format!(
                "Invalid client version '{}'. Major part must be one of: 1, 2, 3",
                other
            ))),
        }
    }

    /// Validate a requested version and return its major part.
    pub fn from_version(version: ApiVersion) -> Result<VolumeApi> {
        let api = VolumeApi::from_major(version.0)?;
        match api {
            VolumeApi::V3 if !version.matches(MIN_VERSION, MAX_VERSION) => Err(unsupported(format!(
                "The specified version isn't supported by client. The valid version \
                 range is '{}' to '{}'",
                MIN_VERSION, MAX_VERSION
            ))),
            VolumeApi::V1 | VolumeApi::V2 if version.1 != 0 => Err(unsupported(format!(
                "Microversions are not supported by the v{} API",
                version.0
            ))),
            _ => Ok(api),
        }
    }

    /// Detect the major version from a `vN` segment of an endpoint URL.
    pub fn from_url(url: &str) -> Result<VolumeApi> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("Invalid URL {}: {}", url, e)))?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();
        VolumeApi::ALL
            .iter()
            .copied()
            .find(|api| segments.contains(&api.path_segment()))
            .ok_or_else(|| {
                unsupported(format!(
                    "Invalid client version in {}. must be one of: v1, v2, v3",
                    url
                ))
            })
    }

    /// Major version number.
    pub fn major(self) -> u16 {
        match self {
            VolumeApi::V1 => 1,
            VolumeApi::V2 => 2,
            VolumeApi::V3 => 3,
        }
    }

    /// Version segment in endpoint URLs.
    pub fn path_segment(self) -> &'static str {
        match self {
            VolumeApi::V1 => "v1",
            VolumeApi::V2 => "v2",
            VolumeApi::V3 => "v3",
        }
    }

    /// Service type in the catalog.
    pub fn service_type(self) -> &'static str {
        match self {
            VolumeApi::V1 => "volume",
            VolumeApi::V2 => "volumev2",
            VolumeApi::V3 => "volumev3",
        }
    }

    /// Field carrying resource names.
    pub fn name_key(self) -> &'static str {
        match self {
            VolumeApi::V1 => "display_name",
            _ => "name",
        }
    }

    /// Field carrying resource descriptions.
    pub fn description_key(self) -> &'static str {
        match self {
            VolumeApi::V1 => "display_description",
            _ => "description",
        }
    }

    /// Whether volume deletion accepts `cascade`.
    pub fn supports_cascade(self) -> bool {
        self != VolumeApi::V1
    }

    /// Default (and for v1/v2 the only) version.
    pub fn default_version(self) -> ApiVersion {
        ApiVersion(self.major(), 0)
    }

    /// Microversion header to send with every request.
    pub fn version_header(self, version: ApiVersion) -> Option<(String, String)> {
        match self {
            VolumeApi::V3 => Some((
                String::from(API_VERSION_HEADER),
                format!("volume {}", version),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for VolumeApi {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[cfg(test)]
pub mod test {
    use super::super::ApiVersion;
    use super::VolumeApi;
    use crate::ErrorKind;

    #[test]
    fn test_from_url() {
        assert_eq!(VolumeApi::from_url("http://fakeurl/v1/tenants").unwrap(), VolumeApi::V1);
        assert_eq!(VolumeApi::from_url("http://fakeurl/v2/tenants").unwrap(), VolumeApi::V2);
        assert_eq!(
            VolumeApi::from_url("http://fakeurl/volume/v3/p1").unwrap(),
            VolumeApi::V3
        );
        let err = VolumeApi::from_url("http://fakeurl/v9/tenants").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    }

    #[test]
    fn test_from_version() {
        assert_eq!(VolumeApi::from_version(ApiVersion(3, 27)).unwrap(), VolumeApi::V3);
        assert_eq!(VolumeApi::from_version(ApiVersion(2, 0)).unwrap(), VolumeApi::V2);
        assert!(VolumeApi::from_version(ApiVersion(3, 999)).is_err());
        assert!(VolumeApi::from_version(ApiVersion(2, 1)).is_err());
        assert!(VolumeApi::from_version(ApiVersion(4, 0)).is_err());
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(VolumeApi::V1.name_key(), "display_name");
        assert_eq!(VolumeApi::V2.name_key(), "name");
        assert_eq!(VolumeApi::V1.description_key(), "display_description");
        assert_eq!(VolumeApi::V3.service_type(), "volumev3");
        assert_eq!(VolumeApi::V1.service_type(), "volume");
        assert!(!VolumeApi::V1.supports_cascade());
        assert_eq!(VolumeApi::V2.version_header(ApiVersion(2, 0)), None);
        assert_eq!(
            VolumeApi::V3.version_header(ApiVersion(3, 13)),
            Some((String::from("OpenStack-API-Version"), String::from("volume 3.13")))
        );
    }
}
